use chrono::{DateTime, Utc};
use serde::Deserialize;
use snippetbox_core::validation::{EMAIL_RX, Validator, matches, min_chars, not_blank};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub hashed_password: String,
    pub created: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserSignupForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(skip)]
    pub validator: Validator,
}

impl UserSignupForm {
    pub fn check(&mut self) {
        let v = &mut self.validator;
        v.check_field(not_blank(&self.name), "name", "This field cannot be blank.");
        v.check_field(not_blank(&self.email), "email", "This field cannot be blank.");
        v.check_field(
            matches(&self.email, &EMAIL_RX),
            "email",
            "This field must be a valid email address.",
        );
        v.check_field(not_blank(&self.password), "password", "This field cannot be blank.");
        v.check_field(
            min_chars(&self.password, 8),
            "password",
            "This field must be at least 8 characters long.",
        );
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserLoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(skip)]
    pub validator: Validator,
}

impl UserLoginForm {
    pub fn check(&mut self) {
        let v = &mut self.validator;
        v.check_field(not_blank(&self.email), "email", "This field cannot be blank.");
        v.check_field(
            matches(&self.email, &EMAIL_RX),
            "email",
            "This field must be a valid email address.",
        );
        v.check_field(not_blank(&self.password), "password", "This field cannot be blank.");
    }
}
