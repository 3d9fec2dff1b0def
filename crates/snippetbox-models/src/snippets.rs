use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, de::Error as _};
use snippetbox_core::validation::{Validator, max_chars, not_blank, permitted_value};
use sqlx::FromRow;

/// Lifetimes, in days, a snippet may be created with.
pub const PERMITTED_EXPIRY_DAYS: [i32; 3] = [1, 7, 365];

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Snippet {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub created: DateTime<Utc>,
    pub expires: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SnippetCreateForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default, deserialize_with = "blank_as_zero")]
    pub expires: i32,
    #[serde(skip)]
    pub validator: Validator,
}

/// Reads a submitted integer, treating a blank value like an absent one.
///
/// Leaves it to [`SnippetCreateForm::check`] to reject the zero.
fn blank_as_zero<'de, D>(deserializer: D) -> Result<i32, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(0);
    }
    raw.parse().map_err(D::Error::custom)
}

impl SnippetCreateForm {
    /// An empty form with the one-year lifetime preselected.
    pub fn new() -> Self {
        Self {
            expires: 365,
            ..Self::default()
        }
    }

    pub fn check(&mut self) {
        let v = &mut self.validator;
        v.check_field(not_blank(&self.title), "title", "This field cannot be blank.");
        v.check_field(
            max_chars(&self.title, 100),
            "title",
            "This field cannot be more than 100 characters long.",
        );
        v.check_field(not_blank(&self.content), "content", "This field cannot be blank.");
        v.check_field(
            permitted_value(self.expires, &PERMITTED_EXPIRY_DAYS),
            "expires",
            "This field must equal 1, 7 or 365.",
        );
    }
}
