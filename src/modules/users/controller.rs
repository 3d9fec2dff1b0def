use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use snippetbox_core::AppError;
use snippetbox_models::{UserLoginForm, UserSignupForm};
use tower_sessions::Session;
use tracing::{info, instrument};

use crate::form::PostForm;
use crate::session::{log_in, log_out, put_flash};
use crate::state::AppState;
use crate::store::StoreError;
use crate::templates::{PageContext, pages, render};

#[instrument(skip_all)]
pub async fn user_signup_form(page: PageContext) -> Result<Response, AppError> {
    let data = page.template_data().await?;
    Ok(render(
        StatusCode::OK,
        pages::signup(&data, &UserSignupForm::default()),
    ))
}

#[instrument(skip_all)]
pub async fn user_signup(
    State(state): State<AppState>,
    session: Session,
    page: PageContext,
    PostForm(mut form): PostForm<UserSignupForm>,
) -> Result<Response, AppError> {
    form.check();
    if form.validator.valid() {
        match state
            .users
            .insert(&form.name, &form.email, &form.password)
            .await
        {
            Ok(()) => {
                info!("User signed up");
                put_flash(&session, "Your signup was successful. Please log in.").await?;
                return Ok(Redirect::to("/user/login").into_response());
            }
            Err(StoreError::DuplicateEmail) => {
                form.validator
                    .add_field_error("email", "Email address is already in use");
            }
            Err(e) => return Err(e.into()),
        }
    }

    let data = page.template_data().await?;
    Ok(render(
        StatusCode::UNPROCESSABLE_ENTITY,
        pages::signup(&data, &form),
    ))
}

#[instrument(skip_all)]
pub async fn user_login_form(page: PageContext) -> Result<Response, AppError> {
    let data = page.template_data().await?;
    Ok(render(
        StatusCode::OK,
        pages::login(&data, &UserLoginForm::default()),
    ))
}

#[instrument(skip_all)]
pub async fn user_login(
    State(state): State<AppState>,
    session: Session,
    page: PageContext,
    PostForm(mut form): PostForm<UserLoginForm>,
) -> Result<Response, AppError> {
    form.check();
    if form.validator.valid() {
        match state.users.authenticate(&form.email, &form.password).await {
            Ok(user_id) => {
                log_in(&session, user_id).await?;
                info!(user_id, "User logged in");
                return Ok(Redirect::to("/snippet/create").into_response());
            }
            Err(StoreError::InvalidCredentials) => {
                form.validator
                    .add_non_field_error("Email or password is incorrect");
            }
            Err(e) => return Err(e.into()),
        }
    }

    let data = page.template_data().await?;
    Ok(render(
        StatusCode::UNPROCESSABLE_ENTITY,
        pages::login(&data, &form),
    ))
}

#[instrument(skip_all)]
pub async fn user_logout(session: Session) -> Result<Response, AppError> {
    log_out(&session).await?;
    put_flash(&session, "You've been logged out successfully!").await?;

    Ok(Redirect::to("/").into_response())
}
