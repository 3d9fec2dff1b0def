use anyhow::anyhow;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use snippetbox_core::AppError;
use snippetbox_models::SnippetCreateForm;
use tower_sessions::Session;
use tracing::{info, instrument};

use crate::form::PostForm;
use crate::session::put_flash;
use crate::state::AppState;
use crate::store::StoreError;
use crate::templates::{PageContext, pages, render};

#[instrument(skip_all)]
pub async fn home(State(state): State<AppState>, page: PageContext) -> Result<Response, AppError> {
    let snippets = state.snippets.latest().await?;

    let data = page.template_data().await?;
    Ok(render(StatusCode::OK, pages::home(&data, &snippets)))
}

#[instrument(skip(state, page))]
pub async fn snippet_view(
    State(state): State<AppState>,
    Path(id): Path<String>,
    page: PageContext,
) -> Result<Response, AppError> {
    let id = match id.parse::<i64>() {
        Ok(id) if id >= 1 => id,
        _ => return Err(AppError::not_found(anyhow!("invalid snippet id {id:?}"))),
    };

    let snippet = match state.snippets.get(id).await {
        Ok(snippet) => snippet,
        Err(StoreError::NoRecord) => {
            return Err(AppError::not_found(anyhow!("snippet {id} not found")));
        }
        Err(e) => return Err(e.into()),
    };

    let data = page.template_data().await?;
    Ok(render(StatusCode::OK, pages::view(&data, &snippet)))
}

#[instrument(skip_all)]
pub async fn snippet_create_form(page: PageContext) -> Result<Response, AppError> {
    let data = page.template_data().await?;
    Ok(render(
        StatusCode::OK,
        pages::create(&data, &SnippetCreateForm::new()),
    ))
}

#[instrument(skip_all)]
pub async fn snippet_create(
    State(state): State<AppState>,
    session: Session,
    page: PageContext,
    PostForm(mut form): PostForm<SnippetCreateForm>,
) -> Result<Response, AppError> {
    form.check();
    if form.validator.invalid() {
        let data = page.template_data().await?;
        return Ok(render(
            StatusCode::UNPROCESSABLE_ENTITY,
            pages::create(&data, &form),
        ));
    }

    let id = state
        .snippets
        .insert(&form.title, &form.content, form.expires)
        .await?;
    info!(snippet_id = id, expires_days = form.expires, "Snippet created");

    put_flash(&session, "Snippet successfully created!").await?;
    Ok(Redirect::to(&format!("/snippet/view/{id}")).into_response())
}
