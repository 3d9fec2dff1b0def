//! Server-rendered HTML.
//!
//! Pages are `maud` functions in [`pages`] taking a [`TemplateData`] plus
//! whatever the page shows. Handlers get the data from [`PageContext`] only
//! when they are about to render, because building it consumes the flash.

pub mod pages;

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{Html, IntoResponse, Response},
};
use chrono::{DateTime, Datelike, Utc};
use maud::Markup;
use snippetbox_core::AppError;
use tower_sessions::Session;

use crate::middleware::auth::AuthState;
use crate::middleware::csrf::CsrfToken;
use crate::session::pop_flash;

/// Values every page layout needs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateData {
    pub current_year: i32,
    pub flash: Option<String>,
    pub is_authenticated: bool,
    pub csrf_token: String,
}

/// Request-scoped inputs for [`TemplateData`].
pub struct PageContext {
    session: Session,
    auth: AuthState,
    csrf: CsrfToken,
}

impl PageContext {
    /// Pops the flash message and assembles the layout data.
    pub async fn template_data(&self) -> Result<TemplateData, AppError> {
        Ok(TemplateData {
            current_year: Utc::now().year(),
            flash: pop_flash(&self.session).await?,
            is_authenticated: self.auth.is_authenticated(),
            csrf_token: self.csrf.0.clone(),
        })
    }
}

impl<S> FromRequestParts<S> for PageContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state)
            .await
            .map_err(|(_, msg)| AppError::unrecoverable(anyhow::anyhow!(msg)))?;
        let auth = AuthState::from_request_parts(parts, state)
            .await
            .unwrap_or_default();
        let csrf = CsrfToken::from_request_parts(parts, state).await?;

        Ok(Self {
            session,
            auth,
            csrf,
        })
    }
}

pub fn render(status: StatusCode, page: Markup) -> Response {
    (status, Html(page.into_string())).into_response()
}

/// Formats a timestamp as `02 Jan 2006 at 15:04` in UTC.
pub fn human_date(t: &DateTime<Utc>) -> String {
    t.format("%d %b %Y at %H:%M").to_string()
}
