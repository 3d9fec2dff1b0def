use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderValue, header, request::Parts},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use snippetbox_core::AppError;
use tower_sessions::Session;
use tracing::debug;

use crate::session::authenticated_user_id;
use crate::state::AppState;

/// Who, if anyone, is making the current request.
///
/// Recomputed from the session by [`authenticate`] on every request and
/// carried in the request extensions. A request that never passed through
/// [`authenticate`] extracts as anonymous.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AuthState {
    pub user_id: Option<i64>,
}

impl AuthState {
    pub fn is_authenticated(&self) -> bool {
        self.user_id.is_some()
    }
}

impl<S> FromRequestParts<S> for AuthState
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts.extensions.get::<AuthState>().copied().unwrap_or_default())
    }
}

/// Resolves the session's user id against the user store.
///
/// A stale id (user no longer exists) leaves the request anonymous without
/// touching the session.
pub async fn authenticate(
    State(state): State<AppState>,
    session: Session,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let mut auth = AuthState::default();

    if let Some(id) = authenticated_user_id(&session).await?.filter(|id| *id != 0) {
        if state.users.exists(id).await? {
            auth.user_id = Some(id);
        } else {
            debug!(user_id = id, "Session refers to a missing user");
        }
    }

    req.extensions_mut().insert(auth);
    Ok(next.run(req).await)
}

/// Sends anonymous requests to the login page; stops authenticated pages
/// from being cached.
pub async fn require_authentication(auth: AuthState, req: Request, next: Next) -> Response {
    if !auth.is_authenticated() {
        return Redirect::to("/user/login").into_response();
    }

    let mut response = next.run(req).await;
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    response
}
