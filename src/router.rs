use std::path::Path;

use anyhow::anyhow;
use axum::{Router, middleware};
use snippetbox_core::AppError;
use tower_http::{catch_panic::CatchPanicLayer, services::ServeDir};
use snippetbox_config::SessionConfig;
use tower_sessions::SessionStore;

use crate::logging::logging_middleware;
use crate::middleware::{
    auth::authenticate, csrf::protect, headers::secure_headers, panic::handle_panic,
};
use crate::modules::snippets::router::init_snippets_router;
use crate::modules::users::router::init_users_router;
use crate::session::{SessionLifetime, enforce_lifetime, session_layer};
use crate::state::AppState;

/// Builds the full application.
///
/// Page routes run the dynamic chain (session, CSRF, authentication); static
/// files and the 404 fallback skip it. Everything runs the standard chain.
pub fn init_router<Store>(
    state: AppState,
    session_store: Store,
    session_config: &SessionConfig,
    static_dir: &Path,
) -> Router
where
    Store: SessionStore + Clone,
{
    let dynamic = Router::new()
        .merge(init_snippets_router())
        .merge(init_users_router())
        .route_layer(middleware::from_fn_with_state(state.clone(), authenticate))
        .route_layer(middleware::from_fn(protect))
        .route_layer(middleware::from_fn_with_state(
            SessionLifetime::from(session_config),
            enforce_lifetime,
        ))
        .route_layer(session_layer(session_store, session_config));

    Router::new()
        .merge(dynamic)
        .nest_service("/static", ServeDir::new(static_dir))
        .fallback(not_found)
        .with_state(state)
        .layer(middleware::from_fn(secure_headers))
        .layer(middleware::from_fn(logging_middleware))
        .layer(CatchPanicLayer::custom(handle_panic))
}

async fn not_found() -> AppError {
    AppError::not_found(anyhow!("no route matched"))
}
