use axum::{Router, middleware, routing::get};

use crate::middleware::auth::require_authentication;
use crate::modules::snippets::controller::{
    home, snippet_create, snippet_create_form, snippet_view,
};
use crate::state::AppState;

pub fn init_snippets_router() -> Router<AppState> {
    let protected = Router::new()
        .route(
            "/snippet/create",
            get(snippet_create_form).post(snippet_create),
        )
        .route_layer(middleware::from_fn(require_authentication));

    Router::new()
        .route("/", get(home))
        .route("/snippet/view/{id}", get(snippet_view))
        .merge(protected)
}
