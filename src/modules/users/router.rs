use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::middleware::auth::require_authentication;
use crate::modules::users::controller::{
    user_login, user_login_form, user_logout, user_signup, user_signup_form,
};
use crate::state::AppState;

pub fn init_users_router() -> Router<AppState> {
    let protected = Router::new()
        .route("/user/logout", post(user_logout))
        .route_layer(middleware::from_fn(require_authentication));

    Router::new()
        .route("/user/signup", get(user_signup_form).post(user_signup))
        .route("/user/login", get(user_login_form).post(user_login))
        .merge(protected)
}
