pub mod auth;
pub mod leave;
pub mod toil;
pub mod users;

use axum::{
    routing::{get, patch, post},
    Router,
};

use crate::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        // Auth
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/me", get(auth::me))
        // Users
        .route("/api/users", get(users::list).post(users::create))
        .route(
            "/api/users/:id",
            get(users::get_one).put(users::update).delete(users::deactivate),
        )
        .route("/api/users/:id/balances", get(users::balances))
        // Leave balances (own)
        .route("/api/leave/balances", get(leave::my_balances))
        // Leave requests
        .route("/api/leave", get(leave::list).post(leave::create))
        .route("/api/leave/:id", get(leave::get_one).delete(leave::cancel))
        .route("/api/leave/:id/review", patch(leave::review))
        // TOIL
        .route("/api/toil/scenarios", get(toil::scenarios))
        .route("/api/toil", post(toil::submit))
        .with_state(state)
}
