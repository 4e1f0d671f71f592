// libs/auth-cell/src/router.rs
use std::sync::Arc;

use axum::{routing::post, Router};

use shared_database::AppState;

use crate::handlers;

pub fn auth_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/register", post(handlers::register))
        .route("/login", post(handlers::login))
        .route("/send-verification", post(handlers::send_verification))
        .route("/verify-email/{token}", post(handlers::verify_email))
        .route("/forgot-password", post(handlers::forgot_password))
        .route("/reset-password/{token}", post(handlers::reset_password))
        .with_state(state)
}
