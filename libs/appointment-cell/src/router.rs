// libs/appointment-cell/src/router.rs
use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, patch, post},
    Router,
};

use shared_database::AppState;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn appointment_routes(state: Arc<AppState>) -> Router {
    // All appointment operations require authentication
    let protected_routes = Router::new()
        .route(
            "/",
            post(handlers::create_appointment).get(handlers::get_user_appointments),
        )
        .route("/date", get(handlers::get_appointments_by_date))
        .route("/{appointment_id}", patch(handlers::update_appointment))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new().merge(protected_routes).with_state(state)
}
