use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};

use shared_database::AppState;
use shared_models::auth::User;
use shared_models::error::AppError;

use crate::jwt::validate_token;

/// Authentication middleware: validates the bearer token and stores the
/// caller identity in the request extensions for handlers to pick up.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = request
        .headers()
        .get("Authorization")
        .ok_or_else(|| AppError::Auth("Missing authorization header".to_string()))?;

    let auth_value = auth_header
        .to_str()
        .map_err(|_| AppError::Auth("Invalid authorization header format".to_string()))?;

    if !auth_value.starts_with("Bearer ") {
        return Err(AppError::Auth("Invalid authorization header format".to_string()));
    }

    let token = &auth_value[7..];

    let user = validate_token(token, &state.config.jwt_secret).map_err(AppError::Auth)?;

    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}

/// Admin gate for administrative routes; must run after `auth_middleware`.
pub async fn require_admin(request: Request<Body>, next: Next) -> Result<Response, AppError> {
    let user = request
        .extensions()
        .get::<User>()
        .ok_or_else(|| AppError::Auth("User not found in request extensions".to_string()))?;

    if !user.is_admin {
        return Err(AppError::Forbidden(
            "Access denied: administrator privileges required".to_string(),
        ));
    }

    Ok(next.run(request).await)
}

/// Extract the authenticated user placed in the extensions by the middleware.
pub fn extract_user<B>(request: &Request<B>) -> Result<User, AppError> {
    request
        .extensions()
        .get::<User>()
        .cloned()
        .ok_or_else(|| AppError::Auth("User not found in request extensions".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        http::StatusCode,
        middleware,
        routing::get,
        Router,
    };
    use tower::ServiceExt;

    use crate::test_utils::{TestConfig, TestUser};

    fn admin_only_app(config: &TestConfig) -> Router {
        let state = config.to_state();
        Router::new()
            .route(
                "/admin",
                get(|request: Request<Body>| async move {
                    extract_user(&request).map(|user| user.id.to_string())
                }),
            )
            .layer(middleware::from_fn(require_admin))
            .layer(middleware::from_fn_with_state(state, auth_middleware))
    }

    #[tokio::test]
    async fn admin_passes_the_gate() {
        let config = TestConfig::default();
        let app = admin_only_app(&config);
        let admin = TestUser::admin("admin@example.com");

        let request = Request::builder()
            .uri("/admin")
            .header(
                "authorization",
                format!("Bearer {}", admin.session_token(&config.jwt_secret)),
            )
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(bytes, admin.id.to_string().as_bytes());
    }

    #[tokio::test]
    async fn regular_user_is_forbidden() {
        let config = TestConfig::default();
        let app = admin_only_app(&config);
        let user = TestUser::regular("user@example.com");

        let request = Request::builder()
            .uri("/admin")
            .header(
                "authorization",
                format!("Bearer {}", user.session_token(&config.jwt_secret)),
            )
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn missing_token_never_reaches_the_gate() {
        let config = TestConfig::default();
        let app = admin_only_app(&config);

        let request = Request::builder()
            .uri("/admin")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
