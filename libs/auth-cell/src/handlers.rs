// libs/auth-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;

use shared_database::AppState;
use shared_models::error::AppError;

use crate::models::{AuthError, EmailRequest, LoginRequest, RegisterRequest, ResetPasswordRequest};
use crate::services::account::AuthService;

fn map_auth_error(err: AuthError) -> AppError {
    match err {
        AuthError::EmailAlreadyRegistered
        | AuthError::AlreadyVerified
        | AuthError::PasswordMismatch => AppError::BadRequest(err.to_string()),
        AuthError::InvalidToken(msg) => AppError::BadRequest(msg),
        AuthError::EmailNotRegistered | AuthError::UserNotFound => {
            AppError::NotFound(err.to_string())
        }
        AuthError::WrongPassword | AuthError::SamePassword => AppError::Auth(err.to_string()),
        AuthError::Hash(msg) => AppError::Internal(msg),
        AuthError::Store(msg) => AppError::Database(msg),
    }
}

#[axum::debug_handler]
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    request.validate().map_err(AppError::BadRequest)?;

    let auth_service = AuthService::new(&state);

    auth_service
        .register(
            &request.first_name,
            &request.last_name,
            &request.phone_number,
            &request.email,
            &request.password,
        )
        .await
        .map_err(map_auth_error)?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "ok": true,
            "status": 201,
            "message": "User registered successfully",
        })),
    ))
}

#[axum::debug_handler]
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let auth_service = AuthService::new(&state);

    let token = auth_service
        .login(&request.email, &request.password)
        .await
        .map_err(map_auth_error)?;

    Ok(Json(json!({
        "ok": true,
        "status": 200,
        "message": "Login successful",
        "data": { "token": token },
    })))
}

#[axum::debug_handler]
pub async fn send_verification(
    State(state): State<Arc<AppState>>,
    Json(request): Json<EmailRequest>,
) -> Result<impl IntoResponse, AppError> {
    let auth_service = AuthService::new(&state);

    auth_service
        .send_email_verification(&request.email)
        .await
        .map_err(map_auth_error)?;

    Ok(Json(json!({
        "ok": true,
        "status": 200,
        "message": "Verification email sent",
    })))
}

#[axum::debug_handler]
pub async fn verify_email(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let auth_service = AuthService::new(&state);

    let session = auth_service
        .verify_email(&token)
        .await
        .map_err(map_auth_error)?;

    Ok(Json(json!({
        "ok": true,
        "status": 200,
        "message": "Email verified successfully",
        "data": { "token": session },
    })))
}

#[axum::debug_handler]
pub async fn forgot_password(
    State(state): State<Arc<AppState>>,
    Json(request): Json<EmailRequest>,
) -> Result<impl IntoResponse, AppError> {
    let auth_service = AuthService::new(&state);

    auth_service
        .forgot_password(&request.email)
        .await
        .map_err(map_auth_error)?;

    Ok(Json(json!({
        "ok": true,
        "status": 200,
        "message": "Password reset email sent",
    })))
}

#[axum::debug_handler]
pub async fn reset_password(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
    Json(request): Json<ResetPasswordRequest>,
) -> Result<impl IntoResponse, AppError> {
    let auth_service = AuthService::new(&state);

    auth_service
        .reset_password(&token, &request.new_password, &request.confirm_password)
        .await
        .map_err(map_auth_error)?;

    Ok(Json(json!({
        "ok": true,
        "status": 200,
        "message": "Password reset successfully",
    })))
}
