// libs/auth-cell/src/models.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Stored account row. `password_hash` never leaves this crate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: String,
    pub email: String,
    pub password_hash: String,
    pub is_verified: bool,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub first_name: String,
    pub last_name: String,
    pub phone_number: String,
    pub email: String,
    pub password: String,
}

impl RegisterRequest {
    pub fn validate(&self) -> Result<(), String> {
        if self.first_name.trim().is_empty() {
            return Err("First name is required".to_string());
        }
        if self.last_name.trim().is_empty() {
            return Err("Last name is required".to_string());
        }
        if self.phone_number.trim().is_empty() {
            return Err("Phone number is required".to_string());
        }
        if !self.email.contains('@') {
            return Err("Invalid email address".to_string());
        }
        if self.password.len() < 8 {
            return Err("Password must be at least 8 characters long".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmailRequest {
    pub email: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResetPasswordRequest {
    pub new_password: String,
    pub confirm_password: String,
}

/// Authentication failures, HTTP-free; the handler layer maps them.
#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("The email is already registered")]
    EmailAlreadyRegistered,

    #[error("The email is not registered")]
    EmailNotRegistered,

    #[error("The password is incorrect")]
    WrongPassword,

    #[error("The email is already verified")]
    AlreadyVerified,

    #[error("User not found")]
    UserNotFound,

    #[error("{0}")]
    InvalidToken(String),

    #[error("The passwords do not match")]
    PasswordMismatch,

    #[error("The new password cannot be the same as the previous one")]
    SamePassword,

    #[error("Password hashing failed: {0}")]
    Hash(String),

    #[error("Store error: {0}")]
    Store(String),
}
