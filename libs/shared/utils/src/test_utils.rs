use std::sync::Arc;

use chrono::{Duration, Utc};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::AppState;
use shared_models::auth::{JwtClaims, User};

use crate::jwt::issue_token;

pub struct TestConfig {
    pub jwt_secret: String,
    pub supabase_url: String,
    pub supabase_anon_key: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "test-secret-key-for-jwt-validation-must-be-long-enough".to_string(),
            supabase_url: "http://localhost:54321".to_string(),
            supabase_anon_key: "test-anon-key".to_string(),
        }
    }
}

impl TestConfig {
    /// Point the store client at a mock server (wiremock) for tests.
    pub fn with_store_url(store_url: &str) -> Self {
        Self {
            supabase_url: store_url.to_string(),
            ..Self::default()
        }
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            supabase_url: self.supabase_url.clone(),
            supabase_anon_key: self.supabase_anon_key.clone(),
            jwt_secret: self.jwt_secret.clone(),
            frontend_url: "http://localhost:5173".to_string(),
            email_api_url: String::new(),
            email_api_key: String::new(),
            email_from: "no-reply@turnos.example".to_string(),
        }
    }

    pub fn to_state(&self) -> Arc<AppState> {
        Arc::new(AppState::new(self.to_app_config()))
    }
}

pub struct TestUser {
    pub id: Uuid,
    pub email: String,
    pub is_admin: bool,
}

impl Default for TestUser {
    fn default() -> Self {
        Self {
            id: Uuid::new_v4(),
            email: "test@example.com".to_string(),
            is_admin: false,
        }
    }
}

impl TestUser {
    pub fn regular(email: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            email: email.to_string(),
            is_admin: false,
        }
    }

    pub fn admin(email: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            email: email.to_string(),
            is_admin: true,
        }
    }

    pub fn to_user(&self) -> User {
        User {
            id: self.id,
            first_name: Some("Test".to_string()),
            last_name: Some("User".to_string()),
            email: Some(self.email.clone()),
            phone_number: Some("123456789".to_string()),
            is_admin: self.is_admin,
            is_verified: true,
        }
    }

    fn claims(&self, exp_hours: i64) -> JwtClaims {
        let now = Utc::now();
        JwtClaims {
            sub: self.id.to_string(),
            exp: Some((now + Duration::hours(exp_hours)).timestamp() as u64),
            iat: Some(now.timestamp() as u64),
            purpose: None,
            first_name: Some("Test".to_string()),
            last_name: Some("User".to_string()),
            email: Some(self.email.clone()),
            phone_number: Some("123456789".to_string()),
            is_admin: self.is_admin,
            is_verified: true,
        }
    }

    pub fn session_token(&self, secret: &str) -> String {
        issue_token(&self.claims(2), secret).expect("test token")
    }

    pub fn expired_token(&self, secret: &str) -> String {
        issue_token(&self.claims(-1), secret).expect("test token")
    }

    pub fn wrong_secret_token(&self) -> String {
        issue_token(&self.claims(2), "wrong-secret").expect("test token")
    }
}

/// Canned PostgREST rows for wiremock-backed tests.
pub struct MockStoreResponses;

impl MockStoreResponses {
    pub fn appointment_row(user_id: &Uuid, date: &str, time: &str, status: &str) -> Value {
        json!({
            "id": Uuid::new_v4(),
            "user_id": user_id,
            "date": date,
            "time": time,
            "status": status,
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z"
        })
    }

    pub fn appointment_with_user_row(
        user_id: &Uuid,
        date: &str,
        time: &str,
        status: &str,
        email: &str,
    ) -> Value {
        json!({
            "id": Uuid::new_v4(),
            "user_id": user_id,
            "date": date,
            "time": time,
            "status": status,
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z",
            "user": {
                "first_name": "Test",
                "last_name": "User",
                "email": email,
                "phone_number": "123456789"
            }
        })
    }

    pub fn user_row(id: &Uuid, email: &str, password_hash: &str, is_admin: bool) -> Value {
        json!({
            "id": id,
            "first_name": "Test",
            "last_name": "User",
            "phone_number": "123456789",
            "email": email,
            "password_hash": password_hash,
            "is_verified": true,
            "is_admin": is_admin,
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z"
        })
    }
}
