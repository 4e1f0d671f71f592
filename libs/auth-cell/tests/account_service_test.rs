use std::sync::Arc;

use assert_matches::assert_matches;
use chrono::{Duration, Utc};
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use auth_cell::models::AuthError;
use auth_cell::services::account::AuthService;
use auth_cell::services::password::hash_password;
use shared_database::StoreClient;
use shared_models::auth::JwtClaims;
use shared_utils::jwt::{issue_token, validate_token};
use shared_utils::test_utils::TestConfig;

fn service_against(mock_server: &MockServer) -> (AuthService, String) {
    let config = TestConfig::with_store_url(&mock_server.uri()).to_app_config();
    let store = Arc::new(StoreClient::new(&config));
    let secret = config.jwt_secret.clone();
    (AuthService::with_store(store, &config), secret)
}

fn purpose_token(user_id: &Uuid, purpose: &str, secret: &str, minutes: i64) -> String {
    let now = Utc::now();
    let claims = JwtClaims {
        sub: user_id.to_string(),
        exp: Some((now + Duration::minutes(minutes)).timestamp() as u64),
        iat: Some(now.timestamp() as u64),
        purpose: Some(purpose.to_string()),
        first_name: None,
        last_name: None,
        email: None,
        phone_number: None,
        is_admin: false,
        is_verified: false,
    };
    issue_token(&claims, secret).unwrap()
}

fn user_row(id: &Uuid, password_hash: &str, is_verified: bool) -> serde_json::Value {
    json!({
        "id": id,
        "first_name": "Ana",
        "last_name": "Garcia",
        "phone_number": "123456789",
        "email": "ana@example.com",
        "password_hash": password_hash,
        "is_verified": is_verified,
        "is_admin": false,
        "created_at": "2024-01-01T00:00:00Z",
        "updated_at": "2024-01-01T00:00:00Z"
    })
}

#[tokio::test]
async fn verify_email_flips_the_flag_and_issues_a_session() {
    let mock_server = MockServer::start().await;
    let (service, secret) = service_against(&mock_server);
    let user_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .and(query_param("id", format!("eq.{}", user_id)))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([user_row(&user_id, "hash", false)])),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/users"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([user_row(&user_id, "hash", true)])),
        )
        .mount(&mock_server)
        .await;

    let token = purpose_token(&user_id, "email_verification", &secret, 60);
    let session = service.verify_email(&token).await.unwrap();

    let user = validate_token(&session, &secret).unwrap();
    assert_eq!(user.id, user_id);
    assert!(user.is_verified);
}

#[tokio::test]
async fn verify_email_rejects_a_session_token() {
    let mock_server = MockServer::start().await;
    let (service, secret) = service_against(&mock_server);
    let user_id = Uuid::new_v4();

    // A plain session token carries no purpose claim and must not be
    // accepted as proof of email ownership.
    let now = Utc::now();
    let claims = JwtClaims {
        sub: user_id.to_string(),
        exp: Some((now + Duration::hours(1)).timestamp() as u64),
        iat: Some(now.timestamp() as u64),
        purpose: None,
        first_name: None,
        last_name: None,
        email: None,
        phone_number: None,
        is_admin: false,
        is_verified: false,
    };
    let token = issue_token(&claims, &secret).unwrap();

    let result = service.verify_email(&token).await;

    assert_matches!(result, Err(AuthError::InvalidToken(_)));
}

#[tokio::test]
async fn verify_email_rejects_a_reset_token() {
    let mock_server = MockServer::start().await;
    let (service, secret) = service_against(&mock_server);

    let token = purpose_token(&Uuid::new_v4(), "password_reset", &secret, 60);
    let result = service.verify_email(&token).await;

    assert_matches!(result, Err(AuthError::InvalidToken(_)));
}

#[tokio::test]
async fn send_verification_refuses_an_already_verified_account() {
    let mock_server = MockServer::start().await;
    let (service, _secret) = service_against(&mock_server);
    let user_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([user_row(&user_id, "hash", true)])),
        )
        .mount(&mock_server)
        .await;

    let result = service.send_email_verification("ana@example.com").await;

    assert_matches!(result, Err(AuthError::AlreadyVerified));
}

#[tokio::test]
async fn reset_password_rejects_mismatched_confirmation() {
    let mock_server = MockServer::start().await;
    let (service, secret) = service_against(&mock_server);
    let user_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([user_row(&user_id, "hash", true)])),
        )
        .mount(&mock_server)
        .await;

    let token = purpose_token(&user_id, "password_reset", &secret, 10);
    let result = service
        .reset_password(&token, "new-password-1", "new-password-2")
        .await;

    assert_matches!(result, Err(AuthError::PasswordMismatch));
}

#[tokio::test]
async fn reset_password_rejects_reusing_the_old_password() {
    let mock_server = MockServer::start().await;
    let (service, secret) = service_against(&mock_server);
    let user_id = Uuid::new_v4();
    let hash = hash_password("old-password").unwrap();

    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([user_row(&user_id, &hash, true)])),
        )
        .mount(&mock_server)
        .await;

    let token = purpose_token(&user_id, "password_reset", &secret, 10);
    let result = service
        .reset_password(&token, "old-password", "old-password")
        .await;

    assert_matches!(result, Err(AuthError::SamePassword));
}

#[tokio::test]
async fn reset_password_persists_a_new_hash() {
    let mock_server = MockServer::start().await;
    let (service, secret) = service_against(&mock_server);
    let user_id = Uuid::new_v4();
    let hash = hash_password("old-password").unwrap();

    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([user_row(&user_id, &hash, true)])),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/users"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([user_row(&user_id, "new-hash", true)])),
        )
        .mount(&mock_server)
        .await;

    let token = purpose_token(&user_id, "password_reset", &secret, 10);
    let result = service
        .reset_password(&token, "brand-new-password", "brand-new-password")
        .await;

    assert!(result.is_ok());
}

#[tokio::test]
async fn reset_password_rejects_an_expired_token() {
    let mock_server = MockServer::start().await;
    let (service, secret) = service_against(&mock_server);

    let token = purpose_token(&Uuid::new_v4(), "password_reset", &secret, -5);
    let result = service
        .reset_password(&token, "new-password", "new-password")
        .await;

    assert_matches!(result, Err(AuthError::InvalidToken(_)));
}
