use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use auth_cell::router::auth_routes;
use auth_cell::services::password::hash_password;
use shared_utils::jwt::validate_token;
use shared_utils::test_utils::{MockStoreResponses, TestConfig};

fn app_against(mock_server: &MockServer) -> (Router, TestConfig) {
    let config = TestConfig::with_store_url(&mock_server.uri());
    let app = auth_routes(config.to_state());
    (app, config)
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn json_request(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn registers_a_new_account() {
    let mock_server = MockServer::start().await;
    let (app, _config) = app_against(&mock_server);
    let user_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/users"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            MockStoreResponses::user_row(&user_id, "new@example.com", "hash", false)
        ])))
        .mount(&mock_server)
        .await;

    let response = app
        .oneshot(json_request(
            "/register",
            json!({
                "first_name": "Ana",
                "last_name": "Garcia",
                "phone_number": "123456789",
                "email": "new@example.com",
                "password": "longenoughpassword",
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["ok"], json!(true));
}

#[tokio::test]
async fn rejects_an_already_registered_email() {
    let mock_server = MockServer::start().await;
    let (app, _config) = app_against(&mock_server);
    let user_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .and(query_param("email", "eq.taken@example.com"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStoreResponses::user_row(&user_id, "taken@example.com", "hash", false)
        ])))
        .mount(&mock_server)
        .await;

    let response = app
        .oneshot(json_request(
            "/register",
            json!({
                "first_name": "Ana",
                "last_name": "Garcia",
                "phone_number": "123456789",
                "email": "taken@example.com",
                "password": "longenoughpassword",
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["ok"], json!(false));
}

#[tokio::test]
async fn rejects_a_short_password_before_touching_the_store() {
    let mock_server = MockServer::start().await;
    let (app, _config) = app_against(&mock_server);

    let response = app
        .oneshot(json_request(
            "/register",
            json!({
                "first_name": "Ana",
                "last_name": "Garcia",
                "phone_number": "123456789",
                "email": "new@example.com",
                "password": "short",
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn login_returns_a_usable_session_token() {
    let mock_server = MockServer::start().await;
    let (app, config) = app_against(&mock_server);
    let user_id = Uuid::new_v4();
    let hash = hash_password("correct-password").unwrap();

    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStoreResponses::user_row(&user_id, "user@example.com", &hash, false)
        ])))
        .mount(&mock_server)
        .await;

    let response = app
        .oneshot(json_request(
            "/login",
            json!({ "email": "user@example.com", "password": "correct-password" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let token = body["data"]["token"].as_str().unwrap();

    let user = validate_token(token, &config.jwt_secret).unwrap();
    assert_eq!(user.id, user_id);
    assert!(!user.is_admin);
}

#[tokio::test]
async fn login_with_a_wrong_password_is_unauthorized() {
    let mock_server = MockServer::start().await;
    let (app, _config) = app_against(&mock_server);
    let user_id = Uuid::new_v4();
    let hash = hash_password("correct-password").unwrap();

    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStoreResponses::user_row(&user_id, "user@example.com", &hash, false)
        ])))
        .mount(&mock_server)
        .await;

    let response = app
        .oneshot(json_request(
            "/login",
            json!({ "email": "user@example.com", "password": "wrong-password" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn login_with_an_unknown_email_is_not_found() {
    let mock_server = MockServer::start().await;
    let (app, _config) = app_against(&mock_server);

    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let response = app
        .oneshot(json_request(
            "/login",
            json!({ "email": "nobody@example.com", "password": "whatever-password" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
