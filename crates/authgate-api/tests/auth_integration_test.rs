//! Integration tests for authentication endpoints

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::Response,
    Router,
};
use authgate_api::{models::*, ApiServer, ApiServerConfig};
use authgate_auth::{hash_password, CredentialStore, InMemoryCredentialStore, TokenConfig};
use base64::Engine;
use chrono::Duration;
use serde_json::json;
use std::sync::Arc;
use tower::ServiceExt; // For `oneshot` method

/// Helper to create a test API server over the given store
fn create_test_server(store: Arc<InMemoryCredentialStore>, ttl: Duration) -> ApiServer {
    let config = ApiServerConfig {
        bind_addr: "127.0.0.1:0".parse().unwrap(), // Random port
        enable_cors: true,
        cors_origins: None,
        token: TokenConfig {
            secret_key: "test-secret".to_string(),
            access_token_ttl: ttl,
            ..TokenConfig::default()
        },
    };

    ApiServer::new(config, store).expect("Failed to create server")
}

fn create_test_app() -> (Router, Arc<InMemoryCredentialStore>) {
    let store = Arc::new(InMemoryCredentialStore::new());
    let app = create_test_server(store.clone(), Duration::minutes(30)).build_router();
    (app, store)
}

fn json_request(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .method("POST")
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

fn get_with_auth(uri: &str, authorization: &[String]) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    for value in authorization {
        builder = builder.header(header::AUTHORIZATION, value.as_str());
    }
    builder.body(Body::empty()).unwrap()
}

fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}

fn basic(username: &str, password: &str) -> String {
    let encoded =
        base64::engine::general_purpose::STANDARD.encode(format!("{}:{}", username, password));
    format!("Basic {}", encoded)
}

async fn read_json<T: serde::de::DeserializeOwned>(response: Response) -> T {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

async fn register(app: &Router, username: &str, password: &str) -> Response {
    app.clone()
        .oneshot(json_request(
            "/auth/register",
            json!({ "username": username, "password": password }),
        ))
        .await
        .unwrap()
}

async fn login(app: &Router, username: &str, password: &str) -> Response {
    app.clone()
        .oneshot(json_request(
            "/auth/login",
            json!({ "username": username, "password": password }),
        ))
        .await
        .unwrap()
}

async fn login_token(app: &Router, username: &str, password: &str) -> String {
    let response = login(app, username, password).await;
    assert_eq!(response.status(), StatusCode::OK);
    let data: TokenResponse = read_json(response).await;
    data.access_token
}

#[tokio::test]
async fn test_register_login_and_fetch_me() {
    let (app, _store) = create_test_app();

    let response = register(&app, "alice", "secret1").await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let user: UserResponse = read_json(response).await;
    assert_eq!(user.username, "alice");

    let response = login(&app, "alice", "secret1").await;
    assert_eq!(response.status(), StatusCode::OK);
    let data: TokenResponse = read_json(response).await;
    assert_eq!(data.token_type, "bearer");
    assert_eq!(data.user.username, "alice");
    assert!(data.access_token.starts_with("eyJ"));

    let response = app
        .clone()
        .oneshot(get_with_auth("/users/me", &[bearer(&data.access_token)]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let me: serde_json::Value = read_json(response).await;
    assert_eq!(me, json!({ "username": "alice" }));
}

#[tokio::test]
async fn test_login_wrong_password_issues_no_token() {
    let (app, _store) = create_test_app();
    assert_eq!(
        register(&app, "alice", "secret1").await.status(),
        StatusCode::CREATED
    );

    let response = login(&app, "alice", "wrong-password").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let body: serde_json::Value = read_json(response).await;
    assert!(body.get("access_token").is_none());
    assert_eq!(body["code"], "INVALID_CREDENTIALS");
}

#[tokio::test]
async fn test_login_unknown_user_matches_wrong_password() {
    let (app, _store) = create_test_app();
    register(&app, "alice", "secret1").await;

    let unknown: ErrorResponse = read_json(login(&app, "mallory", "secret1").await).await;
    let wrong: ErrorResponse = read_json(login(&app, "alice", "secret2").await).await;

    assert_eq!(unknown.error, wrong.error);
    assert_eq!(unknown.code, wrong.code);
}

#[tokio::test]
async fn test_short_lived_token_expires() {
    let store = Arc::new(InMemoryCredentialStore::new());
    let app = create_test_server(store, Duration::seconds(1)).build_router();
    register(&app, "alice", "secret1").await;

    let token = login_token(&app, "alice", "secret1").await;
    tokio::time::sleep(std::time::Duration::from_secs(2)).await;

    let response = app
        .oneshot(get_with_auth("/users/me", &[bearer(&token)]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_route_by_role() {
    let (app, store) = create_test_app();
    register(&app, "alice", "secret1").await;
    store
        .insert("root", &hash_password("rootpass").unwrap(), "admin")
        .await
        .unwrap();

    let user_token = login_token(&app, "alice", "secret1").await;
    let response = app
        .clone()
        .oneshot(get_with_auth("/users/admin", &[bearer(&user_token)]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let error: ErrorResponse = read_json(response).await;
    assert_eq!(error.code, Some("FORBIDDEN".to_string()));

    let admin_token = login_token(&app, "root", "rootpass").await;
    let response = app
        .clone()
        .oneshot(get_with_auth("/users/admin", &[bearer(&admin_token)]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let message: MessageResponse = read_json(response).await;
    assert_eq!(message.message, "Hello admin root!");

    // Basic credentials go through the same role gate
    let response = app
        .oneshot(get_with_auth("/users/admin", &[basic("root", "rootpass")]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_basic_credentials_on_protected_route() {
    let (app, _store) = create_test_app();
    register(&app, "alice", "secret1").await;

    let response = app
        .clone()
        .oneshot(get_with_auth("/users/protected", &[basic("alice", "secret1")]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let message: MessageResponse = read_json(response).await;
    assert_eq!(message.message, "Hello, alice! This is a protected route");

    let response = app
        .oneshot(get_with_auth("/users/protected", &[basic("alice", "nope")]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_token_wins_when_both_credentials_sent() {
    let (app, _store) = create_test_app();
    register(&app, "alice", "secret1").await;
    register(&app, "bob", "secret2").await;
    let alice_token = login_token(&app, "alice", "secret1").await;

    let response = app
        .oneshot(get_with_auth(
            "/users/me",
            &[bearer(&alice_token), basic("bob", "secret2")],
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let me: UserResponse = read_json(response).await;
    assert_eq!(me.username, "alice");
}

#[tokio::test]
async fn test_invalid_token_falls_back_to_basic() {
    let (app, _store) = create_test_app();
    register(&app, "bob", "secret2").await;

    let response = app
        .oneshot(get_with_auth(
            "/users/me",
            &[bearer("not.a.token"), basic("bob", "secret2")],
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let me: UserResponse = read_json(response).await;
    assert_eq!(me.username, "bob");
}

#[tokio::test]
async fn test_protected_route_without_credentials() {
    let (app, _store) = create_test_app();

    let response = app
        .oneshot(get_with_auth("/users/me", &[]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        response.headers().get(header::WWW_AUTHENTICATE).unwrap(),
        "Bearer"
    );
}

#[tokio::test]
async fn test_register_duplicate_username() {
    let (app, _store) = create_test_app();

    assert_eq!(
        register(&app, "alice", "secret1").await.status(),
        StatusCode::CREATED
    );

    let response = register(&app, "alice", "another1").await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let error: ErrorResponse = read_json(response).await;
    assert_eq!(error.code, Some("USERNAME_EXISTS".to_string()));

    // The original password still works
    assert_eq!(login(&app, "alice", "secret1").await.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_register_validation() {
    let (app, store) = create_test_app();

    let response = register(&app, "al", "secret1").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let error: ErrorResponse = read_json(response).await;
    assert_eq!(error.code, Some("INVALID_USERNAME".to_string()));

    let response = register(&app, &"x".repeat(33), "secret1").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = register(&app, "alice", "short").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let error: ErrorResponse = read_json(response).await;
    assert_eq!(error.code, Some("WEAK_PASSWORD".to_string()));

    assert!(store.is_empty().await);
}

#[tokio::test]
async fn test_registered_password_is_hashed() {
    let (app, store) = create_test_app();
    register(&app, "alice", "secret1").await;

    let record = store.find_by_username("alice").await.unwrap().unwrap();
    assert_ne!(record.password_hash, "secret1");
    assert!(record.password_hash.starts_with("$argon2id$"));
    assert_eq!(record.role, "user");
}

#[tokio::test]
async fn test_health_and_platform_context() {
    let (app, _store) = create_test_app();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/health")
                .header(
                    "x-amzn-lambda-context",
                    r#"{"env_config":{"function_name":"authgate-fn"}}"#,
                )
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let health: HealthResponse = read_json(response).await;
    assert_eq!(health.status, "healthy");
    assert_eq!(health.function_name, Some(json!("authgate-fn")));

    // Malformed context is ignored rather than rejected
    let response = app
        .oneshot(
            Request::builder()
                .uri("/")
                .header("x-amzn-request-context", "{broken")
                .header(header::AUTHORIZATION, "Bearer secret-token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let root: RootResponse = read_json(response).await;
    assert!(root.request_context.is_none());
    assert!(root.cognito_identity.is_none());
    assert_eq!(root.headers.get("authorization").unwrap(), "<redacted>");
}

#[tokio::test]
async fn test_openapi_document_served() {
    let (app, _store) = create_test_app();

    let response = app
        .oneshot(get_with_auth("/openapi.json", &[]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let doc: serde_json::Value = read_json(response).await;
    assert!(doc["paths"].get("/users/me").is_some());
}

#[tokio::test]
async fn test_form_submit_echoes_fields() {
    let (app, _store) = create_test_app();

    let response = app
        .clone()
        .oneshot(json_request(
            "/form/submit",
            json!({ "name": "Alice", "email": "alice@example.com", "age": 30 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = read_json(response).await;
    assert_eq!(
        body,
        json!({ "name": "Alice", "email": "alice@example.com", "age": 30, "message": "" })
    );

    let response = app
        .oneshot(json_request(
            "/form/submit",
            json!({ "name": "Alice", "email": "alice-at-example" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let error: ErrorResponse = read_json(response).await;
    assert_eq!(error.code, Some("INVALID_EMAIL".to_string()));
}
