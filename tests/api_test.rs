//! Integration tests for API endpoints.
//!
//! The router runs against the in-memory credential store and a notifier
//! that records outgoing mail, so no database or SMTP relay is needed.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use credential_service::api::{create_router, AppState};
use credential_service::config::Config;
use credential_service::errors::AppResult;
use credential_service::infra::MemoryUserStore;
use credential_service::notify::{EmailMessage, Notifier};
use credential_service::services::Services;

const SECRET: &str = "api-integration-test-secret-32-chars!";

// =============================================================================
// Test Helpers
// =============================================================================

/// Notifier that keeps every message it is asked to send
#[derive(Default)]
struct RecordingNotifier {
    sent: Mutex<Vec<EmailMessage>>,
}

impl RecordingNotifier {
    fn last(&self) -> Option<EmailMessage> {
        self.sent.lock().unwrap().last().cloned()
    }

    fn count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, message: EmailMessage) -> AppResult<()> {
        self.sent.lock().unwrap().push(message);
        Ok(())
    }
}

struct TestApp {
    router: Router,
    mail: Arc<RecordingNotifier>,
}

fn app() -> TestApp {
    let config = Config::new(SECRET, "http://localhost:3000");
    let mail = Arc::new(RecordingNotifier::default());
    let services = Services::build(Arc::new(MemoryUserStore::new()), mail.clone(), &config)
        .expect("services build");

    TestApp {
        router: create_router(AppState::from_services(&services)),
        mail,
    }
}

async fn call(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn json_request(method: Method, uri: &str, body: Value, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn form_request(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(Method::GET).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

fn registration(email: &str, password: &str) -> Value {
    json!({
        "email": email,
        "username": "alice",
        "first_name": "Alice",
        "last_name": "Smith",
        "password": password,
    })
}

async fn register(router: &Router, email: &str, password: &str) -> Value {
    let (status, body) = call(
        router,
        json_request(Method::POST, "/auth/register", registration(email, password), None),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "register failed: {body}");
    body
}

async fn login(router: &Router, email: &str, password: &str) -> (StatusCode, Value) {
    call(
        router,
        json_request(
            Method::POST,
            "/auth/login",
            json!({ "email": email, "password": password }),
            None,
        ),
    )
    .await
}

async fn token_for(router: &Router, email: &str, password: &str) -> String {
    let (status, body) = login(router, email, password).await;
    assert_eq!(status, StatusCode::OK, "login failed: {body}");
    body["access_token"].as_str().unwrap().to_string()
}

/// Pull the reset token out of the emailed link
fn token_from_mail(message: &EmailMessage) -> String {
    let start = message.body.find("reset-password/").expect("link in body") + "reset-password/".len();
    message.body[start..]
        .chars()
        .take_while(|c| c.is_ascii_hexdigit())
        .collect()
}

// =============================================================================
// Registration & Login
// =============================================================================

#[tokio::test]
async fn test_register_returns_public_user() {
    let app = app();
    let body = register(&app.router, "a@x.com", "secret123").await;

    assert_eq!(body["email"], "a@x.com");
    assert_eq!(body["roles"], json!(["ROLE_USER"]));
    assert_eq!(body["full_name"], "Alice Smith");
    assert_eq!(body["role_title"], "User");
    assert!(body.get("password_hash").is_none());
    assert!(body.get("reset_token").is_none());
}

#[tokio::test]
async fn test_register_duplicate_email_conflicts() {
    let app = app();
    register(&app.router, "a@x.com", "secret123").await;

    let (status, body) = call(
        &app.router,
        json_request(Method::POST, "/auth/register", registration("a@x.com", "other-pw"), None),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "EMAIL_CONFLICT");
}

#[tokio::test]
async fn test_register_reports_every_invalid_field() {
    let app = app();
    let (status, body) = call(
        &app.router,
        json_request(
            Method::POST,
            "/auth/register",
            json!({ "email": "nope", "username": "al", "first_name": "Alice", "last_name": "Smith", "password": "abc" }),
            None,
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    let fields = &body["error"]["fields"];
    assert!(fields.get("email").is_some());
    assert!(fields.get("username").is_some());
    assert!(fields.get("password").is_some());
}

#[tokio::test]
async fn test_login_token_carries_id_and_content_type() {
    let app = app();
    let user = register(&app.router, "a@x.com", "secret123").await;

    let token = token_for(&app.router, "a@x.com", "secret123").await;
    let header = jsonwebtoken::decode_header(&token).unwrap();
    assert_eq!(header.cty.as_deref(), Some("JWT"));

    let (status, me) = call(&app.router, get("/users/me", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["id"], user["id"]);
}

#[tokio::test]
async fn test_login_failures_look_identical() {
    let app = app();
    register(&app.router, "a@x.com", "secret123").await;

    let (wrong_status, wrong_body) = login(&app.router, "a@x.com", "wrong").await;
    let (unknown_status, unknown_body) = login(&app.router, "b@x.com", "secret123").await;

    assert_eq!(wrong_status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_body, unknown_body);
    assert_eq!(wrong_body["error"]["message"], "Invalid email or password");
}

// =============================================================================
// Password Reset
// =============================================================================

#[tokio::test]
async fn test_reset_flow_with_json_and_form_bodies() {
    let app = app();
    register(&app.router, "a@x.com", "secret123").await;

    let (status, body) = call(
        &app.router,
        json_request(
            Method::POST,
            "/auth/forgot-password",
            json!({ "email": "a@x.com" }),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "An email has been sent to a@x.com");

    let mail = app.mail.last().expect("reset email sent");
    assert_eq!(mail.to, "a@x.com");
    assert_eq!(mail.subject, "Password recovery");
    let token = token_from_mail(&mail);
    assert_eq!(token.len(), 64);

    let uri = format!("/auth/reset-password/{}", token);
    let (status, _) = call(&app.router, form_request(&uri, "_password=brand-new-pw")).await;
    assert_eq!(status, StatusCode::OK);

    assert_eq!(login(&app.router, "a@x.com", "secret123").await.0, StatusCode::UNAUTHORIZED);
    token_for(&app.router, "a@x.com", "brand-new-pw").await;

    // Single use
    let (status, body) = call(&app.router, form_request(&uri, "_password=another-pw")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "UNKNOWN_TOKEN");
}

#[tokio::test]
async fn test_forgot_password_accepts_form_field() {
    let app = app();
    register(&app.router, "a@x.com", "secret123").await;

    let (status, _) = call(
        &app.router,
        form_request("/auth/forgot-password", "_email=a%40x.com"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.mail.count(), 1);
}

#[tokio::test]
async fn test_forgot_password_unknown_email_not_found() {
    let app = app();
    let (status, body) = call(
        &app.router,
        json_request(
            Method::POST,
            "/auth/forgot-password",
            json!({ "email": "ghost@x.com" }),
            None,
        ),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
    assert_eq!(app.mail.count(), 0);
}

#[tokio::test]
async fn test_forgot_password_requires_email() {
    let app = app();
    let (status, body) = call(
        &app.router,
        json_request(Method::POST, "/auth/forgot-password", json!({}), None),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]["fields"].get("email").is_some());
}

// =============================================================================
// User Resource
// =============================================================================

#[tokio::test]
async fn test_protected_routes_require_token() {
    let app = app();
    let (status, body) = call(&app.router, get("/users/me", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");

    let (status, _) = call(&app.router, get("/users/me", Some("garbage"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_create_user_hashes_password() {
    let app = app();
    let (status, body) = call(
        &app.router,
        json_request(Method::POST, "/users", registration("c@x.com", "secret123"), None),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["email"], "c@x.com");

    token_for(&app.router, "c@x.com", "secret123").await;
}

#[tokio::test]
async fn test_partial_update_keeps_password() {
    let app = app();
    let user = register(&app.router, "a@x.com", "secret123").await;
    let token = token_for(&app.router, "a@x.com", "secret123").await;

    let uri = format!("/users/{}", user["id"].as_str().unwrap());
    let (status, body) = call(
        &app.router,
        json_request(Method::PUT, &uri, json!({ "username": "alice2" }), Some(&token)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "alice2");

    token_for(&app.router, "a@x.com", "secret123").await;
}

#[tokio::test]
async fn test_update_with_password_changes_login() {
    let app = app();
    let user = register(&app.router, "a@x.com", "secret123").await;
    let token = token_for(&app.router, "a@x.com", "secret123").await;

    let uri = format!("/users/{}", user["id"].as_str().unwrap());
    let (status, _) = call(
        &app.router,
        json_request(Method::PUT, &uri, json!({ "password": "rotated-pw" }), Some(&token)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    token_for(&app.router, "a@x.com", "rotated-pw").await;
}

#[tokio::test]
async fn test_update_other_user_forbidden() {
    let app = app();
    let victim = register(&app.router, "a@x.com", "secret123").await;
    register(&app.router, "b@x.com", "secret123").await;
    let token = token_for(&app.router, "b@x.com", "secret123").await;

    let uri = format!("/users/{}", victim["id"].as_str().unwrap());
    let (status, body) = call(
        &app.router,
        json_request(Method::PUT, &uri, json!({ "password": "hijacked" }), Some(&token)),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "FORBIDDEN");
    token_for(&app.router, "a@x.com", "secret123").await;
}

// =============================================================================
// Health & Docs
// =============================================================================

#[tokio::test]
async fn test_health_reports_store() {
    let app = app();
    let (status, body) = call(&app.router, get("/health", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["services"]["database"]["status"], "healthy");
}

#[tokio::test]
async fn test_openapi_document_served() {
    let app = app();
    let (status, body) = call(&app.router, get("/api-docs/openapi.json", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"].get("/auth/forgot-password").is_some());
}
