#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{HeaderMap, Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use greenlight::greenlight_config::{AppConfig, RateLimitConfig};
use greenlight::greenlight_core::hash_password;
use greenlight::greenlight_db::{Models, NewUser};
use greenlight::greenlight_models::{TokenScope, User};
use greenlight::modules::tokens::service::TokenService;
use greenlight::router::init_router;
use greenlight::state::AppState;
use greenlight::utils::email::{Email, MemoryMailer};

/// Address every request appears to come from unless a test overrides it.
pub const CLIENT_ADDR: &str = "203.0.113.10:51000";

pub struct TestApp {
    pub state: AppState,
    pub router: Router,
    pub mailer: Arc<MemoryMailer>,
}

impl TestApp {
    pub async fn send(&self, req: Request<Body>) -> TestResponse {
        send(self.router.clone(), req).await
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestResponse {
    pub fn error_code(&self) -> &str {
        self.body["error"]["code"].as_str().unwrap_or_default()
    }
}

/// Limiter disabled, in-memory store, mail captured in memory.
pub fn setup_test_app() -> TestApp {
    setup_test_app_with_config(AppConfig {
        limiter: RateLimitConfig::disabled(),
        ..AppConfig::default()
    })
}

pub fn setup_test_app_with_config(config: AppConfig) -> TestApp {
    setup_test_app_with_models(config, Models::memory())
}

pub fn setup_test_app_with_models(config: AppConfig, models: Models) -> TestApp {
    let mailer = Arc::new(MemoryMailer::new());
    let state = AppState::new(config, models, mailer.clone()).unwrap();
    let router = init_router(state.clone());
    TestApp {
        state,
        router,
        mailer,
    }
}

pub fn request(method: &str, uri: &str) -> axum::http::request::Builder {
    let addr: SocketAddr = CLIENT_ADDR.parse().unwrap();
    Request::builder()
        .method(method)
        .uri(uri)
        .extension(ConnectInfo(addr))
}

pub fn get(uri: &str) -> Request<Body> {
    request("GET", uri).body(Body::empty()).unwrap()
}

pub fn get_with_token(uri: &str, token: &str) -> Request<Body> {
    request("GET", uri)
        .header("authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap()
}

pub fn json_request(method: &str, uri: &str, body: Value, token: Option<&str>) -> Request<Body> {
    let mut builder = request(method, uri).header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub async fn send(router: Router, req: Request<Body>) -> TestResponse {
    let response = router.oneshot(req).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    TestResponse {
        status,
        headers,
        body,
    }
}

pub fn generate_unique_email() -> String {
    use std::sync::atomic::{AtomicU64, Ordering};
    static COUNTER: AtomicU64 = AtomicU64::new(0);
    format!("user{}@example.com", COUNTER.fetch_add(1, Ordering::Relaxed))
}

/// Inserts a user straight into the store. The password hash is a
/// placeholder, so these users cannot log in with a password.
pub async fn create_test_user(state: &AppState, activated: bool, permissions: &[&str]) -> User {
    insert_user(state, "not-a-bcrypt-hash".to_string(), activated, permissions).await
}

/// Like [`create_test_user`] but with a real password hash.
pub async fn create_test_user_with_password(
    state: &AppState,
    password: &str,
    activated: bool,
) -> User {
    insert_user(state, hash_password(password).unwrap(), activated, &[]).await
}

async fn insert_user(
    state: &AppState,
    password_hash: String,
    activated: bool,
    permissions: &[&str],
) -> User {
    let user = state
        .models
        .users
        .insert(NewUser {
            name: "Test User".to_string(),
            email: generate_unique_email(),
            password_hash,
            activated,
        })
        .await
        .unwrap();

    if !permissions.is_empty() {
        state
            .models
            .permissions
            .add_for_user(user.id, permissions)
            .await
            .unwrap();
    }
    user
}

/// Issues an authentication token for `user` through the token service.
pub async fn auth_token_for(state: &AppState, user: &User) -> String {
    TokenService::new_token(
        &state.models,
        user.id,
        Duration::from_secs(3600),
        TokenScope::Authentication,
    )
    .await
    .unwrap()
    .plaintext
}

/// Waits for background mail delivery to reach `count` messages.
pub async fn wait_for_mail(mailer: &MemoryMailer, count: usize) -> Vec<Email> {
    for _ in 0..200 {
        let sent = mailer.sent();
        if sent.len() >= count {
            return sent;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("expected {count} emails, got {}", mailer.sent().len());
}

/// Pulls the token out of the `{"token": "..."}` line of an email body.
pub fn token_from_email(email: &Email) -> String {
    let marker = "\"token\": \"";
    let start = email.text_body.find(marker).expect("email has no token") + marker.len();
    let end = email.text_body[start..].find('"').unwrap() + start;
    email.text_body[start..end].to_string()
}
