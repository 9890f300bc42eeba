#![allow(dead_code)]

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tower::ServiceExt;

use ccw_api::auth::jwt::generate_access_token;
use ccw_api::auth::password::hash_password;
use ccw_api::config::ServerConfig;
use ccw_api::router::build_app_router;
use ccw_api::state::AppState;
use ccw_db::models::user::{CreateUser, User};
use ccw_db::repositories::UserRepo;

pub const TEST_PASSWORD: &str = "test_password_123!";

/// Build a test `ServerConfig` from the given overrides on top of safe
/// defaults (proxy disabled, short request timeout).
pub fn test_config_with(overrides: &[(&str, &str)]) -> ServerConfig {
    let mut env: HashMap<String, String> = [
        ("HOST", "127.0.0.1"),
        ("PORT", "0"),
        ("DATABASE_URL", "postgres://localhost/unused"),
        ("JWT_SECRET", "integration-test-secret"),
        ("CORS_ORIGINS", "http://localhost:3000"),
        ("REQUEST_TIMEOUT_SECS", "30"),
        ("STATIC_ROOT", "tests/fixtures/static"),
    ]
    .iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();
    for (k, v) in overrides {
        env.insert(k.to_string(), v.to_string());
    }
    ServerConfig::from_lookup(move |key| env.get(key).cloned()).expect("test config should load")
}

pub fn test_config() -> ServerConfig {
    test_config_with(&[])
}

/// Build the full application router (same middleware stack as production)
/// around the given pool.
pub fn build_test_app(pool: PgPool) -> Router {
    build_test_app_with(pool, test_config())
}

pub fn build_test_app_with(pool: PgPool, config: ServerConfig) -> Router {
    let state = AppState::new(pool, config.clone()).expect("state should build");
    build_app_router(state, &config)
}

/// A pool pointed at a closed port; for routes that never touch the
/// database, or tests that want it unreachable.
pub fn lazy_pool() -> PgPool {
    PgPoolOptions::new()
        .acquire_timeout(Duration::from_secs(1))
        .connect_lazy("postgres://localhost:1/unused")
        .expect("lazy pool should build")
}

// ---------------------------------------------------------------------------
// Users and tokens
// ---------------------------------------------------------------------------

/// Insert a user with [`TEST_PASSWORD`].
pub async fn create_user(pool: &PgPool, username: &str, staff: bool) -> User {
    let input = CreateUser {
        username: username.to_string(),
        email: format!("{username}@test.com"),
        password_hash: hash_password(TEST_PASSWORD).expect("hashing should succeed"),
        is_staff: staff,
        is_superuser: false,
    };
    UserRepo::create(pool, &input)
        .await
        .expect("user creation should succeed")
}

/// Sign an access token for `user` with the test secret.
pub fn token_for(user: &User) -> String {
    generate_access_token(user.id, &user.username, user.is_staff, &test_config().jwt)
        .expect("token generation should succeed")
}

/// Create a user and return it with a valid access token.
pub async fn user_with_token(pool: &PgPool, username: &str, staff: bool) -> (User, String) {
    let user = create_user(pool, username, staff).await;
    let token = token_for(&user);
    (user, token)
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

pub async fn send(app: Router, request: Request<Body>) -> Response<Body> {
    app.oneshot(request).await.expect("request should complete")
}

pub fn request(
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
    }
    match body {
        Some(json) => builder
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// Attach the socket peer the server would have recorded for `request`.
pub fn from_peer(mut request: Request<Body>, peer: &str) -> Request<Body> {
    let ip: IpAddr = peer.parse().expect("peer should be an IP address");
    request
        .extensions_mut()
        .insert(ConnectInfo(SocketAddr::new(ip, 40_000)));
    request
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, request(Method::GET, uri, None, None)).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, request(Method::GET, uri, Some(token), None)).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    send(app, request(Method::POST, uri, None, Some(body))).await
}

pub async fn post_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response<Body> {
    send(app, request(Method::POST, uri, Some(token), Some(body))).await
}

pub async fn post_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, request(Method::POST, uri, Some(token), None)).await
}

pub async fn put_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response<Body> {
    send(app, request(Method::PUT, uri, Some(token), Some(body))).await
}

pub async fn patch_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response<Body> {
    send(app, request(Method::PATCH, uri, Some(token), Some(body))).await
}

pub async fn delete_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, request(Method::DELETE, uri, Some(token), None)).await
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body should be readable")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("body should be JSON")
}
