//! HTTP-level integration tests for `/api/openai/{*path}`.
//!
//! A throwaway axum server on a loopback port plays the upstream and echoes
//! what it received. None of these routes touch the database.

mod common;

use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, Method, Request, StatusCode, Uri};
use axum::{Json, Router};
use ccw_api::auth::jwt::generate_access_token;
use common::{body_json, from_peer, get, lazy_pool, request, send, test_config_with};
use serde_json::{json, Value};
use tokio::net::TcpListener;

async fn echo(method: Method, uri: Uri, headers: HeaderMap, body: Bytes) -> Json<Value> {
    let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok()).map(str::to_string);
    Json(json!({
        "method": method.as_str(),
        "path": uri.path(),
        "query": uri.query(),
        "authorization": header("authorization"),
        "remote_user": header("remote_user"),
        "body": String::from_utf8_lossy(&body),
    }))
}

/// Start the echo upstream and return its base URL.
async fn spawn_upstream() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, Router::new().fallback(echo)).await.unwrap();
    });
    format!("http://{addr}/v1")
}

fn proxy_app(upstream: &str, extra: &[(&str, &str)]) -> Router {
    let mut overrides = vec![("OPENAI_PROXY_URL", upstream)];
    overrides.extend_from_slice(extra);
    common::build_test_app_with(lazy_pool(), test_config_with(&overrides))
}

fn token(user_id: i64, username: &str) -> String {
    generate_access_token(user_id, username, false, &common::test_config().jwt).unwrap()
}

#[tokio::test]
async fn unconfigured_upstream_is_503() {
    let app = common::build_test_app(lazy_pool());
    let response = get(app, "/api/openai/models").await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body_json(response).await["code"], "PROXY_NOT_CONFIGURED");
}

#[tokio::test]
async fn forwards_path_query_and_body() {
    let upstream = spawn_upstream().await;
    let app = proxy_app(&upstream, &[]);

    let response = send(
        app,
        request(
            Method::POST,
            "/api/openai/chat/completions?stream=false",
            None,
            Some(json!({"model": "m"})),
        ),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "application/json");
    let echoed = body_json(response).await;
    assert_eq!(echoed["method"], "POST");
    assert_eq!(echoed["path"], "/v1/chat/completions");
    assert_eq!(echoed["query"], "stream=false");
    assert_eq!(echoed["body"], r#"{"model":"m"}"#);
    assert_eq!(echoed["remote_user"], Value::Null);
}

#[tokio::test]
async fn own_token_becomes_remote_user() {
    let upstream = spawn_upstream().await;
    let app = proxy_app(&upstream, &[]);

    let token = token(42, "ada");
    let response = send(app, request(Method::GET, "/api/openai/models", Some(&token), None)).await;

    let echoed = body_json(response).await;
    assert_eq!(echoed["remote_user"], "ada");
    assert_eq!(echoed["authorization"], Value::Null);
}

#[tokio::test]
async fn foreign_credentials_pass_through_and_spoofing_is_dropped() {
    let upstream = spawn_upstream().await;
    let app = proxy_app(&upstream, &[]);

    let request = Request::builder()
        .method(Method::GET)
        .uri("/api/openai/models")
        .header("authorization", "Bearer sk-client-key")
        .header("remote_user", "admin")
        .body(Body::empty())
        .unwrap();
    let echoed = body_json(send(app, request).await).await;

    assert_eq!(echoed["authorization"], "Bearer sk-client-key");
    assert_eq!(echoed["remote_user"], Value::Null);
}

#[tokio::test]
async fn configured_api_key_replaces_authorization() {
    let upstream = spawn_upstream().await;
    let app = proxy_app(&upstream, &[("OPENAI_PROXY_API_KEY", "sk-server")]);

    let request = Request::builder()
        .uri("/api/openai/models")
        .header("authorization", "Bearer sk-client-key")
        .body(Body::empty())
        .unwrap();
    let echoed = body_json(send(app, request).await).await;
    assert_eq!(echoed["authorization"], "Bearer sk-server");
}

#[tokio::test]
async fn posts_beyond_the_rate_are_429() {
    let upstream = spawn_upstream().await;
    let app = proxy_app(&upstream, &[("OPENAI_PROXY_RATE", "2/m")]);
    let ada = token(1, "ada");
    let bob = token(2, "bob");

    let post = |token: &str| request(Method::POST, "/api/openai/completions", Some(token), Some(json!({})));

    assert_eq!(send(app.clone(), post(&ada)).await.status(), StatusCode::OK);
    assert_eq!(send(app.clone(), post(&ada)).await.status(), StatusCode::OK);

    let admitted = send(app.clone(), post(&bob)).await;
    assert_eq!(admitted.headers()["x-ratelimit-limit"], "2");
    assert_eq!(admitted.headers()["x-ratelimit-remaining"], "1");

    let limited = send(app.clone(), post(&ada)).await;
    assert_eq!(limited.status(), StatusCode::TOO_MANY_REQUESTS);
    let retry_after: u64 = limited.headers()["retry-after"].to_str().unwrap().parse().unwrap();
    assert!(retry_after >= 1 && retry_after <= 60);

    // Budgets are per user, and GETs are neither limited nor annotated.
    assert_eq!(send(app.clone(), post(&bob)).await.status(), StatusCode::OK);
    let get_models = request(Method::GET, "/api/openai/models", Some(&ada), None);
    let response = send(app, get_models).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(!response.headers().contains_key("x-ratelimit-remaining"));
}

fn anonymous_post(peer: &str, forwarded_for: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri("/api/openai/completions");
    if let Some(hops) = forwarded_for {
        builder = builder.header("x-forwarded-for", hops);
    }
    from_peer(builder.body(Body::from("{}")).unwrap(), peer)
}

#[tokio::test]
async fn anonymous_posts_are_limited_per_address() {
    let upstream = spawn_upstream().await;
    let app = proxy_app(&upstream, &[("OPENAI_PROXY_RATE", "1/m")]);

    let post = |peer: &str| anonymous_post(peer, None);

    assert_eq!(send(app.clone(), post("198.51.100.1")).await.status(), StatusCode::OK);
    assert_eq!(
        send(app.clone(), post("198.51.100.1")).await.status(),
        StatusCode::TOO_MANY_REQUESTS
    );
    assert_eq!(send(app, post("198.51.100.2")).await.status(), StatusCode::OK);
}

#[tokio::test]
async fn rotating_forwarded_for_does_not_reset_the_budget() {
    let upstream = spawn_upstream().await;
    let app = proxy_app(&upstream, &[("OPENAI_PROXY_RATE", "2/m")]);

    let mut statuses = Vec::new();
    for spoofed in ["203.0.113.1", "203.0.113.2", "203.0.113.3", "203.0.113.4"] {
        let request = anonymous_post("198.51.100.7", Some(spoofed));
        statuses.push(send(app.clone(), request).await.status());
    }

    assert_eq!(
        statuses,
        [
            StatusCode::OK,
            StatusCode::OK,
            StatusCode::TOO_MANY_REQUESTS,
            StatusCode::TOO_MANY_REQUESTS,
        ]
    );
}

#[tokio::test]
async fn trusted_proxy_budgets_each_forwarded_client() {
    let upstream = spawn_upstream().await;
    let app = proxy_app(
        &upstream,
        &[("OPENAI_PROXY_RATE", "1/m"), ("TRUSTED_PROXIES", "10.0.0.0/8")],
    );
    let via_proxy = |client: &str| anonymous_post("10.0.0.2", Some(client));

    assert_eq!(send(app.clone(), via_proxy("203.0.113.1")).await.status(), StatusCode::OK);
    assert_eq!(send(app.clone(), via_proxy("203.0.113.2")).await.status(), StatusCode::OK);
    assert_eq!(
        send(app.clone(), via_proxy("203.0.113.1")).await.status(),
        StatusCode::TOO_MANY_REQUESTS
    );

    // A forged leading hop does not hide the address the proxy saw.
    let forged = anonymous_post("10.0.0.2", Some("192.0.2.55, 203.0.113.2"));
    assert_eq!(send(app, forged).await.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn unreachable_upstream_is_502() {
    let closed = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = closed.local_addr().unwrap();
    drop(closed);

    let app = proxy_app(&format!("http://{addr}/v1"), &[]);
    let response = get(app, "/api/openai/models").await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn relative_segments_are_400() {
    let upstream = spawn_upstream().await;
    let app = proxy_app(&upstream, &[]);
    let response = get(app, "/api/openai/models/../../admin").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
