//! HTTP-level integration tests for login, refresh, logout and `me`.

mod common;

use axum::http::StatusCode;
use common::{
    body_json, get, get_auth, post_auth, post_json, user_with_token, TEST_PASSWORD,
};
use serde_json::json;
use sqlx::PgPool;

async fn login(app: axum::Router, username: &str, password: &str) -> axum::response::Response {
    post_json(
        app,
        "/api/auth/login",
        json!({ "username": username, "password": password }),
    )
    .await
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn login_returns_tokens_and_user(pool: PgPool) {
    let user = common::create_user(&pool, "loginuser", false).await;
    let app = common::build_test_app(pool);

    let response = login(app, "loginuser", TEST_PASSWORD).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert!(json["access_token"].is_string());
    assert!(json["refresh_token"].is_string());
    assert_eq!(json["expires_in"], 15 * 60);
    assert_eq!(json["user"]["id"], user.id);
    assert_eq!(json["user"]["is_staff"], false);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn wrong_password_and_unknown_user_are_401(pool: PgPool) {
    common::create_user(&pool, "wrongpw", false).await;
    let app = common::build_test_app(pool);

    let response = login(app.clone(), "wrongpw", "incorrect").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = login(app, "ghost", "whatever").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn deactivated_account_is_403(pool: PgPool) {
    let user = common::create_user(&pool, "inactive", false).await;
    sqlx::query("UPDATE users SET is_active = FALSE WHERE id = $1")
        .bind(user.id)
        .execute(&pool)
        .await
        .unwrap();
    let app = common::build_test_app(pool);

    let response = login(app, "inactive", TEST_PASSWORD).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn five_failures_lock_the_account(pool: PgPool) {
    common::create_user(&pool, "locked", false).await;
    let app = common::build_test_app(pool);

    for _ in 0..5 {
        let response = login(app.clone(), "locked", "nope").await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    // Even the right password is refused while locked.
    let response = login(app, "locked", TEST_PASSWORD).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn refresh_rotates_and_old_token_is_single_use(pool: PgPool) {
    common::create_user(&pool, "refresher", false).await;
    let app = common::build_test_app(pool);

    let json = body_json(login(app.clone(), "refresher", TEST_PASSWORD).await).await;
    let original = json["refresh_token"].as_str().unwrap().to_string();

    let response = post_json(
        app.clone(),
        "/api/auth/refresh",
        json!({ "refresh_token": original }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let rotated = body_json(response).await;
    assert_ne!(rotated["refresh_token"].as_str().unwrap(), original);

    let response = post_json(app, "/api/auth/refresh", json!({ "refresh_token": original })).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn logout_revokes_refresh_tokens(pool: PgPool) {
    common::create_user(&pool, "leaver", false).await;
    let app = common::build_test_app(pool);

    let json = body_json(login(app.clone(), "leaver", TEST_PASSWORD).await).await;
    let access = json["access_token"].as_str().unwrap();
    let refresh = json["refresh_token"].as_str().unwrap();

    let response = post_auth(app.clone(), "/api/auth/logout", access).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = post_json(app, "/api/auth/refresh", json!({ "refresh_token": refresh })).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn me_returns_caller(pool: PgPool) {
    let (user, token) = user_with_token(&pool, "whoami", false).await;
    let app = common::build_test_app(pool);

    let response = get_auth(app.clone(), "/api/auth/me", &token).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["id"], user.id);
    assert_eq!(json["username"], "whoami");
    assert_eq!(json["email"], "whoami@test.com");

    let response = get(app.clone(), "/api/auth/me").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = get_auth(app, "/api/auth/me", "not-a-jwt").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
