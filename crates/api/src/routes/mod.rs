pub mod admin;
pub mod auth;
pub mod health;
pub mod json_data;
pub mod proxy;
pub mod public;
pub mod tnc;

use axum::Router;

use crate::state::AppState;

/// Build the `/api` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /auth/login                          login (public)
/// /auth/refresh                        refresh (public)
/// /auth/logout                         logout (requires auth)
/// /auth/me                             current user (requires auth)
///
/// /json-data                           list, create (requires auth)
/// /json-data/names                     distinct names
/// /json-data/{id}                      get, put, patch, delete
/// /json-data/{id}/make-public          share by uuid (POST)
/// /json-data/{id}/make-private         stop sharing (POST)
///
/// /public/json-data/{uuid}             shared document (public)
///
/// /tnc-acceptances                     record acceptance (POST, public)
///
/// /admin/users                         list users (staff)
/// /admin/json-data                     all documents (staff)
/// /admin/tnc-acceptances               acceptance log (staff)
///
/// /openai/{*path}                      upstream proxy (POST rate limited)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/json-data", json_data::router())
        .nest("/public", public::router())
        .nest("/tnc-acceptances", tnc::router())
        .nest("/admin", admin::router())
        .nest("/openai", proxy::router())
}
