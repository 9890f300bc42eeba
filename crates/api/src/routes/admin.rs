//! Route definitions for the `/admin` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::admin;
use crate::state::AppState;

/// Routes mounted at `/admin`.
///
/// All routes require a staff account (enforced by handler extractors).
///
/// ```text
/// GET /users             -> list_users
/// GET /json-data         -> list_json_data
/// GET /tnc-acceptances   -> list_tnc_acceptances
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users", get(admin::list_users))
        .route("/json-data", get(admin::list_json_data))
        .route("/tnc-acceptances", get(admin::list_tnc_acceptances))
}
