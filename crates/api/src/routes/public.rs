//! Route definitions for unauthenticated read access.

use axum::routing::get;
use axum::Router;

use crate::handlers::public;
use crate::state::AppState;

/// Routes mounted at `/public`.
///
/// ```text
/// GET /json-data/{uuid}  -> get_json_data (only when marked public)
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/json-data/{uuid}", get(public::get_json_data))
}
