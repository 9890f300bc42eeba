//! Route definitions for the `/tnc-acceptances` resource.

use axum::routing::post;
use axum::Router;

use crate::handlers::tnc;
use crate::state::AppState;

/// Routes mounted at `/tnc-acceptances`.
///
/// ```text
/// POST /  -> accept (no auth)
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/", post(tnc::accept))
}
