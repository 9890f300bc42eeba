//! Route definitions for the OpenAI-compatible proxy.

use axum::routing::any;
use axum::Router;

use crate::handlers::proxy;
use crate::state::AppState;

/// Routes mounted at `/openai`.
///
/// ```text
/// ANY /{*path}  -> forward (POST is rate limited)
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/{*path}", any(proxy::forward))
}
