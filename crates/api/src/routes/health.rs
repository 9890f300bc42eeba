//! Liveness probe, mounted at the root rather than under `/api`.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Ok,
    /// The process is up but the database did not answer.
    Degraded,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub version: &'static str,
    pub db_healthy: bool,
    pub proxy_configured: bool,
}

/// GET /health
///
/// Answers 200 even when degraded; callers read `status` from the body.
async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let db_healthy = ccw_db::health_check(&state.pool)
        .await
        .inspect_err(|e| tracing::warn!(error = %e, "Database unreachable from health check"))
        .is_ok();

    Json(HealthResponse {
        status: if db_healthy {
            HealthStatus::Ok
        } else {
            HealthStatus::Degraded
        },
        version: env!("CARGO_PKG_VERSION"),
        db_healthy,
        proxy_configured: state.proxy.is_configured(),
    })
}

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}
