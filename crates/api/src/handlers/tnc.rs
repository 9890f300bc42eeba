//! Handler for recording terms-and-conditions acceptances.

use axum::extract::State;
use axum::http::header::USER_AGENT;
use axum::http::HeaderMap;
use axum::Json;
use ccw_core::tnc::validate_config_id;
use ccw_db::models::tnc_acceptance::{CreateTncAcceptance, TncAcceptance};
use ccw_db::repositories::TncAcceptanceRepo;
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::middleware::client_ip::ClientIp;
use crate::response::Created;
use crate::state::AppState;

/// Request body for `POST /tnc-acceptances`.
///
/// Address and user agent come from the request itself, never the body.
#[derive(Debug, Deserialize)]
pub struct AcceptRequest {
    pub config_id: String,
}

/// POST /api/tnc-acceptances
pub async fn accept(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    headers: HeaderMap,
    Json(input): Json<AcceptRequest>,
) -> AppResult<Created<TncAcceptance>> {
    validate_config_id(&input.config_id)?;

    let ip_address = ip.ok_or_else(|| {
        AppError::BadRequest("Unable to determine client address".into())
    })?;

    let user_agent = headers
        .get(USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let acceptance = TncAcceptanceRepo::create(
        &state.pool,
        &CreateTncAcceptance {
            config_id: input.config_id,
            ip_address,
            user_agent,
        },
    )
    .await?;

    tracing::info!(
        config_id = %acceptance.config_id,
        ip = %acceptance.ip_address,
        "Terms and conditions accepted"
    );
    Ok(Created(acceptance))
}
