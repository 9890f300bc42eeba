//! Terms-and-conditions acceptance model and DTOs.

use std::net::IpAddr;

use ccw_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `tnc_acceptances` table. `ip_address` is read back as text.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct TncAcceptance {
    pub id: DbId,
    pub config_id: String,
    pub ip_address: String,
    pub accepted_at: Timestamp,
    pub user_agent: Option<String>,
}

/// DTO for recording an acceptance.
#[derive(Debug)]
pub struct CreateTncAcceptance {
    pub config_id: String,
    pub ip_address: IpAddr,
    pub user_agent: Option<String>,
}
