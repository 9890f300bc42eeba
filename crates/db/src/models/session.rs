//! Refresh-token sessions.

use ccw_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// A `user_sessions` row. Only the SHA-256 of the refresh token is stored.
#[derive(Debug, Clone, FromRow)]
pub struct UserSession {
    pub id: DbId,
    pub user_id: DbId,
    pub refresh_token_hash: String,
    pub expires_at: Timestamp,
    pub is_revoked: bool,
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl UserSession {
    /// Whether the refresh token may still be redeemed at `now`.
    pub fn is_redeemable(&self, now: Timestamp) -> bool {
        !self.is_revoked && self.expires_at > now
    }
}

/// Client details recorded alongside a session.
#[derive(Debug, Clone, Default)]
pub struct SessionOrigin {
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
}

/// A session about to be opened by login or refresh.
#[derive(Debug)]
pub struct CreateSession {
    pub user_id: DbId,
    pub refresh_token_hash: String,
    pub expires_at: Timestamp,
    pub origin: SessionOrigin,
}
