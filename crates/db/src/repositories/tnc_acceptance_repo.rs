//! Repository for the `tnc_acceptances` table.

use ccw_core::search::{clamp_limit, clamp_offset, DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT};
use sqlx::PgPool;

use crate::models::tnc_acceptance::{CreateTncAcceptance, TncAcceptance};

/// `ip_address` is stored as INET and read back without its netmask.
const COLUMNS: &str = "id, config_id, host(ip_address) AS ip_address, accepted_at, user_agent";

/// Append-only log of terms-and-conditions acceptances.
pub struct TncAcceptanceRepo;

impl TncAcceptanceRepo {
    /// Record an acceptance, stamped with the current time.
    pub async fn create(
        pool: &PgPool,
        input: &CreateTncAcceptance,
    ) -> Result<TncAcceptance, sqlx::Error> {
        let query = format!(
            "INSERT INTO tnc_acceptances (config_id, ip_address, user_agent)
             VALUES ($1, $2::inet, $3)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, TncAcceptance>(&query)
            .bind(&input.config_id)
            .bind(input.ip_address.to_string())
            .bind(&input.user_agent)
            .fetch_one(pool)
            .await
    }

    /// List acceptances, newest first, optionally for a single config id.
    pub async fn list(
        pool: &PgPool,
        config_id: Option<&str>,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<TncAcceptance>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM tnc_acceptances
             WHERE ($1::text IS NULL OR config_id = $1)
             ORDER BY accepted_at DESC, id DESC
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, TncAcceptance>(&query)
            .bind(config_id)
            .bind(clamp_limit(limit, DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT))
            .bind(clamp_offset(offset))
            .fetch_all(pool)
            .await
    }
}
