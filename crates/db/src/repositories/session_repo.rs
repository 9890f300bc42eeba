//! Repository for the `user_sessions` table (refresh-token sessions).

use ccw_core::types::DbId;
use sqlx::{PgExecutor, PgPool};

use crate::models::session::{CreateSession, UserSession};

const COLUMNS: &str = "id, user_id, refresh_token_hash, expires_at, is_revoked, \
                        user_agent, ip_address, created_at, updated_at";

/// Refresh-token session storage. Only token hashes are persisted.
pub struct SessionRepo;

impl SessionRepo {
    /// Insert a new session, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateSession) -> Result<UserSession, sqlx::Error> {
        insert(pool, input).await
    }

    /// Look up a session by refresh token hash, live or not.
    ///
    /// Callers decide redeemability with [`UserSession::is_redeemable`].
    pub async fn find_by_hash(
        pool: &PgPool,
        hash: &str,
    ) -> Result<Option<UserSession>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM user_sessions WHERE refresh_token_hash = $1");
        sqlx::query_as::<_, UserSession>(&query)
            .bind(hash)
            .fetch_optional(pool)
            .await
    }

    /// Revoke `old_session_id` and insert `replacement` in one transaction.
    ///
    /// Returns `None` (and inserts nothing) if the old session was already
    /// revoked, so a refresh token can be redeemed at most once.
    pub async fn rotate(
        pool: &PgPool,
        old_session_id: DbId,
        replacement: &CreateSession,
    ) -> Result<Option<UserSession>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let revoked = sqlx::query(
            "UPDATE user_sessions SET is_revoked = true WHERE id = $1 AND is_revoked = false",
        )
        .bind(old_session_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if revoked == 0 {
            tx.rollback().await?;
            return Ok(None);
        }

        let session = insert(&mut *tx, replacement).await?;

        tx.commit().await?;
        Ok(Some(session))
    }

    /// Revoke every live session of a user. Returns how many were revoked.
    pub async fn revoke_all_for_user(pool: &PgPool, user_id: DbId) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE user_sessions SET is_revoked = true WHERE user_id = $1 AND is_revoked = false",
        )
        .bind(user_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Delete expired or revoked sessions. Run once at startup.
    pub async fn purge_stale(pool: &PgPool) -> Result<u64, sqlx::Error> {
        let result =
            sqlx::query("DELETE FROM user_sessions WHERE expires_at < NOW() OR is_revoked = true")
                .execute(pool)
                .await?;
        Ok(result.rows_affected())
    }
}

async fn insert<'e, E>(executor: E, input: &CreateSession) -> Result<UserSession, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    let query = format!(
        "INSERT INTO user_sessions (user_id, refresh_token_hash, expires_at, user_agent, ip_address)
         VALUES ($1, $2, $3, $4, $5)
         RETURNING {COLUMNS}"
    );
    sqlx::query_as::<_, UserSession>(&query)
        .bind(input.user_id)
        .bind(&input.refresh_token_hash)
        .bind(input.expires_at)
        .bind(&input.origin.user_agent)
        .bind(&input.origin.ip_address)
        .fetch_one(executor)
        .await
}
