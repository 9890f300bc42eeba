//! Everything that happens between loading configuration and binding the
//! listener: database readiness, migrations, superuser bootstrap.

pub mod migrate;
pub mod superuser;
pub mod wait;

use std::time::Duration;

use anyhow::Context;
use ccw_db::repositories::SessionRepo;
use ccw_db::DbPool;

use crate::config::ServerConfig;
use superuser::SuperuserSpec;

/// Run the startup sequence and return a pool ready to serve requests.
///
/// 1. Wait for the database host (only for Postgres URLs).
/// 2. Connect the pool.
/// 3. Apply migrations.
/// 4. Create the superuser when `superuser` is provided.
/// 5. Drop expired and revoked sessions.
pub async fn prepare(
    config: &ServerConfig,
    superuser: Option<&SuperuserSpec>,
) -> anyhow::Result<DbPool> {
    match wait::wait_target(&config.database) {
        Some(target) => {
            let timeout = config.database.wait_timeout_secs.map(Duration::from_secs);
            wait::wait_for_tcp(&target, wait::POLL_INTERVAL, timeout).await?;
        }
        None => tracing::info!("Skipping database readiness wait"),
    }

    let pool = ccw_db::create_pool(config.database.connect.clone(), config.database.max_connections)
        .await
        .context("Failed to connect to database")?;
    tracing::info!(
        max_connections = config.database.max_connections,
        "Database connection pool created"
    );

    migrate::apply(&pool)
        .await
        .context("Failed to run database migrations")?;

    superuser::ensure_superuser(&pool, superuser).await?;

    let purged = SessionRepo::purge_stale(&pool)
        .await
        .context("Failed to purge stale sessions")?;
    if purged > 0 {
        tracing::info!(purged, "Removed expired or revoked sessions");
    }

    Ok(pool)
}
