//! Schema migrations applied on every start.

use std::time::Instant;

use ccw_db::DbPool;

/// Apply all pending migrations. There is no retry: a failure aborts startup.
pub async fn apply(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    let started = Instant::now();
    tracing::info!("Applying database migrations");

    ccw_db::run_migrations(pool).await.inspect_err(|e| {
        tracing::error!(error = %e, "Database migration failed");
    })?;

    tracing::info!(
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Database migrations applied"
    );
    Ok(())
}
