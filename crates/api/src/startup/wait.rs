//! Block until the database host accepts TCP connections.

use std::fmt;
use std::time::{Duration, Instant};

use tokio::net::TcpStream;

use crate::config::{DatabaseConfig, BARE_ENGINE};

/// Fixed delay between connection attempts.
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Upper bound on a single connect attempt, so a black-holed host still
/// gets polled at a steady rate.
const ATTEMPT_TIMEOUT: Duration = Duration::from_secs(1);

/// Emit a progress line every this many failed attempts.
const PROGRESS_EVERY: u64 = 50;

/// Host and port to poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaitTarget {
    pub host: String,
    pub port: u16,
}

impl fmt::Display for WaitTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum WaitError {
    #[error("Database at {target} still unreachable after {attempts} attempts ({elapsed_secs}s)")]
    TimedOut {
        target: String,
        attempts: u64,
        elapsed_secs: u64,
    },
}

/// Whether the configured database is Postgres and therefore worth waiting for.
///
/// Accepts `postgres://` and `postgresql://` URLs, and the bare engine name
/// `postgres`.
pub fn is_postgres(database_url: &str) -> bool {
    database_url == BARE_ENGINE
        || database_url.starts_with("postgres://")
        || database_url.starts_with("postgresql://")
}

/// Resolve the wait target, or `None` when no wait should happen.
///
/// `POSTGRES_HOST`/`POSTGRES_PORT` win; otherwise host and port are the
/// ones the pool will connect to. A Unix socket host cannot be polled over
/// TCP and disables the wait.
pub fn wait_target(db: &DatabaseConfig) -> Option<WaitTarget> {
    if !is_postgres(&db.url) {
        return None;
    }

    if let (None, Some(socket)) = (&db.wait_host, db.connect.get_socket()) {
        tracing::info!(socket = %socket.display(), "Database is a Unix socket, not waiting");
        return None;
    }

    let host = db
        .wait_host
        .clone()
        .unwrap_or_else(|| db.connect.get_host().to_string());
    let port = db.wait_port.unwrap_or_else(|| db.connect.get_port());

    if host.starts_with('/') {
        tracing::info!(%host, "Database host is a Unix socket, not waiting");
        return None;
    }

    Some(WaitTarget { host, port })
}

/// Poll `target` every `interval` until a TCP connection succeeds.
///
/// With `timeout = None` this never gives up. Returns the number of attempts
/// it took.
pub async fn wait_for_tcp(
    target: &WaitTarget,
    interval: Duration,
    timeout: Option<Duration>,
) -> Result<u64, WaitError> {
    let started = Instant::now();
    let mut attempts: u64 = 0;

    tracing::info!(addr = %target, "Waiting for database to accept connections");

    loop {
        attempts += 1;

        let outcome = tokio::time::timeout(
            ATTEMPT_TIMEOUT,
            TcpStream::connect((target.host.as_str(), target.port)),
        )
        .await;

        match outcome {
            Ok(Ok(_stream)) => {
                tracing::info!(
                    addr = %target,
                    attempts,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Database is reachable"
                );
                return Ok(attempts);
            }
            Ok(Err(e)) if attempts % PROGRESS_EVERY == 0 => {
                tracing::info!(addr = %target, attempts, error = %e, "Still waiting for database");
            }
            Err(_) if attempts % PROGRESS_EVERY == 0 => {
                tracing::info!(addr = %target, attempts, "Still waiting for database (connect timed out)");
            }
            _ => {}
        }

        if let Some(limit) = timeout {
            if started.elapsed() >= limit {
                return Err(WaitError::TimedOut {
                    target: target.to_string(),
                    attempts,
                    elapsed_secs: started.elapsed().as_secs(),
                });
            }
        }

        tokio::time::sleep(interval).await;
    }
}
