//! Tracing setup and the on-disk log directory.

use std::fs::{self, OpenOptions};
use std::io;
use std::path::Path;
use std::sync::Mutex;

use anyhow::Context;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// File inside the log directory that receives JSON records.
pub const LOG_FILE_NAME: &str = "server.log";

/// Filter used when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "ccw_api=debug,ccw_db=info,tower_http=debug";

/// Create the log directory (and parents) and set its mode to `0o755`.
///
/// Safe to call when the directory already exists.
pub fn ensure_log_dir(dir: &Path) -> io::Result<()> {
    fs::create_dir_all(dir)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(dir, fs::Permissions::from_mode(0o755))?;
    }

    Ok(())
}

/// Install the global subscriber: human-readable output on stdout plus JSON
/// lines appended to `<log_dir>/server.log`.
pub fn init(log_dir: &Path) -> anyhow::Result<()> {
    ensure_log_dir(log_dir)
        .with_context(|| format!("Failed to create log directory {}", log_dir.display()))?;

    let log_path = log_dir.join(LOG_FILE_NAME);
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("Failed to open {}", log_path.display()))?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into()))
        .with(fmt::layer())
        .with(
            fmt::layer()
                .json()
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
        .try_init()
        .context("Failed to install tracing subscriber")?;

    tracing::debug!(path = %log_path.display(), "File logging enabled");
    Ok(())
}
