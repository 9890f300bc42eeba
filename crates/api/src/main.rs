use anyhow::Context;

use ccw_api::config::ServerConfig;
use ccw_api::router::build_app_router;
use ccw_api::startup::superuser::SuperuserSpec;
use ccw_api::state::AppState;
use ccw_api::{server, startup, telemetry};

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // --- Configuration ---
    let config = ServerConfig::from_env().context("Invalid server configuration")?;

    // --- Logging (creates the log directory) ---
    telemetry::init(&config.log_dir)?;
    tracing::info!(
        host = %config.host,
        port = config.port,
        workers = config.workers,
        trusted_proxies = %config.trusted_proxies,
        "Loaded server configuration"
    );

    // --- Runtime with a fixed worker pool ---
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.workers)
        .thread_name("ccw-worker")
        .enable_all()
        .build()
        .context("Failed to build tokio runtime")?;

    runtime.block_on(run(config))
}

async fn run(config: ServerConfig) -> anyhow::Result<()> {
    // --- Database wait, migrations, superuser ---
    let pool = startup::prepare(&config, SuperuserSpec::from_env().as_ref()).await?;

    // --- Listener (bound only after migrations succeed) ---
    let listener = server::bind_listener(&config)?;

    // --- App state + router ---
    let state = AppState::new(pool, config.clone()).context("Failed to build HTTP client")?;
    let app = build_app_router(state, &config);

    server::serve(listener, app).await
}
