use std::sync::Arc;

use ccw_core::rate_limit::FixedWindowLimiter;

use crate::config::ServerConfig;
use crate::proxy::UpstreamProxy;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheap to clone: everything heavy sits behind an `Arc` or is already `Clone`.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: ccw_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// HTTP client for the OpenAI-compatible upstream.
    pub proxy: Arc<UpstreamProxy>,
    /// Budget for proxied POST requests.
    pub proxy_limiter: Arc<FixedWindowLimiter>,
}

impl AppState {
    /// Assemble state from a pool and configuration.
    pub fn new(pool: ccw_db::DbPool, config: ServerConfig) -> Result<Self, reqwest::Error> {
        let proxy = UpstreamProxy::from_config(&config.proxy)?;
        let proxy_limiter = FixedWindowLimiter::new(config.proxy.post_rate);
        Ok(Self {
            pool,
            config: Arc::new(config),
            proxy: Arc::new(proxy),
            proxy_limiter: Arc::new(proxy_limiter),
        })
    }
}
