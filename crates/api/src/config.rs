use std::path::PathBuf;
use std::str::FromStr;

use ccw_core::client_ip::TrustedProxies;
use ccw_core::rate_limit::Rate;
use sqlx::postgres::PgConnectOptions;

use crate::auth::jwt::JwtConfig;

/// Default per-user budget for proxied POST requests.
pub const DEFAULT_PROXY_RATE: &str = "60/m";

/// `DATABASE_URL` value that means "assemble the connection from the
/// `POSTGRES_*` variables".
pub const BARE_ENGINE: &str = "postgres";

/// Errors raised while reading configuration from the environment.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{key} has invalid value '{value}': {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Server configuration loaded from environment variables.
///
/// All fields except `DATABASE_URL` and `JWT_SECRET` have defaults matching
/// the container deployment (`0.0.0.0:8000`, four workers).
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `8000`).
    pub port: u16,
    /// Runtime worker threads (default: `4`).
    pub workers: usize,
    /// HTTP request timeout in seconds (default: `120`).
    pub request_timeout_secs: u64,
    /// Enable TCP keepalive on accepted connections (default: `true`).
    pub tcp_keepalive: bool,
    /// Listen backlog for the bound socket (default: `2048`).
    pub listen_backlog: u32,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS`.
    pub cors_origins: Vec<String>,
    /// Directory for log files, created at startup (default: `logs`).
    pub log_dir: PathBuf,
    /// Directory of collected static assets served under `/static`.
    pub static_root: PathBuf,
    /// Peers allowed to set `X-Forwarded-For` / `X-Real-IP` (default: none).
    pub trusted_proxies: TrustedProxies,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub proxy: ProxyConfig,
}

/// Database connection settings plus the readiness-wait inputs.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    /// What the pool connects with, resolved from `url` once at load time.
    pub connect: PgConnectOptions,
    pub max_connections: u32,
    /// `POSTGRES_HOST` override for the readiness wait.
    pub wait_host: Option<String>,
    /// `POSTGRES_PORT` override for the readiness wait.
    pub wait_port: Option<u16>,
    /// Give up waiting after this many seconds; `None` waits forever.
    pub wait_timeout_secs: Option<u64>,
}

/// Upstream proxy settings.
#[derive(Debug, Clone)]
pub struct ProxyConfig {
    /// Base URL of the OpenAI-compatible upstream. `None` disables the proxy.
    pub upstream_url: Option<String>,
    /// Credential sent upstream as a bearer token.
    pub api_key: Option<String>,
    /// Budget for POST requests per user (or per client address).
    pub post_rate: Rate,
}

impl ServerConfig {
    /// Load configuration from the process environment.
    ///
    /// | Env Var                 | Default                  |
    /// |-------------------------|--------------------------|
    /// | `HOST`                  | `0.0.0.0`                |
    /// | `PORT`                  | `8000`                   |
    /// | `WORKERS`               | `4`                      |
    /// | `REQUEST_TIMEOUT_SECS`  | `120`                    |
    /// | `TCP_KEEPALIVE`         | `true`                   |
    /// | `LISTEN_BACKLOG`        | `2048`                   |
    /// | `CORS_ORIGINS`          | `http://localhost:3000`  |
    /// | `LOG_DIR`               | `logs`                   |
    /// | `STATIC_ROOT`           | `staticfiles`            |
    /// | `TRUSTED_PROXIES`       | unset (trust no proxy)   |
    /// | `DATABASE_URL`          | **required**             |
    /// | `DB_MAX_CONNECTIONS`    | `20`                     |
    /// | `POSTGRES_HOST`         | from `DATABASE_URL`      |
    /// | `POSTGRES_PORT`         | from `DATABASE_URL`      |
    /// | `POSTGRES_DB`           | `postgres`               |
    /// | `POSTGRES_USER`         | `postgres`               |
    /// | `POSTGRES_PASSWORD`     | unset                    |
    /// | `DB_WAIT_TIMEOUT_SECS`  | unset (wait forever)     |
    /// | `OPENAI_PROXY_URL`      | unset (proxy disabled)   |
    /// | `OPENAI_PROXY_API_KEY`  | unset                    |
    /// | `OPENAI_PROXY_RATE`     | `60/m`                   |
    ///
    /// `DATABASE_URL=postgres` (no scheme) builds the connection from the
    /// `POSTGRES_*` variables; any other value is parsed as a URL.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let host = get("HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port = parse_or(&get, "PORT", 8000u16)?;
        let workers = parse_or(&get, "WORKERS", 4usize)?;
        if workers == 0 {
            return Err(invalid("WORKERS", "0", "must be at least 1"));
        }
        let request_timeout_secs = parse_or(&get, "REQUEST_TIMEOUT_SECS", 120u64)?;
        let tcp_keepalive = parse_or(&get, "TCP_KEEPALIVE", true)?;
        let listen_backlog = parse_or(&get, "LISTEN_BACKLOG", 2048u32)?;

        let cors_origins: Vec<String> = get("CORS_ORIGINS")
            .unwrap_or_else(|| "http://localhost:3000".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        for origin in &cors_origins {
            axum::http::HeaderValue::from_str(origin)
                .map_err(|e| invalid("CORS_ORIGINS", origin, &e.to_string()))?;
        }

        let log_dir = PathBuf::from(get("LOG_DIR").unwrap_or_else(|| "logs".into()));
        let static_root = PathBuf::from(get("STATIC_ROOT").unwrap_or_else(|| "staticfiles".into()));

        let trusted_proxies = match get("TRUSTED_PROXIES") {
            Some(raw) => raw
                .parse()
                .map_err(|e: ccw_core::client_ip::TrustedProxyParseError| {
                    invalid("TRUSTED_PROXIES", &raw, &e.to_string())
                })?,
            None => TrustedProxies::default(),
        };

        let url = get("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;
        let database = DatabaseConfig {
            connect: connect_options(&get, &url)?,
            url,
            max_connections: parse_or(
                &get,
                "DB_MAX_CONNECTIONS",
                ccw_db::DEFAULT_MAX_CONNECTIONS,
            )?,
            wait_host: get("POSTGRES_HOST"),
            wait_port: parse_opt(&get, "POSTGRES_PORT")?,
            wait_timeout_secs: parse_opt::<u64, _>(&get, "DB_WAIT_TIMEOUT_SECS")?
                .filter(|secs| *secs > 0),
        };

        let jwt = JwtConfig::from_lookup(&get)?;

        let proxy = ProxyConfig {
            upstream_url: get("OPENAI_PROXY_URL").map(|u| u.trim_end_matches('/').to_string()),
            api_key: get("OPENAI_PROXY_API_KEY"),
            post_rate: {
                let raw = get("OPENAI_PROXY_RATE").unwrap_or_else(|| DEFAULT_PROXY_RATE.into());
                raw.parse()
                    .map_err(|e: ccw_core::rate_limit::RateParseError| {
                        invalid("OPENAI_PROXY_RATE", &raw, &e.to_string())
                    })?
            },
        };

        Ok(Self {
            host,
            port,
            workers,
            request_timeout_secs,
            tcp_keepalive,
            listen_backlog,
            cors_origins,
            log_dir,
            static_root,
            trusted_proxies,
            database,
            jwt,
            proxy,
        })
    }
}

/// Resolve `DATABASE_URL` into pool connect options.
fn connect_options<F>(get: &F, url: &str) -> Result<PgConnectOptions, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if url != BARE_ENGINE {
        // The URL may carry a password, so it stays out of the error.
        return PgConnectOptions::from_str(url)
            .map_err(|e| invalid("DATABASE_URL", "<redacted>", &e.to_string()));
    }

    let host = get("POSTGRES_HOST").unwrap_or_else(|| "localhost".into());
    let database = get("POSTGRES_DB").unwrap_or_else(|| "postgres".into());
    let username = get("POSTGRES_USER").unwrap_or_else(|| "postgres".into());

    let options = PgConnectOptions::new_without_pgpass()
        .port(parse_or(get, "POSTGRES_PORT", 5432u16)?)
        .database(&database)
        .username(&username);
    let options = if host.starts_with('/') {
        options.socket(&host)
    } else {
        options.host(&host)
    };

    Ok(match get("POSTGRES_PASSWORD") {
        Some(password) => options.password(&password),
        None => options,
    })
}

pub(crate) fn invalid(key: &'static str, value: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        key,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Parse `key` if present, otherwise return `default`.
pub(crate) fn parse_or<T, F>(get: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    Ok(parse_opt(get, key)?.unwrap_or(default))
}

/// Parse `key` if present.
pub(crate) fn parse_opt<T, F>(get: &F, key: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    get(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|e| invalid(key, &raw, &e.to_string()))
        })
        .transpose()
}
