//! Listener setup and the serve loop.

use std::net::{IpAddr, SocketAddr};

use anyhow::Context;
use axum::Router;
use tokio::net::{TcpListener, TcpSocket};

use crate::config::ServerConfig;

/// Bind `HOST:PORT` with the configured backlog and keepalive setting.
///
/// Must be called from within a tokio runtime.
pub fn bind_listener(config: &ServerConfig) -> anyhow::Result<TcpListener> {
    let ip: IpAddr = config
        .host
        .parse()
        .with_context(|| format!("Invalid HOST address '{}'", config.host))?;
    let addr = SocketAddr::new(ip, config.port);

    let socket = match addr {
        SocketAddr::V4(_) => TcpSocket::new_v4(),
        SocketAddr::V6(_) => TcpSocket::new_v6(),
    }
    .context("Failed to create listening socket")?;

    socket.set_reuseaddr(true)?;
    socket.set_keepalive(config.tcp_keepalive)?;
    socket
        .bind(addr)
        .with_context(|| format!("Failed to bind {addr}"))?;

    let listener = socket
        .listen(config.listen_backlog)
        .with_context(|| format!("Failed to listen on {addr}"))?;

    tracing::info!(
        addr = %listener.local_addr()?,
        backlog = config.listen_backlog,
        tcp_keepalive = config.tcp_keepalive,
        "Listening"
    );
    Ok(listener)
}

/// Serve `app` until SIGINT or SIGTERM, then drain in-flight requests.
pub async fn serve(listener: TcpListener, app: Router) -> anyhow::Result<()> {
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("Server error")?;

    tracing::info!("Graceful shutdown complete");
    Ok(())
}

/// Resolve when the process receives SIGINT (Ctrl-C) or, on Unix, SIGTERM.
///
/// If a handler cannot be installed that branch never resolves and the
/// other signal still works.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl-C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
