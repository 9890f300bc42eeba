//! Client address extractor.

use std::convert::Infallible;
use std::net::{IpAddr, SocketAddr};

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::request::Parts;
use ccw_core::client_ip::resolve_client_ip;

use crate::state::AppState;

/// The originating client address.
///
/// This is the socket peer, unless the peer is listed in `TRUSTED_PROXIES`,
/// in which case `X-Forwarded-For` and `X-Real-IP` are consulted.
///
/// `None` only when there is no connection info (e.g. requests driven
/// directly through the router in tests).
#[derive(Debug, Clone, Copy)]
pub struct ClientIp(pub Option<IpAddr>);

impl FromRequestParts<AppState> for ClientIp {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = |name: &str| parts.headers.get(name).and_then(|v| v.to_str().ok());
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip());

        Ok(ClientIp(resolve_client_ip(
            header("x-forwarded-for"),
            header("x-real-ip"),
            peer,
            &state.config.trusted_proxies,
        )))
    }
}
