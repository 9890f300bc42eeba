//! Reverse proxy to an OpenAI-compatible upstream.
//!
//! Requests are forwarded once (no retries) with hop-by-hop headers removed
//! in both directions. Response bodies are streamed back so server-sent
//! event completions reach the client as they are produced.

use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::http::header::{self, HeaderName, HeaderValue};
use axum::http::{HeaderMap, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use futures::TryStreamExt;
use serde_json::json;

use crate::config::ProxyConfig;

/// Header carrying the authenticated username to the upstream.
pub const REMOTE_USER_HEADER: &str = "remote_user";

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Headers that describe a single connection and must not be forwarded.
const HOP_BY_HOP: [&str; 9] = [
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "trailers",
    "transfer-encoding",
    "upgrade",
];

#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error("Upstream proxy is not configured")]
    NotConfigured,

    #[error("Rate limit exceeded; retry in {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Invalid proxied request: {0}")]
    InvalidRequest(String),

    #[error("Upstream request failed: {0}")]
    Upstream(#[from] reqwest::Error),
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ProxyError::NotConfigured => (StatusCode::SERVICE_UNAVAILABLE, "PROXY_NOT_CONFIGURED"),
            ProxyError::RateLimited { .. } => (StatusCode::TOO_MANY_REQUESTS, "RATE_LIMITED"),
            ProxyError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            ProxyError::Upstream(err) if err.is_timeout() => {
                (StatusCode::GATEWAY_TIMEOUT, "UPSTREAM_TIMEOUT")
            }
            ProxyError::Upstream(_) => (StatusCode::BAD_GATEWAY, "UPSTREAM_UNAVAILABLE"),
        };

        if let ProxyError::Upstream(err) = &self {
            tracing::error!(error = %err, "Upstream proxy request failed");
        }

        let body = json!({ "error": self.to_string(), "code": code });
        let mut response = (status, axum::Json(body)).into_response();

        if let ProxyError::RateLimited { retry_after_secs } = self {
            if let Ok(value) = HeaderValue::from_str(&retry_after_secs.to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }
        response
    }
}

/// One inbound request, reduced to what the upstream needs.
#[derive(Debug)]
pub struct ProxiedRequest<'a> {
    pub method: Method,
    /// Path below the proxy mount point, without a leading slash.
    pub path: &'a str,
    pub query: Option<&'a str>,
    pub headers: &'a HeaderMap,
    pub body: Bytes,
    /// Username to announce upstream, for authenticated callers.
    pub remote_user: Option<&'a str>,
    /// Drop the inbound `Authorization` header (it held this service's token).
    pub strip_authorization: bool,
}

/// HTTP client bound to the configured upstream.
pub struct UpstreamProxy {
    client: reqwest::Client,
    upstream: Option<String>,
    api_key: Option<String>,
}

impl UpstreamProxy {
    pub fn from_config(config: &ProxyConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            upstream: config.upstream_url.clone(),
            api_key: config.api_key.clone(),
        })
    }

    pub fn is_configured(&self) -> bool {
        self.upstream.is_some()
    }

    /// Build the upstream URL for a proxied path.
    ///
    /// Rejects `.` and `..` segments so a request cannot climb above the
    /// upstream base path.
    pub fn upstream_url(&self, path: &str, query: Option<&str>) -> Result<String, ProxyError> {
        let base = self.upstream.as_deref().ok_or(ProxyError::NotConfigured)?;
        if path.split('/').any(|seg| seg == ".." || seg == ".") {
            return Err(ProxyError::InvalidRequest(
                "path must not contain relative segments".into(),
            ));
        }

        let mut url = format!("{base}/{}", path.trim_start_matches('/'));
        if let Some(q) = query.filter(|q| !q.is_empty()) {
            url.push('?');
            url.push_str(q);
        }
        Ok(url)
    }

    /// Forward a request and stream the upstream response back.
    pub async fn forward(&self, request: ProxiedRequest<'_>) -> Result<Response, ProxyError> {
        let url = self.upstream_url(request.path, request.query)?;

        let mut headers = filter_request_headers(request.headers, request.strip_authorization);
        if let Some(key) = &self.api_key {
            let value = HeaderValue::from_str(&format!("Bearer {key}"))
                .map_err(|_| ProxyError::InvalidRequest("invalid upstream API key".into()))?;
            headers.insert(header::AUTHORIZATION, value);
        }
        if let Some(user) = request.remote_user {
            if let Ok(value) = HeaderValue::from_str(user) {
                headers.insert(HeaderName::from_static(REMOTE_USER_HEADER), value);
            }
        }

        tracing::debug!(method = %request.method, %url, "Forwarding request upstream");

        let upstream = self
            .client
            .request(request.method, &url)
            .headers(headers)
            .body(request.body)
            .send()
            .await?;

        let status = upstream.status();
        let headers = filter_response_headers(upstream.headers());

        let stream = upstream.bytes_stream().inspect_err(|e| {
            tracing::warn!(error = %e, "Upstream response stream ended with an error");
        });

        let mut response = Response::new(Body::from_stream(stream));
        *response.status_mut() = status;
        *response.headers_mut() = headers;
        Ok(response)
    }
}

/// Whether a header is connection-scoped and must not cross the proxy.
pub fn is_hop_by_hop(name: &HeaderName) -> bool {
    HOP_BY_HOP.contains(&name.as_str())
}

/// Inbound headers safe to send upstream.
///
/// Besides hop-by-hop headers this drops `Host` and `Content-Length` (set by
/// the client for the new request) and any client-supplied `REMOTE_USER`,
/// which only this service may assert.
pub fn filter_request_headers(inbound: &HeaderMap, strip_authorization: bool) -> HeaderMap {
    let mut out = HeaderMap::with_capacity(inbound.len());
    for (name, value) in inbound {
        if is_hop_by_hop(name)
            || name == header::HOST
            || name == header::CONTENT_LENGTH
            || name.as_str() == REMOTE_USER_HEADER
            || (strip_authorization && name == header::AUTHORIZATION)
        {
            continue;
        }
        out.append(name.clone(), value.clone());
    }
    out
}

/// Upstream response headers safe to return to the client.
///
/// `Content-Length` is dropped because the body is re-streamed.
pub fn filter_response_headers(upstream: &HeaderMap) -> HeaderMap {
    let mut out = HeaderMap::with_capacity(upstream.len());
    for (name, value) in upstream {
        if is_hop_by_hop(name) || name == header::CONTENT_LENGTH {
            continue;
        }
        out.append(name.clone(), value.clone());
    }
    out
}
