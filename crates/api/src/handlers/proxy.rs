//! Handler for the OpenAI-compatible reverse proxy.

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, HeaderName, HeaderValue, Method, Uri};
use axum::response::Response;
use ccw_core::rate_limit::{Rate, RateDecision};

use crate::middleware::auth::{AuthUser, MaybeAuthUser};
use crate::middleware::client_ip::ClientIp;
use crate::proxy::{ProxiedRequest, ProxyError};
use crate::state::AppState;

const RATE_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
const RATE_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");

/// Key for the POST budget: the user id when authenticated, else the
/// client address.
pub fn rate_key(user: Option<&AuthUser>, ip: ClientIp) -> String {
    match (user, ip.0) {
        (Some(user), _) => format!("user:{}", user.user_id),
        (None, Some(ip)) => format!("ip:{ip}"),
        (None, None) => "anonymous".to_string(),
    }
}

/// ANY /api/openai/{*path}
///
/// Forwards the request once. A bearer token issued by this service
/// identifies the caller and is not passed on; any other `Authorization`
/// header is left for the upstream. Admitted POSTs report their budget in
/// `X-RateLimit-Limit` / `X-RateLimit-Remaining`.
#[allow(clippy::too_many_arguments)]
pub async fn forward(
    State(state): State<AppState>,
    MaybeAuthUser(user): MaybeAuthUser,
    client_ip: ClientIp,
    Path(path): Path<String>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ProxyError> {
    if !state.proxy.is_configured() {
        return Err(ProxyError::NotConfigured);
    }

    let budget = if method == Method::POST {
        let key = rate_key(user.as_ref(), client_ip);
        let decision = state.proxy_limiter.check(&key);
        if !decision.allowed {
            tracing::warn!(target: "security", %key, path = %path, "Proxy rate limit exceeded");
            return Err(ProxyError::RateLimited {
                retry_after_secs: decision.reset_after_secs,
            });
        }
        Some(decision)
    } else {
        None
    };

    let mut response = state
        .proxy
        .forward(ProxiedRequest {
            method,
            path: &path,
            query: uri.query(),
            headers: &headers,
            body,
            remote_user: user.as_ref().map(|u| u.username.as_str()),
            strip_authorization: user.is_some(),
        })
        .await?;

    if let Some(decision) = budget {
        add_budget_headers(&mut response, state.proxy_limiter.rate(), decision);
    }
    Ok(response)
}

fn add_budget_headers(response: &mut Response, rate: Rate, decision: RateDecision) {
    let headers = response.headers_mut();
    headers.insert(RATE_LIMIT, HeaderValue::from(rate.limit));
    headers.insert(RATE_REMAINING, HeaderValue::from(decision.remaining));
}
