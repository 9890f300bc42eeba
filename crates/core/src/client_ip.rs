//! Client IP resolution for requests that arrive through a reverse proxy.
//!
//! Forwarding headers are only believed when the socket peer is a known
//! proxy. Anyone else could write arbitrary addresses into them.

use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

use ipnet::IpNet;

/// Networks whose `X-Forwarded-For` / `X-Real-IP` headers are honoured.
///
/// Parsed from a comma-separated list of CIDR ranges or single addresses,
/// e.g. `10.0.0.0/8, 172.17.0.1`. The empty list trusts nobody.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrustedProxies(Vec<IpNet>);

impl TrustedProxies {
    pub fn contains(&self, ip: IpAddr) -> bool {
        self.0.iter().any(|net| net.contains(&ip))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("'{0}' is neither an IP address nor a CIDR range")]
pub struct TrustedProxyParseError(pub String);

impl FromStr for TrustedProxies {
    type Err = TrustedProxyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(|entry| {
                entry
                    .parse::<IpNet>()
                    .or_else(|_| entry.parse::<IpAddr>().map(IpNet::from))
                    .map_err(|_| TrustedProxyParseError(entry.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }
}

impl fmt::Display for TrustedProxies {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entries: Vec<String> = self.0.iter().map(ToString::to_string).collect();
        f.write_str(&entries.join(","))
    }
}

/// Resolve the originating client address.
///
/// An untrusted (or unknown) peer is taken at face value. Behind a trusted
/// peer, `X-Forwarded-For` is walked from the right and the first hop that
/// is not itself a trusted proxy wins; then `X-Real-IP`; then the peer.
/// Unparseable header values are skipped.
///
/// # Examples
///
/// ```
/// use std::net::IpAddr;
/// use ccw_core::client_ip::{resolve_client_ip, TrustedProxies};
///
/// let proxies: TrustedProxies = "10.0.0.0/8".parse().unwrap();
/// let peer: IpAddr = "10.0.0.2".parse().unwrap();
///
/// let ip = resolve_client_ip(Some("203.0.113.9, 10.0.0.1"), None, Some(peer), &proxies);
/// assert_eq!(ip, Some("203.0.113.9".parse().unwrap()));
///
/// let direct: IpAddr = "198.51.100.4".parse().unwrap();
/// let ip = resolve_client_ip(Some("203.0.113.9"), None, Some(direct), &proxies);
/// assert_eq!(ip, Some(direct));
/// ```
pub fn resolve_client_ip(
    forwarded_for: Option<&str>,
    real_ip: Option<&str>,
    peer: Option<IpAddr>,
    trusted: &TrustedProxies,
) -> Option<IpAddr> {
    let peer = peer?;
    if !trusted.contains(peer) {
        return Some(peer);
    }

    forwarded_for
        .and_then(|value| first_untrusted_hop(value, trusted))
        .or_else(|| real_ip.and_then(parse_ip))
        .or(Some(peer))
}

fn first_untrusted_hop(forwarded_for: &str, trusted: &TrustedProxies) -> Option<IpAddr> {
    let hops: Vec<IpAddr> = forwarded_for.split(',').filter_map(parse_ip).collect();
    hops.iter()
        .rev()
        .find(|hop| !trusted.contains(**hop))
        .or_else(|| hops.first())
        .copied()
}

/// Parse a single address, tolerating surrounding whitespace.
pub fn parse_ip(raw: &str) -> Option<IpAddr> {
    raw.trim().parse().ok()
}
