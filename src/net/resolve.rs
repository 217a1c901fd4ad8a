//! Hostname cleaning and IPv4 resolution.

use std::io;
use std::net::{Ipv4Addr, SocketAddr, ToSocketAddrs};

/// Error type for name resolution.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("empty host name")]
    EmptyHost,

    #[error("failed to resolve '{host}': {source}")]
    Lookup {
        host: String,
        #[source]
        source: io::Error,
    },

    #[error("'{host}' has no IPv4 address")]
    NoIpv4 { host: String },
}

/// Strip an `http://` scheme, a `www.` prefix and a trailing `:port` from a Host value.
///
/// ```
/// use forward_proxy::net::resolve::clean_host;
/// assert_eq!(clean_host("http://www.example.com:8080"), "example.com");
/// ```
pub fn clean_host(host: &str) -> &str {
    let host = host.strip_prefix("http://").unwrap_or(host);
    let host = host.strip_prefix("www.").unwrap_or(host);
    match host.find(':') {
        Some(colon) => &host[..colon],
        None => host,
    }
}

/// Resolve a (cleaned) host name to its first IPv4 address.
pub fn resolve_ipv4(host: &str) -> Result<Ipv4Addr, ResolveError> {
    if host.is_empty() {
        return Err(ResolveError::EmptyHost);
    }

    let addrs = (host, 0u16)
        .to_socket_addrs()
        .map_err(|source| ResolveError::Lookup {
            host: host.to_string(),
            source,
        })?;

    addrs
        .filter_map(|addr| match addr {
            SocketAddr::V4(v4) => Some(*v4.ip()),
            SocketAddr::V6(_) => None,
        })
        .next()
        .ok_or_else(|| ResolveError::NoIpv4 {
            host: host.to_string(),
        })
}
