//! Request validation and destination routing.
//!
//! # Responsibilities
//! - Check the request line (three bounded tokens, GET, HTTP/1.0 or 1.1)
//! - Require a Host header
//! - Run the host filter and resolve the destination
//! - Extract the destination port
//!
//! # Check Order
//! ```text
//! Host present? ──no──▶ 400
//! request line well formed, version 1.0/1.1? ──no──▶ 400
//! request starts with "GET "? ──no──▶ 501
//! host resolves? ──no──▶ 404
//! host filtered? ──yes──▶ 403
//! port valid? ──no──▶ 500
//! ```
//! The first failing check decides the response; later checks never run.

use std::net::{Ipv4Addr, SocketAddrV4};

use crate::http::request::RequestHead;
use crate::http::response::ErrorKind;
use crate::net::resolve::{clean_host, ResolveError};
use crate::security::access_control::{FilterList, FilterVerdict};
use crate::security::limits::{
    MAX_METHOD_LEN, MAX_TARGET_LEN, MAX_VERSION_LEN, REQUIRED_METHOD_PREFIX, SUPPORTED_VERSIONS,
};

const DEFAULT_PORT: u16 = 80;

/// Why a request is refused.
#[derive(Debug, thiserror::Error)]
pub enum RouteError {
    #[error("request has no Host header")]
    MissingHost,

    #[error("request line is not 'METHOD TARGET VERSION'")]
    MalformedRequestLine,

    #[error("request line token too long: {field} is {len} bytes, limit {max}")]
    TokenTooLong {
        field: &'static str,
        len: usize,
        max: usize,
    },

    #[error("unsupported HTTP version {0:?}")]
    UnsupportedVersion(String),

    #[error("method {0:?} is not supported")]
    MethodNotSupported(String),

    #[error("host {host:?} could not be resolved: {source}")]
    Unresolvable {
        host: String,
        #[source]
        source: ResolveError,
    },

    #[error("host {host:?} ({addr}) is blocked by filter rule {rule}")]
    Filtered {
        host: String,
        addr: Ipv4Addr,
        rule: String,
    },

    #[error("invalid port in host {0:?}")]
    InvalidPort(String),
}

impl RouteError {
    /// Error response sent to the client for this refusal.
    pub fn error_kind(&self) -> ErrorKind {
        match self {
            RouteError::MissingHost
            | RouteError::MalformedRequestLine
            | RouteError::TokenTooLong { .. }
            | RouteError::UnsupportedVersion(_) => ErrorKind::BadRequest,
            RouteError::MethodNotSupported(_) => ErrorKind::NotImplemented,
            RouteError::Unresolvable { .. } => ErrorKind::NotFound,
            RouteError::Filtered { .. } => ErrorKind::Forbidden,
            RouteError::InvalidPort(_) => ErrorKind::Internal,
        }
    }
}

/// A validated request's destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    /// Host header value as received.
    pub host: String,
    /// Host without scheme, `www.` prefix or port.
    pub clean_host: String,
    /// Address the cleaned host resolved to (and was filtered against).
    pub addr: Ipv4Addr,
    pub port: u16,
}

impl Route {
    pub fn socket_addr(&self) -> SocketAddrV4 {
        SocketAddrV4::new(self.addr, self.port)
    }
}

/// Validate the request head and decide where it goes.
pub fn route_request(head: &RequestHead, filter: &FilterList) -> Result<Route, RouteError> {
    let host = head.host().ok_or(RouteError::MissingHost)?;

    let line = head
        .request_line_parts()
        .ok_or(RouteError::MalformedRequestLine)?;
    check_len("method", line.method, MAX_METHOD_LEN)?;
    check_len("target", line.target, MAX_TARGET_LEN)?;
    check_len("version", line.version, MAX_VERSION_LEN)?;

    if !SUPPORTED_VERSIONS.contains(&line.version) {
        return Err(RouteError::UnsupportedVersion(line.version.to_string()));
    }

    // Byte-exact: a leading space or a tab after the method is not GET.
    if !head.request_line().starts_with(REQUIRED_METHOD_PREFIX) {
        return Err(RouteError::MethodNotSupported(line.method.to_string()));
    }

    let addr = match filter.is_filtered(host) {
        Ok(FilterVerdict::Allowed(addr)) => addr,
        Ok(FilterVerdict::Blocked { addr, rule }) => {
            return Err(RouteError::Filtered {
                host: host.to_string(),
                addr,
                rule: rule.to_string(),
            })
        }
        Err(source) => {
            return Err(RouteError::Unresolvable {
                host: host.to_string(),
                source,
            })
        }
    };

    let port = port_of(host).ok_or_else(|| RouteError::InvalidPort(host.to_string()))?;

    Ok(Route {
        host: host.to_string(),
        clean_host: clean_host(host).to_string(),
        addr,
        port,
    })
}

fn check_len(field: &'static str, token: &str, max: usize) -> Result<(), RouteError> {
    if token.len() > max {
        return Err(RouteError::TokenTooLong {
            field,
            len: token.len(),
            max,
        });
    }
    Ok(())
}

/// Port from a trailing `:NNNN` in the Host value; 80 when absent.
///
/// Returns `None` when the port text is not a number in `0..=65535`.
pub fn port_of(host: &str) -> Option<u16> {
    let host = host.strip_prefix("http://").unwrap_or(host);
    match host.split_once(':') {
        None => Some(DEFAULT_PORT),
        Some((_, "")) => Some(DEFAULT_PORT),
        Some((_, port)) => port.parse().ok(),
    }
}
