//! Per-connection request handling.
//!
//! # Responsibilities
//! - Run the whole read → validate → relay pipeline for one connection
//! - Translate every failure into at most one error response
//! - Log and count the outcome inside a per-connection span
//!
//! # Pipeline
//! ```text
//! set receive timeout
//!     → reader.rs (bytes up to \r\n\r\n)         fail: 500
//!     → request.rs (tokenize head)               incomplete: 500, bad request line: 400
//!     → routing (host, line, method, filter, port)  400/501/404/403/500
//!     → relay.rs (Connection: close, forward, stream back)
//!                                                connect fail: nothing, later: 500
//! ```
//! The connection context is dropped when the pipeline returns, which
//! closes the client socket on every path.

use std::time::{Duration, Instant};

use crate::config::LimitsConfig;
use crate::http::reader::read_headers;
use crate::http::relay::relay;
use crate::http::request::{ParseError, RequestHead};
use crate::http::response::{send_error, ErrorKind};
use crate::net::connection::ConnectionContext;
use crate::observability::metrics;
use crate::routing::route_request;

/// Tunables applied to every connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandlerSettings {
    pub header_read_timeout: Duration,
    pub initial_buffer_size: usize,
    pub relay_chunk_size: usize,
}

impl From<&LimitsConfig> for HandlerSettings {
    fn from(limits: &LimitsConfig) -> Self {
        Self {
            header_read_timeout: limits.header_read_timeout(),
            initial_buffer_size: limits.initial_buffer_size,
            relay_chunk_size: limits.relay_chunk_size,
        }
    }
}

impl Default for HandlerSettings {
    fn default() -> Self {
        Self::from(&LimitsConfig::default())
    }
}

/// How a connection ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Upstream response relayed in full.
    Relayed { bytes: u64 },
    /// An error response was attempted.
    Refused(ErrorKind),
    /// Upstream unreachable; the client gets nothing.
    Dropped,
}

impl Outcome {
    /// `status` label for metrics.
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Relayed { .. } => "relayed",
            Outcome::Refused(kind) => kind.metric_label(),
            Outcome::Dropped => "dropped",
        }
    }
}

/// Serve one accepted connection to completion. Consumes (and so closes) the context.
pub fn handle_connection(mut ctx: ConnectionContext, settings: HandlerSettings) -> Outcome {
    let start = Instant::now();
    let span = tracing::info_span!("connection", id = %ctx.id(), peer = %ctx.peer());
    let _enter = span.enter();

    let outcome = serve(&mut ctx, &settings);

    match outcome {
        Outcome::Relayed { bytes } => {
            tracing::debug!(bytes, elapsed_ms = start.elapsed().as_millis() as u64, "Response relayed");
        }
        Outcome::Refused(kind) => {
            tracing::debug!(status = kind.status_code(), "Error response sent");
        }
        Outcome::Dropped => {
            tracing::debug!("Connection dropped without response");
        }
    }
    metrics::record_response(outcome.label(), start);

    outcome
}

fn serve(ctx: &mut ConnectionContext, settings: &HandlerSettings) -> Outcome {
    if let Err(e) = ctx.client().set_read_timeout(Some(settings.header_read_timeout)) {
        tracing::warn!(error = %e, "Failed to set receive timeout");
        return refuse(ctx, ErrorKind::Internal);
    }

    let raw = match read_headers(ctx.client(), settings.initial_buffer_size) {
        Ok(raw) => raw,
        Err(e) => {
            tracing::debug!(error = %e, "Failed to read request head");
            return refuse(ctx, ErrorKind::Internal);
        }
    };

    let head = match RequestHead::parse(&raw) {
        Ok(head) => head,
        Err(e) => {
            tracing::debug!(error = %e, "Unparsable request head");
            let kind = match e {
                ParseError::Incomplete => ErrorKind::Internal,
                ParseError::InvalidRequestLine => ErrorKind::BadRequest,
            };
            return refuse(ctx, kind);
        }
    };
    drop(raw);

    let route = match route_request(&head, ctx.filter()) {
        Ok(route) => route,
        Err(e) => {
            tracing::info!(request = %head, error = %e, "Request refused");
            return refuse(ctx, e.error_kind());
        }
    };

    tracing::info!(
        request = %head,
        host = %route.host,
        upstream = %route.socket_addr(),
        "Forwarding request"
    );
    ctx.set_route(route.clone());

    match relay(&route, head, ctx.client(), settings.relay_chunk_size) {
        Ok(bytes) => {
            metrics::record_relayed_bytes(bytes);
            Outcome::Relayed { bytes }
        }
        Err(e) => match e.error_kind() {
            Some(kind) => {
                tracing::warn!(host = %route.host, error = %e, "Relay failed");
                refuse(ctx, kind)
            }
            None => {
                tracing::warn!(host = %route.host, error = %e, "Upstream unreachable");
                Outcome::Dropped
            }
        },
    }
}

fn refuse(ctx: &mut ConnectionContext, kind: ErrorKind) -> Outcome {
    send_error(ctx.client(), kind);
    Outcome::Refused(kind)
}
