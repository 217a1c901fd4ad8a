//! Upstream relay.
//!
//! # Responsibilities
//! - Force `Connection: close` on the outgoing request
//! - Connect to the routed origin and send the request verbatim
//! - Stream the response back to the client chunk by chunk
//!
//! # Design Decisions
//! - Pure byte relay: the response is never parsed or buffered beyond one chunk
//! - Each chunk is fully written to the client before the next read
//! - The upstream socket is owned by `relay` and closed when it returns, on every path

use std::io::{self, Read, Write};
use std::net::{SocketAddrV4, TcpStream};

use crate::http::request::RequestHead;
use crate::http::response::ErrorKind;
use crate::routing::Route;

/// Error type for the relay stage.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: SocketAddrV4,
        #[source]
        source: io::Error,
    },

    #[error("failed to send request upstream: {0}")]
    UpstreamWrite(#[source] io::Error),

    #[error("failed to read upstream response: {0}")]
    UpstreamRead(#[source] io::Error),

    #[error("failed to write response to client: {0}")]
    ClientWrite(#[source] io::Error),
}

impl RelayError {
    /// Response to attempt on the client socket, if any.
    ///
    /// A failed connect sends nothing; every later failure is a 500.
    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            RelayError::Connect { .. } => None,
            RelayError::UpstreamWrite(_)
            | RelayError::UpstreamRead(_)
            | RelayError::ClientWrite(_) => Some(ErrorKind::Internal),
        }
    }
}

/// Rewrite, forward and relay one request. Returns the number of response bytes relayed.
pub fn relay<W: Write>(
    route: &Route,
    mut head: RequestHead,
    client: &mut W,
    chunk_size: usize,
) -> Result<u64, RelayError> {
    head.force_connection_close();
    let request = head.to_bytes();
    drop(head);

    let addr = route.socket_addr();
    let mut upstream =
        TcpStream::connect(addr).map_err(|source| RelayError::Connect { addr, source })?;

    tracing::debug!(upstream = %addr, bytes = request.len(), "Forwarding request");

    forward_request(&mut upstream, &request)?;
    relay_response(&mut upstream, client, chunk_size)
}

/// Write the whole request to the upstream socket.
pub fn forward_request<W: Write>(upstream: &mut W, request: &[u8]) -> Result<(), RelayError> {
    upstream
        .write_all(request)
        .and_then(|()| upstream.flush())
        .map_err(RelayError::UpstreamWrite)
}

/// Copy the upstream response to the client until upstream closes.
pub fn relay_response<R: Read, W: Write>(
    upstream: &mut R,
    client: &mut W,
    chunk_size: usize,
) -> Result<u64, RelayError> {
    let mut chunk = vec![0u8; chunk_size.max(1)];
    let mut total = 0u64;

    loop {
        let n = match upstream.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(RelayError::UpstreamRead(e)),
        };

        client
            .write_all(&chunk[..n])
            .map_err(RelayError::ClientWrite)?;
        total += n as u64;
    }

    client.flush().map_err(RelayError::ClientWrite)?;
    Ok(total)
}
