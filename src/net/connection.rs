//! Per-connection state and teardown.
//!
//! # Responsibilities
//! - Generate unique connection IDs for tracing
//! - Own the client socket and everything derived for one request
//! - Release the socket exactly once, when the context is dropped

use std::net::{Shutdown, SocketAddr, TcpStream};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::routing::Route;
use crate::security::FilterList;

/// Relaxed ordering is enough: IDs only need to be unique.
static CONNECTION_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    pub fn new() -> Self {
        Self(CONNECTION_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Everything one accepted connection needs on its worker thread.
///
/// The context is moved into the task; dropping it closes the client socket
/// and releases the request state, whichever way handling ended.
#[derive(Debug)]
pub struct ConnectionContext {
    id: ConnectionId,
    peer: SocketAddr,
    client: TcpStream,
    filter: Arc<FilterList>,
    route: Option<Route>,
}

impl ConnectionContext {
    pub fn new(client: TcpStream, peer: SocketAddr, filter: Arc<FilterList>) -> Self {
        Self {
            id: ConnectionId::new(),
            peer,
            client,
            filter,
            route: None,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    pub fn client(&mut self) -> &mut TcpStream {
        &mut self.client
    }

    pub fn filter(&self) -> &FilterList {
        &self.filter
    }

    /// Destination chosen for this connection's request, once routed.
    pub fn route(&self) -> Option<&Route> {
        self.route.as_ref()
    }

    pub fn set_route(&mut self, route: Route) {
        self.route = Some(route);
    }
}

impl Drop for ConnectionContext {
    fn drop(&mut self) {
        // NotConnected just means the peer already went away.
        let _ = self.client.shutdown(Shutdown::Both);
        tracing::trace!(
            connection_id = %self.id,
            peer = %self.peer,
            host = self.route().map(|r| r.host.as_str()),
            "Connection closed"
        );
    }
}
