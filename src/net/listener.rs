//! TCP listener.
//!
//! # Responsibilities
//! - Bind to the configured address
//! - Accept incoming TCP connections one at a time

use std::net::{SocketAddr, TcpListener, TcpStream};

use crate::config::ListenerConfig;

/// Error type for listener operations.
#[derive(Debug, thiserror::Error)]
pub enum ListenerError {
    #[error("invalid bind address {address:?}: {source}")]
    Address {
        address: String,
        #[source]
        source: std::net::AddrParseError,
    },

    #[error("failed to bind: {0}")]
    Bind(#[source] std::io::Error),

    #[error("failed to accept: {0}")]
    Accept(#[source] std::io::Error),
}

/// A blocking TCP listener.
#[derive(Debug)]
pub struct Listener {
    inner: TcpListener,
}

impl Listener {
    /// Bind to the configured address.
    pub fn bind(config: &ListenerConfig) -> Result<Self, ListenerError> {
        let address = config.bind_address();
        let addr: SocketAddr = address
            .parse()
            .map_err(|source| ListenerError::Address { address, source })?;

        let inner = TcpListener::bind(addr).map_err(ListenerError::Bind)?;
        let local_addr = inner.local_addr().map_err(ListenerError::Bind)?;

        tracing::info!(address = %local_addr, "Listener bound");

        Ok(Self { inner })
    }

    /// Block until the next client connects.
    pub fn accept(&self) -> Result<(TcpStream, SocketAddr), ListenerError> {
        let (stream, addr) = self.inner.accept().map_err(ListenerError::Accept)?;
        tracing::debug!(peer_addr = %addr, "Connection accepted");
        Ok((stream, addr))
    }

    /// Get the local address this listener is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, std::io::Error> {
        self.inner.local_addr()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loopback(port: u16) -> ListenerConfig {
        ListenerConfig {
            bind_ip: "127.0.0.1".into(),
            port,
        }
    }

    #[test]
    fn binds_ephemeral_port_and_accepts() {
        let listener = Listener::bind(&loopback(0)).unwrap();
        let addr = listener.local_addr().unwrap();
        assert_ne!(addr.port(), 0);

        let _client = TcpStream::connect(addr).unwrap();
        let (_stream, peer) = listener.accept().unwrap();
        assert!(peer.ip().is_loopback());
    }

    #[test]
    fn port_in_use_is_bind_error() {
        let first = Listener::bind(&loopback(0)).unwrap();
        let taken = first.local_addr().unwrap().port();

        assert!(matches!(
            Listener::bind(&loopback(taken)),
            Err(ListenerError::Bind(_))
        ));
    }

    #[test]
    fn bad_ip_is_address_error() {
        let config = ListenerConfig {
            bind_ip: "not-an-ip".into(),
            port: 8080,
        };
        assert!(matches!(
            Listener::bind(&config),
            Err(ListenerError::Address { .. })
        ));
    }
}
