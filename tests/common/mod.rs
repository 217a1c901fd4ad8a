//! Shared utilities for integration testing.

use std::io::{Read, Write};
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream};
use std::sync::mpsc::{self, Receiver};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use forward_proxy::http::reader::read_headers;
use forward_proxy::net::AcceptReport;
use forward_proxy::security::FilterList;
use forward_proxy::{ProxyConfig, Server};

/// A loopback origin that answers every connection with the same raw bytes.
pub struct MockOrigin {
    pub addr: SocketAddr,
    requests: Receiver<Vec<u8>>,
}

impl MockOrigin {
    /// Start an origin that serves `connections` clients, then stops.
    pub fn start(response: &'static [u8], connections: usize) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, requests) = mpsc::channel();

        thread::spawn(move || {
            for _ in 0..connections {
                let Ok((mut socket, _)) = listener.accept() else { break };
                let Ok(request) = read_headers(&mut socket, 1024) else { continue };
                let _ = socket.write_all(response);
                let _ = socket.shutdown(Shutdown::Both);
                if tx.send(request).is_err() {
                    break;
                }
            }
        });

        Self { addr, requests }
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Next request the origin received, byte for byte.
    pub fn next_request_bytes(&self) -> Option<Vec<u8>> {
        self.requests.recv_timeout(Duration::from_secs(5)).ok()
    }

    /// Next request the origin received, as text.
    pub fn next_request(&self) -> Option<String> {
        self.next_request_bytes()
            .map(|raw| String::from_utf8_lossy(&raw).into_owned())
    }

    /// True when no request arrives within a short grace period.
    pub fn saw_nothing(&self) -> bool {
        self.requests.recv_timeout(Duration::from_millis(200)).is_err()
    }
}

/// A proxy running on its own thread, bound to an ephemeral loopback port.
pub struct ProxyHarness {
    pub addr: SocketAddr,
    handle: JoinHandle<AcceptReport>,
}

impl ProxyHarness {
    pub fn start(filter: &str, max_requests: usize) -> Self {
        Self::start_with(filter, max_requests, |_| {})
    }

    /// Start with extra config tweaks applied before binding.
    pub fn start_with(filter: &str, max_requests: usize, tweak: impl FnOnce(&mut ProxyConfig)) -> Self {
        let mut config = ProxyConfig::default();
        config.listener.bind_ip = "127.0.0.1".into();
        config.listener.port = 0;
        config.pool.threads = 4;
        config.limits.max_requests = max_requests;
        tweak(&mut config);

        let server = Server::with_filter(&config, FilterList::parse(filter)).unwrap();
        let addr = server.local_addr().unwrap();
        let handle = thread::spawn(move || server.run());

        Self { addr, handle }
    }

    /// Wait for the proxy to accept its last connection and drain.
    pub fn join(self) -> AcceptReport {
        self.handle.join().unwrap()
    }
}

/// Send raw bytes to `addr` and read until the peer closes.
pub fn send_raw(addr: SocketAddr, request: &[u8]) -> Vec<u8> {
    let mut stream = TcpStream::connect(addr).unwrap();
    stream.set_read_timeout(Some(Duration::from_secs(10))).unwrap();
    stream.write_all(request).unwrap();

    let mut response = Vec::new();
    let _ = stream.read_to_end(&mut response);
    response
}

pub fn send_text(addr: SocketAddr, request: &str) -> String {
    String::from_utf8_lossy(&send_raw(addr, request.as_bytes())).into_owned()
}
