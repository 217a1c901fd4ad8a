//! Forwarding HTTP/1.x proxy library

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod routing;
pub mod security;
pub mod worker;

pub use config::schema::ProxyConfig;
pub use lifecycle::Server;
pub use worker::WorkerPool;
