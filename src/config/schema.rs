//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::observability::logging::LogFormat;

/// Root configuration for the forwarding proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address, port).
    pub listener: ListenerConfig,

    /// Worker pool sizing.
    pub pool: PoolConfig,

    /// Per-connection limits and buffer sizes.
    pub limits: LimitsConfig,

    /// Host filter list location.
    pub filter: FilterConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// IP address to bind (e.g., "0.0.0.0").
    pub bind_ip: String,

    /// TCP port to listen on. 0 picks an ephemeral port.
    pub port: u16,
}

impl ListenerConfig {
    /// `ip:port` string suitable for parsing into a socket address.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.bind_ip, self.port)
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_ip: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

/// Worker pool configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Number of worker threads.
    pub threads: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self { threads: 4 }
    }
}

/// Per-connection limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Number of connections to accept before the process exits.
    pub max_requests: usize,

    /// Receive timeout while waiting for the request head, in seconds.
    pub header_read_timeout_secs: u64,

    /// Initial capacity of the request head buffer (doubles on demand).
    pub initial_buffer_size: usize,

    /// Chunk size used when relaying the upstream response.
    pub relay_chunk_size: usize,
}

impl LimitsConfig {
    pub fn header_read_timeout(&self) -> Duration {
        Duration::from_secs(self.header_read_timeout_secs)
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_requests: 100,
            header_read_timeout_secs: 5,
            initial_buffer_size: 4096,
            relay_chunk_size: 4096,
        }
    }
}

/// Filter list configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct FilterConfig {
    /// Path to the filter file (one hostname or `ip[/mask]` per line).
    pub path: PathBuf,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log line format.
    pub log_format: LogFormat,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
