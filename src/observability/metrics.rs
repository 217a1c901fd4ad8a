//! Metrics collection and exposition.
//!
//! # Metrics
//! - `proxy_connections_accepted_total` (counter)
//! - `proxy_responses_total` (counter): by `status` (`relayed` or the error code)
//! - `proxy_relayed_bytes_total` (counter): response bytes sent to clients
//! - `proxy_request_duration_seconds` (histogram): task wall time
//! - `proxy_tasks_completed_total` / `proxy_task_panics_total` (counters)
//! - `proxy_queue_depth` (gauge): tasks waiting for a worker

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_connection_accepted() {
    metrics::counter!("proxy_connections_accepted_total").increment(1);
}

/// Record the outcome of one connection task.
pub fn record_response(status: &'static str, start: Instant) {
    metrics::counter!("proxy_responses_total", "status" => status).increment(1);
    metrics::histogram!("proxy_request_duration_seconds", "status" => status)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_relayed_bytes(bytes: u64) {
    metrics::counter!("proxy_relayed_bytes_total").increment(bytes);
}

pub fn record_task_completed() {
    metrics::counter!("proxy_tasks_completed_total").increment(1);
}

pub fn record_task_panic() {
    metrics::counter!("proxy_task_panics_total").increment(1);
}

pub fn set_queue_depth(depth: usize) {
    metrics::gauge!("proxy_queue_depth").set(depth as f64);
}
