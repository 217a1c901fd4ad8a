//! Forwarding HTTP/1.x proxy.
//!
//! # Architecture Overview
//!
//! ```text
//!                  ┌───────────────────────────────────────────────────────┐
//!                  │                    FORWARD PROXY                      │
//!                  │                                                       │
//!   Client         │  ┌──────────┐  dispatch  ┌─────────────┐              │
//!   ───────────────┼─▶│ acceptor │───────────▶│ worker pool │              │
//!                  │  └──────────┘            └──────┬──────┘              │
//!                  │                                 │ one task per conn   │
//!                  │                                 ▼                     │
//!                  │  ┌────────┐   ┌─────────┐   ┌────────┐   ┌────────┐   │
//!                  │  │ reader │──▶│ request │──▶│ router │──▶│ filter │   │
//!                  │  └────────┘   └─────────┘   └────────┘   └───┬────┘   │
//!                  │                                              │        │
//!   Client         │  ┌──────────────┐        ┌───────┐           │        │   Origin
//!   ◀──────────────┼──│ error / data │◀───────│ relay │◀──────────┘────────┼──▶ Server
//!                  │  └──────────────┘        └───────┘                    │
//!                  └───────────────────────────────────────────────────────┘
//! ```

use std::process::ExitCode;

use clap::Parser;

use forward_proxy::config::Cli;
use forward_proxy::lifecycle;
use forward_proxy::net::AcceptEnd;
use forward_proxy::observability::logging;

fn main() -> ExitCode {
    // Malformed arguments print usage and exit with status 2.
    let cli = Cli::parse();
    let print_config = cli.print_config;

    let config = match cli.into_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("forward-proxy: {}", e);
            eprintln!("usage: forward-proxy <port> <pool-size> <max-number-of-request> <filter>");
            return ExitCode::FAILURE;
        }
    };

    if print_config {
        return match serde_json::to_string_pretty(&config) {
            Ok(json) => {
                println!("{}", json);
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("forward-proxy: failed to serialize configuration: {}", e);
                ExitCode::FAILURE
            }
        };
    }

    logging::init(&config.observability);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        port = config.listener.port,
        workers = config.pool.threads,
        max_requests = config.limits.max_requests,
        filter = %config.filter.path.display(),
        "forward-proxy starting"
    );

    match lifecycle::run(&config) {
        Ok(report) => {
            if let AcceptEnd::Failed(_) = report.end {
                tracing::warn!(accepted = report.accepted, "Stopped early after accept failure");
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Startup failed");
            eprintln!("forward-proxy: {}", e);
            ExitCode::FAILURE
        }
    }
}
