//! Startup orchestration.
//!
//! # Responsibilities
//! - Initialize subsystems in dependency order
//! - Bind the listener last (traffic only when ready)
//! - Run the accept loop, then shut the pool down
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Order: worker pool → filter list → metrics exporter → listener
//! - Shutdown waits for every dispatched connection to finish

use std::net::SocketAddr;
use std::sync::Arc;

use crate::config::ProxyConfig;
use crate::http::server::HandlerSettings;
use crate::net::{AcceptReport, Acceptor, Listener, ListenerError};
use crate::observability::metrics;
use crate::security::{FilterError, FilterList};
use crate::worker::{PoolError, WorkerPool};

/// Error type for startup failures.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error(transparent)]
    Pool(#[from] PoolError),

    #[error(transparent)]
    Filter(#[from] FilterError),

    #[error(transparent)]
    Listener(#[from] ListenerError),

    #[error("invalid metrics address {address:?}: {source}")]
    MetricsAddress {
        address: String,
        #[source]
        source: std::net::AddrParseError,
    },
}

/// A fully initialized proxy that has not started accepting yet.
#[derive(Debug)]
pub struct Server {
    listener: Listener,
    pool: WorkerPool,
    filter: Arc<FilterList>,
    settings: HandlerSettings,
    max_requests: usize,
}

impl Server {
    /// Start the worker pool, load the filter list and bind the listener.
    pub fn bind(config: &ProxyConfig) -> Result<Self, StartupError> {
        let pool = WorkerPool::new(config.pool.threads)?;
        let filter = FilterList::load(&config.filter.path)?;
        Self::with_parts(config, pool, filter)
    }

    /// Like [`Server::bind`], with an already parsed filter list.
    pub fn with_filter(config: &ProxyConfig, filter: FilterList) -> Result<Self, StartupError> {
        let pool = WorkerPool::new(config.pool.threads)?;
        Self::with_parts(config, pool, filter)
    }

    fn with_parts(
        config: &ProxyConfig,
        pool: WorkerPool,
        filter: FilterList,
    ) -> Result<Self, StartupError> {
        let observability = &config.observability;
        if observability.metrics_enabled {
            let addr: SocketAddr = observability.metrics_address.parse().map_err(|source| {
                StartupError::MetricsAddress {
                    address: observability.metrics_address.clone(),
                    source,
                }
            })?;
            metrics::init_metrics(addr);
        }

        let listener = Listener::bind(&config.listener)?;

        Ok(Self {
            listener,
            pool,
            filter: Arc::new(filter),
            settings: HandlerSettings::from(&config.limits),
            max_requests: config.limits.max_requests,
        })
    }

    /// Address the listener is bound to.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept up to the configured number of connections, then drain and stop the pool.
    pub fn run(self) -> AcceptReport {
        tracing::info!(
            workers = self.pool.size(),
            max_requests = self.max_requests,
            filter_rules = self.filter.len(),
            "Proxy accepting connections"
        );
        if self.filter.is_empty() {
            tracing::info!("Filter list is empty, every resolvable host is allowed");
        }

        let report = Acceptor::new(
            &self.listener,
            &self.pool,
            Arc::clone(&self.filter),
            self.settings,
        )
        .run(self.max_requests);

        self.pool.stop_accepting();
        drop(self.listener);
        self.pool.shutdown();

        tracing::info!(
            accepted = report.accepted,
            dispatched = report.dispatched,
            "Shutdown complete"
        );
        report
    }
}

/// Build the server from `config` and run it to completion.
pub fn run(config: &ProxyConfig) -> Result<AcceptReport, StartupError> {
    let server = Server::bind(config)?;
    Ok(server.run())
}
