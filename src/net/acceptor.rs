//! Accept loop.
//!
//! # Responsibilities
//! - Accept up to `max_requests` connections, one at a time
//! - Wrap each in a `ConnectionContext` and hand it to the worker pool
//! - Stop on the first accept failure

use std::sync::Arc;

use crate::http::server::{handle_connection, HandlerSettings};
use crate::net::connection::ConnectionContext;
use crate::net::listener::{Listener, ListenerError};
use crate::observability::metrics;
use crate::security::FilterList;
use crate::worker::WorkerPool;

/// Why the accept loop ended.
#[derive(Debug)]
pub enum AcceptEnd {
    /// The configured number of connections was reached.
    LimitReached,
    /// `accept` failed; no further connections are taken.
    Failed(ListenerError),
}

/// Summary of an accept loop run.
#[derive(Debug)]
pub struct AcceptReport {
    pub accepted: usize,
    pub dispatched: usize,
    pub end: AcceptEnd,
}

/// Feeds accepted connections to a worker pool.
#[derive(Debug)]
pub struct Acceptor<'a> {
    listener: &'a Listener,
    pool: &'a WorkerPool,
    filter: Arc<FilterList>,
    settings: HandlerSettings,
}

impl<'a> Acceptor<'a> {
    pub fn new(
        listener: &'a Listener,
        pool: &'a WorkerPool,
        filter: Arc<FilterList>,
        settings: HandlerSettings,
    ) -> Self {
        Self {
            listener,
            pool,
            filter,
            settings,
        }
    }

    /// Accept and dispatch until `max_requests` connections have been taken
    /// or `accept` fails. Returns without waiting for the tasks to finish.
    pub fn run(&self, max_requests: usize) -> AcceptReport {
        let mut accepted = 0;
        let mut dispatched = 0;

        while accepted < max_requests {
            let (stream, peer) = match self.listener.accept() {
                Ok(conn) => conn,
                Err(e) => {
                    tracing::error!(error = %e, accepted, "Accept failed, no longer accepting");
                    return AcceptReport {
                        accepted,
                        dispatched,
                        end: AcceptEnd::Failed(e),
                    };
                }
            };
            accepted += 1;
            metrics::record_connection_accepted();

            let ctx = ConnectionContext::new(stream, peer, Arc::clone(&self.filter));
            let connection_id = ctx.id();
            let settings = self.settings;

            if !self.pool.dispatch(move || {
                handle_connection(ctx, settings);
            }) {
                // The closure, and with it the client socket, was dropped.
                tracing::warn!(%connection_id, "Worker pool refused connection");
                continue;
            }

            dispatched += 1;
            tracing::trace!(%connection_id, peer_addr = %peer, dispatched, "Connection dispatched");
        }

        tracing::info!(accepted, dispatched, "Request limit reached");
        AcceptReport {
            accepted,
            dispatched,
            end: AcceptEnd::LimitReached,
        }
    }
}
