//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (pool size, timeouts, buffer sizes)
//! - Validate addresses parse before anything binds
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::{IpAddr, SocketAddr};

use crate::config::schema::ProxyConfig;
use crate::worker::MAX_THREADS;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("pool.threads must be between 1 and {max}, got {got}")]
    PoolSize { got: usize, max: usize },

    #[error("limits.max_requests must be at least 1")]
    ZeroMaxRequests,

    #[error("limits.header_read_timeout_secs must be greater than 0")]
    ZeroHeaderTimeout,

    #[error("limits.{0} must be greater than 0")]
    ZeroBufferSize(&'static str),

    #[error("filter.path is empty")]
    MissingFilterPath,

    #[error("listener.bind_ip '{0}' is not an IP address")]
    InvalidBindIp(String),

    #[error("observability.metrics_address '{0}' is not a socket address")]
    InvalidMetricsAddress(String),
}

/// Check every semantic constraint, collecting all failures.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.pool.threads == 0 || config.pool.threads > MAX_THREADS {
        errors.push(ValidationError::PoolSize {
            got: config.pool.threads,
            max: MAX_THREADS,
        });
    }

    if config.limits.max_requests == 0 {
        errors.push(ValidationError::ZeroMaxRequests);
    }
    if config.limits.header_read_timeout_secs == 0 {
        errors.push(ValidationError::ZeroHeaderTimeout);
    }
    if config.limits.initial_buffer_size == 0 {
        errors.push(ValidationError::ZeroBufferSize("initial_buffer_size"));
    }
    if config.limits.relay_chunk_size == 0 {
        errors.push(ValidationError::ZeroBufferSize("relay_chunk_size"));
    }

    if config.filter.path.as_os_str().is_empty() {
        errors.push(ValidationError::MissingFilterPath);
    }

    if config.listener.bind_ip.parse::<IpAddr>().is_err() {
        errors.push(ValidationError::InvalidBindIp(config.listener.bind_ip.clone()));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> ProxyConfig {
        let mut config = ProxyConfig::default();
        config.filter.path = "filter.txt".into();
        config
    }

    #[test]
    fn accepts_valid_config() {
        assert!(validate_config(&valid_config()).is_ok());
    }

    #[test]
    fn reports_every_problem() {
        let mut config = valid_config();
        config.pool.threads = 0;
        config.limits.max_requests = 0;
        config.filter.path = "".into();
        config.listener.bind_ip = "not-an-ip".into();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 4);
        assert!(errors.contains(&ValidationError::ZeroMaxRequests));
        assert!(errors.contains(&ValidationError::MissingFilterPath));
    }

    #[test]
    fn pool_size_upper_bound() {
        let mut config = valid_config();
        config.pool.threads = MAX_THREADS;
        assert!(validate_config(&config).is_ok());

        config.pool.threads = MAX_THREADS + 1;
        assert_eq!(
            validate_config(&config).unwrap_err(),
            vec![ValidationError::PoolSize {
                got: MAX_THREADS + 1,
                max: MAX_THREADS
            }]
        );
    }

    #[test]
    fn metrics_address_only_checked_when_enabled() {
        let mut config = valid_config();
        config.observability.metrics_address = "nope".into();
        assert!(validate_config(&config).is_ok());

        config.observability.metrics_enabled = true;
        assert!(validate_config(&config).is_err());
    }
}
