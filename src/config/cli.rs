//! Command-line arguments.
//!
//! `forward-proxy <port> <pool-size> <max-number-of-request> <filter>`, optionally
//! layered on top of a TOML file given with `--config`.

use std::path::PathBuf;

use clap::Parser;

use crate::config::loader::{read_config, ConfigError};
use crate::config::schema::ProxyConfig;
use crate::config::validation::validate_config;

#[derive(Debug, Parser)]
#[command(name = "forward-proxy")]
#[command(about = "Forwarding HTTP/1.x proxy with host filtering", long_about = None)]
pub struct Cli {
    /// Port to listen on.
    #[arg(required_unless_present = "config")]
    pub port: Option<u16>,

    /// Number of worker threads.
    #[arg(required_unless_present = "config")]
    pub pool_size: Option<usize>,

    /// Number of connections to accept before exiting.
    #[arg(required_unless_present = "config")]
    pub max_requests: Option<usize>,

    /// Filter file: one hostname or `ip[/mask]` per line.
    #[arg(required_unless_present = "config")]
    pub filter: Option<PathBuf>,

    /// TOML configuration file; positional arguments override it.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Print the effective configuration as JSON and exit.
    #[arg(long)]
    pub print_config: bool,
}

impl Cli {
    /// Merge the optional config file with positional overrides and validate the result.
    pub fn into_config(self) -> Result<ProxyConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => read_config(path)?,
            None => ProxyConfig::default(),
        };

        if let Some(port) = self.port {
            config.listener.port = port;
        }
        if let Some(threads) = self.pool_size {
            config.pool.threads = threads;
        }
        if let Some(max_requests) = self.max_requests {
            config.limits.max_requests = max_requests;
        }
        if let Some(filter) = self.filter {
            config.filter.path = filter;
        }

        validate_config(&config).map_err(ConfigError::Validation)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn positional_arguments_fill_config() {
        let cli = Cli::try_parse_from(["forward-proxy", "3128", "8", "20", "filter.txt"]).unwrap();
        let config = cli.into_config().unwrap();

        assert_eq!(config.listener.port, 3128);
        assert_eq!(config.pool.threads, 8);
        assert_eq!(config.limits.max_requests, 20);
        assert_eq!(config.filter.path, PathBuf::from("filter.txt"));
    }

    #[test]
    fn positionals_required_without_config_file() {
        assert!(Cli::try_parse_from(["forward-proxy", "3128", "8"]).is_err());
    }

    #[test]
    fn rejects_port_out_of_range() {
        assert!(Cli::try_parse_from(["forward-proxy", "70000", "8", "20", "f"]).is_err());
    }

    #[test]
    fn invalid_pool_size_fails_validation() {
        let cli = Cli::try_parse_from(["forward-proxy", "3128", "0", "20", "filter.txt"]).unwrap();
        assert!(matches!(cli.into_config(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn positionals_override_config_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[pool]\nthreads = 2\n[filter]\npath = \"from-file.txt\"").unwrap();
        let path = file.path().to_string_lossy().to_string();

        let cli = Cli::try_parse_from(["forward-proxy", "--config", &path]).unwrap();
        let config = cli.into_config().unwrap();
        assert_eq!(config.pool.threads, 2);
        assert_eq!(config.filter.path, PathBuf::from("from-file.txt"));

        let cli = Cli::try_parse_from(["forward-proxy", "--config", &path, "9000", "6", "5", "cli.txt"])
            .unwrap();
        let config = cli.into_config().unwrap();
        assert_eq!(config.listener.port, 9000);
        assert_eq!(config.pool.threads, 6);
        assert_eq!(config.filter.path, PathBuf::from("cli.txt"));
    }
}
