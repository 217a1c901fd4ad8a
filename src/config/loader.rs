//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use crate::config::schema::ProxyConfig;
use crate::config::validation::ValidationError;

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Read and deserialize a TOML file without validating it.
///
/// CLI overrides are applied on top, then `validate_config` runs on the merged result.
pub fn read_config(path: &Path) -> Result<ProxyConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: ProxyConfig = toml::from_str(&content)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::validation::validate_config;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_temp(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn loads_full_document() {
        let file = write_temp(
            r#"
            [listener]
            bind_ip = "127.0.0.1"
            port = 3128

            [pool]
            threads = 8

            [limits]
            max_requests = 50

            [filter]
            path = "/etc/proxy/filter.txt"

            [observability]
            log_format = "json"
            "#,
        );

        let config = read_config(file.path()).unwrap();
        assert_eq!(config.listener.port, 3128);
        assert_eq!(config.pool.threads, 8);
        assert_eq!(config.limits.max_requests, 50);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = read_config(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn malformed_toml_is_parse_error() {
        let file = write_temp("[pool\nthreads = ");
        assert!(matches!(read_config(file.path()), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn semantic_problems_are_validation_errors() {
        let file = write_temp("[pool]\nthreads = 0\n");
        let config = read_config(file.path()).unwrap();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.len() >= 2);
    }
}
