//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)      CLI positionals
//!     → loader.rs (parse & deserialize)  → cli.rs (overrides)
//!     → validation.rs (semantic checks)
//!     → ProxyConfig (validated, immutable)
//!     → handed to lifecycle::startup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod cli;
pub mod loader;
pub mod schema;
pub mod validation;

pub use cli::Cli;
pub use loader::{read_config, ConfigError};
pub use schema::{
    FilterConfig, LimitsConfig, ListenerConfig, ObservabilityConfig, PoolConfig, ProxyConfig,
};
pub use validation::{validate_config, ValidationError};
