//! Error types for peerbind-config.

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors that can occur while loading a project configuration.
#[derive(Error, Debug, Diagnostic)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("Failed to read config file {}: {source}", .path.display())]
    #[diagnostic(code(peerbind::config::read))]
    ReadConfig {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse TOML configuration.
    #[error("Failed to parse TOML config: {0}")]
    #[diagnostic(code(peerbind::config::toml))]
    ParseToml(#[from] toml::de::Error),

    /// Configuration validation error.
    #[error("Config validation error: {0}")]
    #[diagnostic(code(peerbind::config::invalid))]
    Validation(String),
}
