//! # CLI Error Types
//!
//! Configuration errors. Everything else in the binary is reported through
//! `anyhow` with context.

use std::path::PathBuf;

use offer_core::ValidationError;
use thiserror::Error;

/// Configuration loading and validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file exists but could not be read or written.
    #[error("Config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// `config init` found a file and was not told to replace it.
    #[error("Config file {path} already exists (use --force to overwrite)")]
    AlreadyExists { path: PathBuf },

    /// The config file is not valid TOML for [`DeskConfig`](crate::config::DeskConfig).
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// The config could not be written back as TOML.
    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// A value is out of range or malformed.
    #[error("Invalid configuration: {0}")]
    Invalid(#[from] ValidationError),
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
