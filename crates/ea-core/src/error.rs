//! Configuration error types.

use std::net::Ipv4Addr;
use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for configuration and discovery operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors raised while loading configuration or resolving an adapter.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unknown adapter: {0}")]
    UnknownAdapter(String),

    #[error("adapter {adapter}: address {address} is outside subnet {subnet}")]
    AddressOutsideSubnet {
        adapter: String,
        address: Ipv4Addr,
        subnet: String,
    },

    #[error("invalid subnet: {0}")]
    InvalidSubnet(String),

    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid discovery pattern: {0}")]
    Pattern(#[from] regex::Error),
}
