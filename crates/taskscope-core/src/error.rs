use core::result::Result as CoreResult;
use std::io::Error as IoError;

use serde_json::Error as SerdeJsonError;
use thiserror::Error;
use toml::de::Error as TomlError;

/// Result type for fallible taskscope operations.
pub type Result<T> = CoreResult<T, Error>;

/// Errors raised by configuration loading, wire encoding and the debug server.
///
/// Registry, propagation, snapshot and tree operations never fail; they degrade
/// to "nothing happened" or an empty result instead.
#[derive(Debug, Error)]
pub enum Error {
    /// An I/O operation failed (reading config, binding or serving the endpoint).
    #[error("IO error: {0}")]
    Io(#[from] IoError),

    /// JSON encoding or decoding of snapshots failed.
    #[error("JSON serialization error: {0}")]
    Json(#[from] SerdeJsonError),

    /// TOML deserialization failed.
    #[error("TOML deserialization error: {0}")]
    Toml(#[from] TomlError),

    /// Configuration is invalid.
    #[error("Configuration error: {0}")]
    Config(String),
}
