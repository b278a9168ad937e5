//! Viewer error types.

use core::result::Result as CoreResult;
use std::io::Error as IoError;

use reqwest::{Error as ReqwestError, StatusCode};
use taskscope_core::Error as CoreError;
use thiserror::Error;

/// Result type for viewer operations.
pub type Result<T> = CoreResult<T, ViewerError>;

/// Errors raised while fetching or interpreting snapshots.
#[derive(Debug, Error)]
pub enum ViewerError {
    /// The endpoint could not be reached.
    #[error("request failed: {0}")]
    Request(#[from] ReqwestError),

    /// The endpoint answered with a non-success status.
    #[error("unexpected status: {0}")]
    Status(StatusCode),

    /// The response body was not a snapshot array.
    #[error("invalid snapshot payload: {0}")]
    Decode(#[from] CoreError),

    /// Writing to the terminal failed.
    #[error("terminal error: {0}")]
    Io(#[from] IoError),

    /// A duration argument could not be parsed.
    #[error("invalid duration {0:?} (expected e.g. 500ms, 2s, 1.5m)")]
    InvalidDuration(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let status_error = ViewerError::Status(StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            status_error.to_string(),
            "unexpected status: 503 Service Unavailable"
        );

        let duration_error = ViewerError::InvalidDuration("soon".to_owned());
        assert!(duration_error.to_string().contains("\"soon\""));
    }
}
