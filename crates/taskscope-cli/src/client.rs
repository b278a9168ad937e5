//! Fetching snapshots from a debug endpoint.

use std::time::Duration;

use reqwest::Client;
use taskscope_core::Snapshot;
use taskscope_core::snapshot::from_json;
use tracing::debug;

use crate::error::{Result, ViewerError};

/// Per-request timeout for endpoint polls.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Builds the HTTP client used for every poll.
///
/// # Errors
/// Returns an error if the TLS backend cannot be initialized.
pub fn build_client() -> Result<Client> {
    Ok(Client::builder().timeout(REQUEST_TIMEOUT).build()?)
}

/// Fetches and decodes the snapshot array served at `addr`.
///
/// # Errors
/// Returns an error if the endpoint is unreachable, answers with a
/// non-success status, or serves something other than a snapshot array.
pub async fn fetch_snapshots(client: &Client, addr: &str) -> Result<Vec<Snapshot>> {
    debug!(addr, "polling debug endpoint");
    let response = client.get(addr).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(ViewerError::Status(status));
    }

    let body = response.text().await?;
    let snapshots = from_json(&body)?;
    debug!(count = snapshots.len(), "decoded snapshots");
    Ok(snapshots)
}
