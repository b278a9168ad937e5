//! Executes a parsed viewer command against a debug endpoint.

use std::time::Duration;

use chrono::Local;
use console::Term;
use reqwest::Client;
use taskscope_core::filter::{leaks, slow};
use tokio::time::sleep;
use tracing::{debug, info};

use crate::cli::Command;
use crate::client::{build_client, fetch_snapshots};
use crate::error::Result;
use crate::render::{header, render_leaks, render_list, render_slow, render_tree};

/// Runs `command`, writing its view to `term`.
///
/// # Errors
/// Returns an error if the endpoint cannot be polled or the terminal cannot
/// be written.
pub async fn run(command: Command, term: &Term) -> Result<()> {
    let client = build_client()?;
    match command {
        Command::List(endpoint) => {
            let snapshots = fetch_snapshots(&client, &endpoint.addr).await?;
            emit(term, &render_list(&snapshots))
        }
        Command::Tree {
            endpoint,
            watch,
            interval,
        } => run_tree(&client, &endpoint.addr, watch, interval, term).await,
        Command::Slow {
            endpoint,
            threshold,
        } => {
            let snapshots = fetch_snapshots(&client, &endpoint.addr).await?;
            emit(term, &render_slow(&slow(&snapshots, threshold)))
        }
        Command::Leaks(endpoint) => {
            let snapshots = fetch_snapshots(&client, &endpoint.addr).await?;
            emit(term, &render_leaks(&leaks(&snapshots)))
        }
    }
}

/// Renders the tree once, or redraws it every `interval` until a poll fails.
async fn run_tree(
    client: &Client,
    addr: &str,
    watch: bool,
    interval: Duration,
    term: &Term,
) -> Result<()> {
    if watch {
        info!(addr, ?interval, "watching task tree");
    }
    loop {
        let snapshots = fetch_snapshots(client, addr).await?;
        if watch && term.is_term() {
            term.clear_screen()?;
        }
        emit(term, &render_tree(snapshots))?;

        if !watch {
            return Ok(());
        }
        debug!(?interval, "waiting for next redraw");
        sleep(interval).await;
    }
}

fn emit(term: &Term, body: &str) -> Result<()> {
    term.write_str(&header(Local::now()))?;
    term.write_str(body)?;
    term.flush()?;
    Ok(())
}
