//! Command-line arguments for the taskscope viewer.

use std::time::Duration;

use clap::{Args, Parser, Subcommand};

use crate::duration::parse_duration;

/// Debug endpoint polled when `--addr` and `TASKSCOPE_ADDR` are absent.
pub const DEFAULT_ADDR: &str = "http://localhost:7070/debug/obs";

/// Inspect the tasks of a running process.
#[derive(Debug, Parser)]
#[command(name = "taskscope", version, about)]
pub struct Cli {
    /// View to render
    #[command(subcommand)]
    pub command: Command,
}

/// Viewer subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Table of every task
    List(Endpoint),
    /// Task hierarchy, longest-running first
    Tree {
        /// Endpoint to poll
        #[command(flatten)]
        endpoint: Endpoint,
        /// Keep redrawing until interrupted
        #[arg(long)]
        watch: bool,
        /// Redraw interval for --watch (e.g. 500ms, 2s)
        #[arg(long, default_value = "1s", value_parser = parse_duration)]
        interval: Duration,
    },
    /// Unfinished tasks running longer than a threshold
    Slow {
        /// Endpoint to poll
        #[command(flatten)]
        endpoint: Endpoint,
        /// Duration threshold (e.g. 2s, 500ms)
        #[arg(long, default_value = "2s", value_parser = parse_duration)]
        threshold: Duration,
    },
    /// Unfinished tasks older than 30s
    Leaks(Endpoint),
}

/// Where to fetch snapshots from.
#[derive(Debug, Clone, Args)]
pub struct Endpoint {
    /// Debug endpoint URL
    #[arg(long, env = "TASKSCOPE_ADDR", default_value = DEFAULT_ADDR)]
    pub addr: String,
}
