//! Terminal viewer for the taskscope debug endpoint.
//!
//! Polls the JSON snapshot array a process serves and renders it as a
//! table, a hierarchy, or the slow and leaked subsets.
#![cfg_attr(
    test,
    allow(
        clippy::expect_used,
        clippy::unwrap_used,
        clippy::panic,
        clippy::missing_panics_doc,
        reason = "Test allows"
    )
)]

pub mod cli;
pub mod client;
pub mod commands;
pub mod duration;
pub mod error;
pub mod render;

pub use cli::{Cli, Command, Endpoint};
pub use error::{Result, ViewerError};
