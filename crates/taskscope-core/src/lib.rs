//! In-process task instrumentation.
//!
//! Register named units of concurrent work, track their lifecycle, and
//! export a live parent/child view of every task for an external viewer.
//!
//! ```
//! use taskscope_core::{Carrier, Registry, attach, build_tree};
//!
//! let registry = Registry::new();
//! let (request, _) = attach(&registry, &Carrier::root(), "request");
//! let (query, _) = attach(&registry, &request, "query");
//! query.done();
//!
//! let roots = build_tree(registry.snapshot());
//! assert_eq!(roots.len(), 1);
//! assert_eq!(roots[0].children.len(), 1);
//! ```
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

/// Configuration for the registry and debug endpoint.
pub mod config;
/// Parent/child propagation through carriers.
pub mod context;
/// Error types and result definitions.
pub mod error;
/// Slow and leak filters over snapshots.
pub mod filter;
/// The concurrent task registry.
pub mod registry;
/// HTTP debug endpoint.
pub mod server;
/// Point-in-time export.
pub mod snapshot;
mod sync;
/// Task records and states.
pub mod task;
/// Forest reconstruction.
pub mod tree;

pub use config::{RetentionConfig, ServerConfig, TaskscopeConfig};
pub use context::{Carrier, attach, attach_current, resolve};
pub use error::{Error, Result};
pub use registry::{Registry, RetentionPolicy};
pub use snapshot::Snapshot;
pub use task::{Task, TaskHandle, TaskId, TaskState};
pub use tree::{TreeNode, build_tree};
