//! The concurrent task registry.
//!
//! Tasks live in a fixed set of `RwLock<HashMap>` shards selected by id. A
//! scan read-locks one shard at a time, so exporting never blocks insertion
//! into the other shards and never observes a half-inserted entry. There is
//! no public delete: under the default [`RetentionPolicy::KeepAll`] every task
//! stays visible for the life of the registry, which is what makes leak
//! detection possible.

use core::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tracing::{debug, warn};

use crate::config::TaskscopeConfig;
use crate::snapshot::{self, Snapshot};
use crate::sync::IgnorePoison as _;
use crate::task::{Task, TaskHandle, TaskId};

const SHARD_COUNT: usize = 16;

type Shard = RwLock<HashMap<TaskId, TaskHandle>>;

/// How many finished tasks the registry keeps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RetentionPolicy {
    /// Never remove anything
    #[default]
    KeepAll,
    /// Once more than this many completed tasks are held, evict the oldest
    /// completed ones on the next insert. Running and idle tasks are never
    /// evicted.
    MaxCompleted(usize),
}

/// Concurrent store of every task created while enabled.
#[derive(Debug)]
pub struct Registry {
    shards: Box<[Shard]>,
    next_id: AtomicU64,
    len: AtomicUsize,
    /// Completed tasks currently held; shared with every task.
    completed: Arc<AtomicUsize>,
    eviction_scans: AtomicUsize,
    enabled: AtomicBool,
    retention: RetentionPolicy,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    /// Creates an enabled registry that keeps every task.
    pub fn new() -> Self {
        Self {
            shards: (0..SHARD_COUNT).map(|_| Shard::default()).collect(),
            next_id: AtomicU64::new(1),
            len: AtomicUsize::new(0),
            completed: Arc::default(),
            eviction_scans: AtomicUsize::new(0),
            enabled: AtomicBool::new(true),
            retention: RetentionPolicy::KeepAll,
        }
    }

    /// Creates a registry from configuration.
    pub fn from_config(config: &TaskscopeConfig) -> Self {
        let registry = Self::new().with_retention(config.retention.policy());
        registry.enabled.store(config.enabled, Ordering::Release);
        registry
    }

    /// Sets the retention policy.
    #[must_use]
    pub fn with_retention(mut self, retention: RetentionPolicy) -> Self {
        self.retention = retention;
        self
    }

    /// Wraps the registry for sharing across threads and the debug server.
    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// Turns tracking on. Existing tasks are kept.
    pub fn enable(&self) {
        self.enabled.store(true, Ordering::Release);
    }

    /// Turns tracking off. Existing tasks are kept but hidden from export.
    pub fn disable(&self) {
        self.enabled.store(false, Ordering::Release);
    }

    /// Whether tracking is on.
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    /// Active retention policy.
    pub const fn retention(&self) -> RetentionPolicy {
        self.retention
    }

    /// Number of tasks held.
    pub fn len(&self) -> usize {
        self.len.load(Ordering::Acquire)
    }

    /// Number of completed tasks held.
    pub fn completed_len(&self) -> usize {
        self.completed.load(Ordering::Acquire)
    }

    /// Whether no task is held.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Looks up a task by id.
    pub fn get(&self, id: TaskId) -> Option<TaskHandle> {
        self.shard(id).read_ignore_poison().get(&id).cloned()
    }

    /// Point-in-time copies of every task; empty while disabled.
    pub fn snapshot(&self) -> Vec<Snapshot> {
        snapshot::export(self)
    }

    /// Visits every task, one shard at a time.
    ///
    /// Tasks inserted during the visit may or may not be seen.
    pub fn for_each<Visit>(&self, mut visit: Visit)
    where
        Visit: FnMut(&Task),
    {
        for shard in &self.shards {
            let guard = shard.read_ignore_poison();
            for task in guard.values() {
                visit(task);
            }
        }
    }

    /// Allocates the next id and stores a new running task.
    pub(crate) fn register(&self, name: String, parent_id: TaskId) -> TaskHandle {
        let id = TaskId::new(self.next_id.fetch_add(1, Ordering::Relaxed));
        let task = Arc::new(Task::new(
            id,
            name,
            parent_id,
            Arc::clone(&self.completed),
        ));

        self.shard(id)
            .write_ignore_poison()
            .insert(id, Arc::clone(&task));
        self.len.fetch_add(1, Ordering::AcqRel);
        debug!(task = %id, parent = %parent_id, name = %task.name(), "task registered");

        if let RetentionPolicy::MaxCompleted(limit) = self.retention
            && self.completed_len() > limit
        {
            self.evict_completed(limit);
        }

        task
    }

    /// Removes the oldest completed tasks until at most `limit` remain.
    fn evict_completed(&self, limit: usize) {
        self.eviction_scans.fetch_add(1, Ordering::Relaxed);
        let mut completed = Vec::new();
        self.for_each(|task| {
            if task.is_completed() {
                completed.push(task.id());
            }
        });
        if completed.len() <= limit {
            return;
        }

        completed.sort_unstable();
        let excess = completed.len() - limit;
        let mut evicted = 0usize;
        for id in completed.into_iter().take(excess) {
            if self.shard(id).write_ignore_poison().remove(&id).is_some() {
                evicted += 1;
            }
        }
        self.len.fetch_sub(evicted, Ordering::AcqRel);
        self.completed.fetch_sub(evicted, Ordering::AcqRel);
        warn!(evicted, limit, "evicted completed tasks over retention limit");
    }

    fn shard(&self, id: TaskId) -> &Shard {
        let index = (id.get() % self.shards.len() as u64) as usize;
        &self.shards[index]
    }
}
