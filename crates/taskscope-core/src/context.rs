//! Parent/child linkage through immutable carriers.
//!
//! A [`Carrier`] is a persistent value: deriving a child carrier allocates a
//! new frame pointing at the parent's frame and never touches the parent, so
//! any number of flows can fan out from the same carrier concurrently.
//!
//! Carriers can be threaded explicitly or installed ambiently for a future
//! with [`Carrier::scope`] and read back with [`Carrier::current`].

use core::future::Future;
use std::iter;
use std::sync::Arc;

use tokio::task::futures::TaskLocalFuture;
use tokio::task_local;
use tracing::debug;

use crate::registry::Registry;
use crate::task::{TaskHandle, TaskId};

task_local! {
    static CURRENT: Carrier;
}

/// Execution-scoped value through which the current task propagates.
#[derive(Debug, Clone, Default)]
pub struct Carrier {
    frame: Option<Arc<Frame>>,
}

#[derive(Debug)]
struct Frame {
    task: TaskHandle,
    parent: Option<Arc<Frame>>,
}

impl Carrier {
    /// A carrier with no bound task.
    pub const fn root() -> Self {
        Self { frame: None }
    }

    /// Task bound to this carrier, if any.
    pub fn task(&self) -> Option<&TaskHandle> {
        self.frame.as_ref().map(|frame| &frame.task)
    }

    /// Id of the bound task, or [`TaskId::ROOT`] when unbound.
    pub fn id(&self) -> TaskId {
        self.task().map_or(TaskId::ROOT, |task| task.id())
    }

    /// Whether a task is bound.
    pub const fn is_bound(&self) -> bool {
        self.frame.is_some()
    }

    /// Ids from the bound task up through each enclosing carrier.
    pub fn ancestry(&self) -> Vec<TaskId> {
        iter::successors(self.frame.as_deref(), |&frame| frame.parent.as_deref())
            .map(|frame| frame.task.id())
            .collect()
    }

    /// Marks the bound task active; no-op when unbound.
    pub fn mark_active(&self) {
        if let Some(task) = self.task() {
            task.mark_active();
        }
    }

    /// Marks the bound task idle; no-op when unbound.
    pub fn mark_idle(&self) {
        if let Some(task) = self.task() {
            task.mark_idle();
        }
    }

    /// Completes the bound task; no-op when unbound.
    pub fn done(&self) {
        if let Some(task) = self.task() {
            task.done();
        }
    }

    /// Runs `future` with this carrier installed as the ambient carrier.
    pub fn scope<Fut>(self, future: Fut) -> TaskLocalFuture<Self, Fut>
    where
        Fut: Future,
    {
        CURRENT.scope(self, future)
    }

    /// Runs `func` with this carrier installed as the ambient carrier.
    pub fn sync_scope<Func, Output>(self, func: Func) -> Output
    where
        Func: FnOnce() -> Output,
    {
        CURRENT.sync_scope(self, func)
    }

    /// The ambient carrier, or [`Carrier::root`] outside any scope.
    pub fn current() -> Self {
        CURRENT.try_with(Self::clone).unwrap_or_default()
    }

    fn derive(&self, task: TaskHandle) -> Self {
        Self {
            frame: Some(Arc::new(Frame {
                task,
                parent: self.frame.clone(),
            })),
        }
    }
}

/// Creates a task under `carrier` and returns a carrier bound to it.
///
/// The new task's parent is the task bound to `carrier` (or none). While the
/// registry is disabled nothing is created and `carrier` comes back unchanged.
pub fn attach(
    registry: &Registry,
    carrier: &Carrier,
    name: impl Into<String>,
) -> (Carrier, Option<TaskHandle>) {
    if !registry.is_enabled() {
        return (carrier.clone(), None);
    }

    let task = registry.register(name.into(), carrier.id());
    (carrier.derive(Arc::clone(&task)), Some(task))
}

/// Task bound to `carrier`, if any.
pub fn resolve(carrier: &Carrier) -> Option<TaskHandle> {
    carrier.task().cloned()
}

/// [`attach`] under the ambient carrier.
pub fn attach_current(
    registry: &Registry,
    name: impl Into<String>,
) -> (Carrier, Option<TaskHandle>) {
    let (carrier, task) = attach(registry, &Carrier::current(), name);
    if let Some(task) = &task {
        debug!(task = %task.id(), parent = %task.parent_id(), "attached under ambient carrier");
    }
    (carrier, task)
}
