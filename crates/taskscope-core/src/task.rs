//! Task records and their lifecycle state machine.
//!
//! A [`Task`] is created once by the registry and then mutated in place by any
//! holder of its [`TaskHandle`]. Every mutable field is an independent atomic,
//! so state transitions never take a lock and readers never see a torn field.

use core::fmt;
use core::sync::atomic::{AtomicU8, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::debug;

/// Shared reference to a live task.
pub type TaskHandle = Arc<Task>;

/// Sentinel stored in `ended_nanos` while the task has not completed.
const NOT_ENDED: u64 = u64::MAX;

/// Identity of a task, unique for the lifetime of its registry.
///
/// Real ids start at 1; [`TaskId::ROOT`] (0) means "no parent".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(u64);

impl TaskId {
    /// Parent id of a task created without a bound parent.
    pub const ROOT: Self = Self(0);

    /// Wraps a raw id.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw id.
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Whether this is the root sentinel.
    pub const fn is_root(self) -> bool {
        self.0 == 0
    }
}

impl From<u64> for TaskId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Lifecycle state of a task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum TaskState {
    /// Actively doing work (initial state)
    #[default]
    Running,
    /// Alive but waiting
    Idle,
    /// Finished; terminal
    Completed,
}

impl TaskState {
    /// Wire label of the state.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Idle => "idle",
            Self::Completed => "completed",
        }
    }

    /// Parses a wire label. Unknown labels fall back to [`TaskState::Running`].
    pub fn from_label(label: &str) -> Self {
        match label {
            "idle" => Self::Idle,
            "completed" => Self::Completed,
            _ => Self::Running,
        }
    }

    const fn to_bits(self) -> u8 {
        match self {
            Self::Running => 0,
            Self::Idle => 1,
            Self::Completed => 2,
        }
    }

    const fn from_bits(bits: u8) -> Self {
        match bits {
            1 => Self::Idle,
            2 => Self::Completed,
            _ => Self::Running,
        }
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl Serialize for TaskState {
    fn serialize<Ser: Serializer>(&self, serializer: Ser) -> Result<Ser::Ok, Ser::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for TaskState {
    fn deserialize<De: Deserializer<'de>>(deserializer: De) -> Result<Self, De::Error> {
        let label = String::deserialize(deserializer)?;
        Ok(Self::from_label(&label))
    }
}

/// One tracked unit of concurrent work.
#[derive(Debug)]
pub struct Task {
    id: TaskId,
    name: String,
    parent_id: TaskId,
    started_at: Instant,
    started_wall: DateTime<Utc>,
    /// Nanoseconds from `started_at` to completion, or [`NOT_ENDED`].
    ended_nanos: AtomicU64,
    /// Nanoseconds from `started_at` to the last transition into `Running`.
    last_active_nanos: AtomicU64,
    state: AtomicU8,
    /// Registry-wide count of completed tasks, bumped on first completion.
    completions: Arc<AtomicUsize>,
}

impl Task {
    /// Creates a running task. Only the registry allocates ids, so this stays
    /// crate-private.
    pub(crate) fn new(
        id: TaskId,
        name: String,
        parent_id: TaskId,
        completions: Arc<AtomicUsize>,
    ) -> Self {
        Self {
            id,
            name,
            parent_id,
            started_at: Instant::now(),
            started_wall: Utc::now(),
            ended_nanos: AtomicU64::new(NOT_ENDED),
            last_active_nanos: AtomicU64::new(0),
            state: AtomicU8::new(TaskState::Running.to_bits()),
            completions,
        }
    }

    /// Task identity.
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Label supplied at creation.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Id of the task that was bound to the creating carrier, or [`TaskId::ROOT`].
    pub const fn parent_id(&self) -> TaskId {
        self.parent_id
    }

    /// Current state.
    pub fn state(&self) -> TaskState {
        TaskState::from_bits(self.state.load(Ordering::Acquire))
    }

    /// Whether [`Task::done`] has been called.
    pub fn is_completed(&self) -> bool {
        self.state() == TaskState::Completed
    }

    /// Wall-clock creation time.
    pub const fn started_at(&self) -> DateTime<Utc> {
        self.started_wall
    }

    /// Wall-clock completion time, if completed.
    pub fn ended_at(&self) -> Option<DateTime<Utc>> {
        match self.ended_nanos.load(Ordering::Acquire) {
            NOT_ENDED => None,
            nanos => Some(self.wall_at(nanos)),
        }
    }

    /// Wall-clock time of the most recent transition into `Running`.
    pub fn last_active_at(&self) -> DateTime<Utc> {
        self.wall_at(self.last_active_nanos.load(Ordering::Acquire))
    }

    /// Time from creation to completion, or to now if not completed.
    ///
    /// Measured on the monotonic clock, so it never goes negative.
    pub fn duration(&self) -> Duration {
        self.duration_for(self.state())
    }

    /// Duration consistent with an already observed `state`: the recorded
    /// run time only when `state` is `Completed`, otherwise time since
    /// creation.
    pub fn duration_for(&self, state: TaskState) -> Duration {
        if state != TaskState::Completed {
            return self.started_at.elapsed();
        }
        match self.ended_nanos.load(Ordering::Acquire) {
            NOT_ENDED => self.started_at.elapsed(),
            nanos => Duration::from_nanos(nanos),
        }
    }

    /// Moves the task to `Running` and refreshes its last-active time.
    ///
    /// No effect once the task is completed.
    pub fn mark_active(&self) {
        if self.transition(TaskState::Running) {
            self.last_active_nanos
                .store(self.elapsed_nanos(), Ordering::Release);
            debug!(task = %self.id, name = %self.name, "task active");
        }
    }

    /// Moves the task to `Idle`. No effect once the task is completed.
    pub fn mark_idle(&self) {
        if self.transition(TaskState::Idle) {
            debug!(task = %self.id, name = %self.name, "task idle");
        }
    }

    /// Completes the task and records its end time.
    ///
    /// Calling this again keeps the task completed but moves the end time
    /// forward (last write wins).
    pub fn done(&self) {
        self.ended_nanos
            .store(self.elapsed_nanos(), Ordering::Release);
        let previous = self
            .state
            .swap(TaskState::Completed.to_bits(), Ordering::AcqRel);
        if previous != TaskState::Completed.to_bits() {
            self.completions.fetch_add(1, Ordering::AcqRel);
        }
        debug!(task = %self.id, name = %self.name, "task completed");
    }

    /// Swaps in `next` unless the task is already completed.
    fn transition(&self, next: TaskState) -> bool {
        let completed = TaskState::Completed.to_bits();
        self.state
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                (current != completed).then_some(next.to_bits())
            })
            .is_ok()
    }

    fn elapsed_nanos(&self) -> u64 {
        u64::try_from(self.started_at.elapsed().as_nanos()).map_or(NOT_ENDED - 1, |nanos| {
            nanos.min(NOT_ENDED - 1)
        })
    }

    fn wall_at(&self, nanos: u64) -> DateTime<Utc> {
        TimeDelta::from_std(Duration::from_nanos(nanos))
            .ok()
            .and_then(|offset| self.started_wall.checked_add_signed(offset))
            .unwrap_or(self.started_wall)
    }
}
