//! Point-in-time export of task state.
//!
//! A [`Snapshot`] is an owned copy: later mutations of the live task never
//! reach a snapshot that was already taken. Export walks the registry once
//! and makes no ordering promise, so callers sort when they care.

use core::cmp::Reverse;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{from_str, to_string};

use crate::error::Result;
use crate::registry::Registry;
use crate::task::{Task, TaskId, TaskState};

/// Observable fields of one task at read time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Task identity
    pub id: TaskId,
    /// Task label
    pub name: String,
    /// Parent identity, `0` for roots
    pub parent_id: TaskId,
    /// Wall-clock creation time
    pub start_time_at: DateTime<Utc>,
    /// State at read time
    pub state: TaskState,
    /// Time since creation, or total run time once completed
    pub duration: Duration,
}

impl Snapshot {
    /// Copies a live task.
    ///
    /// The duration is derived from the state read here, so a concurrent
    /// completion never yields a running snapshot with a frozen duration.
    pub fn capture(task: &Task) -> Self {
        let state = task.state();
        Self {
            id: task.id(),
            name: task.name().to_owned(),
            parent_id: task.parent_id(),
            start_time_at: task.started_at(),
            state,
            duration: task.duration_for(state),
        }
    }

    /// Whether the task had completed when captured.
    pub fn is_completed(&self) -> bool {
        self.state == TaskState::Completed
    }
}

/// Captures every task in the registry. Empty while the registry is disabled.
pub fn export(registry: &Registry) -> Vec<Snapshot> {
    if !registry.is_enabled() {
        return Vec::new();
    }

    let mut snapshots = Vec::with_capacity(registry.len());
    registry.for_each(|task| snapshots.push(Snapshot::capture(task)));
    snapshots
}

/// Orders snapshots by ascending id (creation order).
pub fn sort_by_id(snapshots: &mut [Snapshot]) {
    snapshots.sort_unstable_by_key(|snapshot| snapshot.id);
}

/// Orders snapshots longest-running first.
pub fn sort_by_duration_desc(snapshots: &mut [Snapshot]) {
    snapshots.sort_by_key(|snapshot| Reverse(snapshot.duration));
}

/// Encodes snapshots as the JSON array served by the debug endpoint.
///
/// # Errors
/// Returns an error if serialization fails.
pub fn to_json(snapshots: &[Snapshot]) -> Result<String> {
    Ok(to_string(snapshots)?)
}

/// Decodes a JSON array produced by [`to_json`] or the debug endpoint.
///
/// # Errors
/// Returns an error if the input is not a valid snapshot array.
pub fn from_json(json: &str) -> Result<Vec<Snapshot>> {
    Ok(from_str(json)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{Carrier, attach};
    use std::thread;

    #[test]
    fn test_export_contains_every_task() {
        let registry = Registry::new();
        let (root, _) = attach(&registry, &Carrier::root(), "root");
        attach(&registry, &root, "child");

        let mut snapshots = registry.snapshot();
        sort_by_id(&mut snapshots);

        assert_eq!(snapshots.len(), 2);
        assert_eq!(snapshots[0].name, "root");
        assert_eq!(snapshots[0].parent_id, TaskId::ROOT);
        assert_eq!(snapshots[1].name, "child");
        assert_eq!(snapshots[1].parent_id, snapshots[0].id);
    }

    #[test]
    fn test_snapshot_is_independent_of_later_mutation() {
        let registry = Registry::new();
        let (_, task) = attach(&registry, &Carrier::root(), "mutable");
        let task = task.expect("enabled registry creates a task");

        let before = registry.snapshot();
        task.mark_idle();
        task.done();

        assert_eq!(before[0].state, TaskState::Running);
        assert_eq!(registry.snapshot()[0].state, TaskState::Completed);
    }

    #[test]
    fn test_completed_duration_matches_end_minus_start() {
        let registry = Registry::new();
        let (_, task) = attach(&registry, &Carrier::root(), "timed");
        let task = task.expect("enabled registry creates a task");

        thread::sleep(Duration::from_millis(10));
        task.done();

        let snapshot = registry.snapshot().remove(0);
        assert!(snapshot.duration > Duration::ZERO);
        assert!(snapshot.duration >= Duration::from_millis(10));
        let ended = task.ended_at().expect("completed task has end time");
        let wall = (ended - snapshot.start_time_at)
            .to_std()
            .expect("end after start");
        assert_eq!(wall.as_micros(), snapshot.duration.as_micros());
    }

    #[test]
    fn test_disabled_export_is_empty() {
        let registry = Registry::new();
        attach(&registry, &Carrier::root(), "hidden");
        registry.disable();
        assert!(export(&registry).is_empty());
    }

    #[test]
    fn test_json_wire_format() {
        let registry = Registry::new();
        attach(&registry, &Carrier::root(), "wire");

        let json = to_json(&registry.snapshot()).expect("encode");
        for field in [
            "\"id\":1",
            "\"name\":\"wire\"",
            "\"parent_id\":0",
            "\"start_time_at\":",
            "\"state\":\"running\"",
            "\"duration\":",
        ] {
            assert!(json.contains(field), "missing {field} in {json}");
        }

        let decoded = from_json(&json).expect("decode");
        assert_eq!(decoded.len(), 1);
        assert_eq!(decoded[0].name, "wire");
    }

    #[test]
    fn test_decode_tolerates_unknown_state() {
        let json = r#"[{"id":4,"name":"odd","parent_id":0,
            "start_time_at":"2024-05-01T12:00:00Z","state":"zombie",
            "duration":{"secs":1,"nanos":500}}]"#;
        let decoded = from_json(json).expect("decode");
        assert_eq!(decoded[0].state, TaskState::Running);
        assert_eq!(decoded[0].duration, Duration::new(1, 500));
    }

    #[test]
    fn test_sort_by_duration_desc() {
        let json = r#"[
            {"id":1,"name":"a","parent_id":0,"start_time_at":"2024-05-01T12:00:00Z","state":"idle","duration":{"secs":1,"nanos":0}},
            {"id":2,"name":"b","parent_id":0,"start_time_at":"2024-05-01T12:00:00Z","state":"idle","duration":{"secs":5,"nanos":0}},
            {"id":3,"name":"c","parent_id":0,"start_time_at":"2024-05-01T12:00:00Z","state":"idle","duration":{"secs":3,"nanos":0}}
        ]"#;
        let mut snapshots = from_json(json).expect("decode");
        sort_by_duration_desc(&mut snapshots);
        let names: Vec<_> = snapshots.iter().map(|snapshot| snapshot.name.as_str()).collect();
        assert_eq!(names, ["b", "c", "a"]);
    }
}
