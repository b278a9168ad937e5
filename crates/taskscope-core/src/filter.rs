//! Slow and leak detection over exported snapshots.

use std::time::Duration;

use crate::snapshot::Snapshot;

/// Default threshold for [`slow`].
pub const DEFAULT_SLOW_THRESHOLD: Duration = Duration::from_secs(2);

/// Age beyond which an unfinished task is reported as a potential leak.
pub const LEAK_THRESHOLD: Duration = Duration::from_secs(30);

/// Unfinished tasks that have been alive longer than `threshold`.
pub fn slow(snapshots: &[Snapshot], threshold: Duration) -> Vec<&Snapshot> {
    snapshots
        .iter()
        .filter(|snapshot| !snapshot.is_completed() && snapshot.duration > threshold)
        .collect()
}

/// Unfinished tasks older than [`LEAK_THRESHOLD`].
pub fn leaks(snapshots: &[Snapshot]) -> Vec<&Snapshot> {
    slow(snapshots, LEAK_THRESHOLD)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::{TaskId, TaskState};
    use chrono::Utc;

    fn snap(id: u64, state: TaskState, secs: u64) -> Snapshot {
        Snapshot {
            id: TaskId::new(id),
            name: format!("task-{id}"),
            parent_id: TaskId::ROOT,
            start_time_at: Utc::now(),
            state,
            duration: Duration::from_secs(secs),
        }
    }

    fn fixture() -> Vec<Snapshot> {
        vec![
            snap(1, TaskState::Running, 1),
            snap(2, TaskState::Running, 5),
            snap(3, TaskState::Idle, 45),
            snap(4, TaskState::Completed, 60),
            snap(5, TaskState::Running, 2),
        ]
    }

    #[test]
    fn test_slow_skips_completed_and_fast() {
        let snapshots = fixture();
        let found: Vec<_> = slow(&snapshots, DEFAULT_SLOW_THRESHOLD)
            .iter()
            .map(|snapshot| snapshot.id.get())
            .collect();
        // Exactly at the threshold is not slow.
        assert_eq!(found, [2, 3]);
    }

    #[test]
    fn test_leaks_use_fixed_threshold() {
        let snapshots = fixture();
        let found: Vec<_> = leaks(&snapshots)
            .iter()
            .map(|snapshot| snapshot.id.get())
            .collect();
        assert_eq!(found, [3]);
    }
}
