//! Text views over snapshots.
//!
//! Every view renders to a `String` so commands decide where it goes. Colors
//! come from `console` and are dropped automatically when stdout is not a
//! terminal.

use core::fmt::Display;

use chrono::{DateTime, Local};
use console::{Alignment, Color, pad_str, style};
use taskscope_core::tree::{build_tree, sort_forest_by_duration_desc, walk};
use taskscope_core::{Snapshot, TaskState};

use crate::duration::format_duration;

const NAME_WIDTH: usize = 25;
const STATE_WIDTH: usize = 15;
const ID_WIDTH: usize = 5;
const INDENT: &str = "  ";

/// Colored `● STATE` label.
pub fn state_label(state: TaskState) -> String {
    let (label, color) = match state {
        TaskState::Running => ("● RUNNING", Color::Green),
        TaskState::Idle => ("● IDLE", Color::Yellow),
        TaskState::Completed => ("● COMPLETED", Color::Color256(245)),
    };
    style(label).fg(color).to_string()
}

/// Title block printed above every view.
pub fn header(now: DateTime<Local>) -> String {
    format!(
        "{}\n{}\n",
        style("TASKSCOPE").magenta().bold(),
        style(now.format("%a, %d %b %Y %H:%M:%S %Z")).color256(245)
    )
}

/// Table of every task, in the order served.
pub fn render_list(snapshots: &[Snapshot]) -> String {
    let mut out = format!("\n{}\n\n", style("Task Snapshot").magenta().bold());
    out.push_str(&format!(
        "{} {} {} DURATION\n",
        pad(&"ID", ID_WIDTH),
        pad(&"NAME", NAME_WIDTH),
        pad(&"STATE", STATE_WIDTH),
    ));
    for snapshot in snapshots {
        out.push_str(&format!(
            "{} {} {} {}\n",
            pad(&snapshot.id, ID_WIDTH),
            pad(&snapshot.name, NAME_WIDTH),
            pad(&state_label(snapshot.state), STATE_WIDTH),
            format_duration(snapshot.duration),
        ));
    }
    if snapshots.is_empty() {
        out.push_str(&empty_line());
    }
    out
}

/// Indented hierarchy, longest-running first at every level.
pub fn render_tree(snapshots: Vec<Snapshot>) -> String {
    let count = snapshots.len();
    let mut roots = build_tree(snapshots);
    sort_forest_by_duration_desc(&mut roots);

    let mut out = format!("{}\n\n", style(format!("Tasks: {count}")).blue());
    for (level, snapshot) in walk(&roots) {
        out.push_str(&format!(
            "{}{} {} {}\n",
            INDENT.repeat(level),
            style(&snapshot.name).blue(),
            state_label(snapshot.state),
            style(format_duration(snapshot.duration)).color256(141),
        ));
    }
    if count == 0 {
        out.push_str(&empty_line());
    }
    out
}

/// Unfinished tasks over the slow threshold.
pub fn render_slow(rows: &[&Snapshot]) -> String {
    render_filtered("Slow Tasks", Color::Color256(208), rows)
}

/// Unfinished tasks over the leak threshold.
pub fn render_leaks(rows: &[&Snapshot]) -> String {
    render_filtered("Potential Leaks", Color::Red, rows)
}

fn render_filtered(title: &str, color: Color, rows: &[&Snapshot]) -> String {
    let mut out = format!("\n{}\n\n", style(title).fg(color).bold());
    for snapshot in rows {
        out.push_str(&format!(
            "{} {} {}\n",
            pad(&style(&snapshot.name).fg(color), NAME_WIDTH),
            state_label(snapshot.state),
            format_duration(snapshot.duration),
        ));
    }
    if rows.is_empty() {
        out.push_str(&empty_line());
    }
    out
}

fn pad(value: &dyn Display, width: usize) -> String {
    pad_str(&value.to_string(), width, Alignment::Left, None).into_owned()
}

fn empty_line() -> String {
    format!("{}\n", style("(no tasks)").dim())
}
