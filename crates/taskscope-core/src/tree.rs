//! Reconstruction of the task forest from flat snapshots.
//!
//! Ids grow monotonically and a live task's parent always has a smaller id,
//! so following parent links strictly decreases the id and the links can
//! never loop. A node whose recorded parent is not smaller than itself can
//! only come from corrupted or hand-written input; it is promoted to a root
//! like an orphan, which keeps the forest acyclic for any input.

use core::cmp::Reverse;
use std::collections::HashMap;

use crate::snapshot::Snapshot;
use crate::task::TaskId;

/// A snapshot together with the snapshots of its children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeNode {
    /// The task at this node
    pub snapshot: Snapshot,
    /// Child nodes, in input order unless sorted
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    /// Number of nodes in this subtree, including this one.
    pub fn count(&self) -> usize {
        let mut total = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            total += 1;
            stack.extend(&node.children);
        }
        total
    }

    /// Number of levels in this subtree, counting this node as one.
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack = vec![(self, 1usize)];
        while let Some((node, level)) = stack.pop() {
            deepest = deepest.max(level);
            stack.extend(node.children.iter().map(|child| (child, level + 1)));
        }
        deepest
    }

    /// Sorts children at every level longest-running first.
    pub fn sort_by_duration_desc(&mut self) {
        sort_forest_by_duration_desc(&mut self.children);
    }
}

/// Sorts a forest and every subtree longest-running first.
pub fn sort_forest_by_duration_desc(nodes: &mut [TreeNode]) {
    let mut pending: Vec<&mut [TreeNode]> = vec![nodes];
    while let Some(level) = pending.pop() {
        level.sort_by_key(|node| Reverse(node.snapshot.duration));
        for node in level {
            pending.push(node.children.as_mut_slice());
        }
    }
}

/// Depth-first walk of a forest yielding `(level, snapshot)` pairs, roots at
/// level 0, in the order a tree view prints them.
pub fn walk(nodes: &[TreeNode]) -> Vec<(usize, &Snapshot)> {
    let mut lines = Vec::new();
    let mut stack: Vec<(usize, &TreeNode)> = nodes.iter().rev().map(|node| (0, node)).collect();
    while let Some((level, node)) = stack.pop() {
        lines.push((level, &node.snapshot));
        stack.extend(node.children.iter().rev().map(|child| (level + 1, child)));
    }
    lines
}

/// Builds the parent/child forest from flat snapshots.
///
/// A snapshot becomes a root when its parent id is `0`, when its parent is
/// absent from `snapshots` (an orphan), or when its parent id is not smaller
/// than its own. Roots and siblings keep their input order. When an id occurs
/// more than once the last occurrence wins. Runs in O(n).
pub fn build_tree(snapshots: Vec<Snapshot>) -> Vec<TreeNode> {
    let mut index_of: HashMap<TaskId, usize> = HashMap::with_capacity(snapshots.len());
    for (index, snapshot) in snapshots.iter().enumerate() {
        index_of.insert(snapshot.id, index);
    }

    let mut children: Vec<Vec<usize>> = vec![Vec::new(); snapshots.len()];
    let mut roots = Vec::new();
    for (index, snapshot) in snapshots.iter().enumerate() {
        if index_of.get(&snapshot.id) != Some(&index) {
            continue;
        }
        match parent_index(snapshot, &index_of) {
            Some(parent) => children[parent].push(index),
            None => roots.push(index),
        }
    }

    let mut slots: Vec<Option<Snapshot>> = snapshots.into_iter().map(Some).collect();
    roots
        .into_iter()
        .filter_map(|root| assemble(root, &mut slots, &children))
        .collect()
}

fn parent_index(snapshot: &Snapshot, index_of: &HashMap<TaskId, usize>) -> Option<usize> {
    if snapshot.parent_id.is_root() || snapshot.parent_id >= snapshot.id {
        return None;
    }
    index_of.get(&snapshot.parent_id).copied()
}

/// Turns the subtree under `root` into owned nodes without recursion, so a
/// long parent chain cannot exhaust the stack.
fn assemble(
    root: usize,
    slots: &mut [Option<Snapshot>],
    children: &[Vec<usize>],
) -> Option<TreeNode> {
    // Pre-order; reversed, every node comes after all of its descendants.
    let mut order = Vec::new();
    let mut stack = vec![root];
    while let Some(index) = stack.pop() {
        order.push(index);
        stack.extend(&children[index]);
    }

    let mut built: HashMap<usize, TreeNode> = HashMap::with_capacity(order.len());
    for &index in order.iter().rev() {
        let snapshot = slots[index].take()?;
        let nodes = children[index]
            .iter()
            .filter_map(|child| built.remove(child))
            .collect();
        built.insert(
            index,
            TreeNode {
                snapshot,
                children: nodes,
            },
        );
    }
    built.remove(&root)
}
