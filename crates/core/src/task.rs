use serde::{Deserialize, Serialize};

/// Caller-assigned task identifier. Not checked for uniqueness.
pub type TaskId = i64;

/// Task urgency. Lower value = more urgent.
pub type Priority = i64;

/// Stable worker identifier, dense from 1 in creation order.
pub type WorkerId = u64;

/// Unit of work routed through the cluster.
///
/// Both fields are opaque to the cluster: negative priorities and duplicate
/// ids are accepted and only affect ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub priority: Priority,
}

impl Task {
    pub fn new(id: TaskId, priority: Priority) -> Self {
        Self { id, priority }
    }
}

impl std::fmt::Display for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "task {} (priority {})", self.id, self.priority)
    }
}
