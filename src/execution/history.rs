use super::result::{GraphResult, ResultsMap};
use crate::config::DEFAULT_EXECUTION_HISTORY_CAP;
use std::collections::VecDeque;
use std::sync::Arc;
use uuid::Uuid;

/// A finished run, kept so the user can go back to its results.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionSnapshot {
    pub id: String,
    pub timestamp_ms: u64,
    pub node_results: Arc<ResultsMap>,
    pub total_time_ms: f64,
    pub execution_order: Vec<String>,
}

/// Most-recent-first ring of past runs. Index 0 is always the newest.
#[derive(Debug, Clone)]
pub struct ExecutionHistory {
    snapshots: VecDeque<ExecutionSnapshot>,
    capacity: usize,
}

impl Default for ExecutionHistory {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_EXECUTION_HISTORY_CAP)
    }
}

impl ExecutionHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            snapshots: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Records a run at the front, dropping the oldest beyond capacity.
    pub fn add_snapshot(&mut self, result: &GraphResult, timestamp_ms: u64) -> &ExecutionSnapshot {
        let node_results: ResultsMap = result
            .node_results
            .iter()
            .map(|r| (r.node_id.clone(), r.clone()))
            .collect();

        self.snapshots.push_front(ExecutionSnapshot {
            id: format!("exec_{}", Uuid::new_v4().simple()),
            timestamp_ms,
            node_results: Arc::new(node_results),
            total_time_ms: result.total_time_ms,
            execution_order: result.execution_order.clone(),
        });
        self.snapshots.truncate(self.capacity);
        &self.snapshots[0]
    }

    /// The result map of a past run, ready to be republished as current results.
    pub fn restore(&self, snapshot_id: &str) -> Option<Arc<ResultsMap>> {
        self.get(snapshot_id).map(|s| Arc::clone(&s.node_results))
    }

    pub fn get(&self, snapshot_id: &str) -> Option<&ExecutionSnapshot> {
        self.snapshots.iter().find(|s| s.id == snapshot_id)
    }

    pub fn latest(&self) -> Option<&ExecutionSnapshot> {
        self.snapshots.front()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ExecutionSnapshot> {
        self.snapshots.iter()
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.snapshots.clear();
    }
}
