use super::definition::HistoryEntry;
use super::model::GraphModel;
use std::collections::VecDeque;
use tracing::debug;

/// Number of undo steps kept by default.
pub const DEFAULT_HISTORY_CAPACITY: usize = 30;

/// Bounded undo/redo log over graph snapshots.
///
/// Callers push a snapshot immediately before every structural edit (node or edge
/// added or removed). Config edits and drags are not recorded.
#[derive(Debug, Clone)]
pub struct HistoryManager {
    history: VecDeque<HistoryEntry>,
    future: VecDeque<HistoryEntry>,
    capacity: usize,
}

impl Default for HistoryManager {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }
}

impl HistoryManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            history: VecDeque::with_capacity(capacity),
            future: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    /// Records the model's current graph and discards every undone state.
    pub fn push_history(&mut self, model: &GraphModel) {
        while self.history.len() >= self.capacity {
            self.history.pop_front();
        }
        self.history.push_back(model.snapshot());
        self.future.clear();
    }

    /// Restores the most recent entry. Returns `false` when there is nothing to undo.
    pub fn undo(&mut self, model: &mut GraphModel) -> bool {
        let Some(previous) = self.history.pop_back() else {
            return false;
        };
        self.future.push_front(model.snapshot());
        model.set_graph(previous);
        debug!(
            history = self.history.len(),
            future = self.future.len(),
            "Undo"
        );
        true
    }

    /// Re-applies the oldest undone entry. Returns `false` when there is nothing to redo.
    pub fn redo(&mut self, model: &mut GraphModel) -> bool {
        let Some(next) = self.future.pop_front() else {
            return false;
        };
        self.history.push_back(model.snapshot());
        model.set_graph(next);
        debug!(
            history = self.history.len(),
            future = self.future.len(),
            "Redo"
        );
        true
    }

    pub fn can_undo(&self) -> bool {
        !self.history.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    pub fn history(&self) -> &VecDeque<HistoryEntry> {
        &self.history
    }

    pub fn future(&self) -> &VecDeque<HistoryEntry> {
        &self.future
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.history.clear();
        self.future.clear();
    }
}
