use super::result::ResultsMap;
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};

/// Set of edge or node ids, published as a whole value.
pub type IdSet = BTreeSet<String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageLevel {
    Success,
    Warning,
    Error,
}

/// A user-facing notification raised by the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserMessage {
    pub level: MessageLevel,
    pub text: String,
    pub detail: Option<String>,
}

impl UserMessage {
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Error,
            text: text.into(),
            detail: None,
        }
    }

    pub fn warning(text: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Warning,
            text: text.into(),
            detail: None,
        }
    }

    pub fn success(text: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Success,
            text: text.into(),
            detail: Some(detail.into()),
        }
    }
}

/// State changes emitted while a run is dispatched and replayed.
///
/// Collections are shared `Arc` snapshots. A new value is published for every
/// change; receivers must never mutate what they were handed.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionEvent {
    Started,
    NodeExecuting { node_id: Option<String> },
    ResultsPublished { version: u64, results: Arc<ResultsMap> },
    FlowingEdgesChanged { edge_ids: Arc<IdSet> },
    NodeCompleted { node_id: String, completed: Arc<IdSet> },
    Message(UserMessage),
    Finished,
}

pub trait ExecutionObserver: Send {
    fn on_event(&mut self, event: &ExecutionEvent);
}

/// Observer that keeps every event. Clones share the same log, so a test can
/// hand one clone to the orchestrator and inspect the other.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Arc<Mutex<Vec<ExecutionEvent>>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ExecutionEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    pub fn messages(&self) -> Vec<UserMessage> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ExecutionEvent::Message(m) => Some(m),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        if let Ok(mut events) = self.events.lock() {
            events.clear();
        }
    }
}

impl ExecutionObserver for EventLog {
    fn on_event(&mut self, event: &ExecutionEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}
