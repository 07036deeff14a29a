//! Remote execution and result replay.
//!
//! A run goes through three stages: the graph is encoded to its wire form and sent
//! to an `ExecutionService`, the raw per-node response is normalized into a
//! `GraphResult`, and the result is replayed to observers one node at a time in
//! the order the service reports. Finished runs land in `ExecutionHistory`.

pub mod client;
pub mod clock;
pub mod history;
pub mod observer;
pub mod orchestrator;
pub mod result;
pub mod service;

pub use client::{HealthResponse, HttpExecutionService, PresetGraph, PresetsResponse};
pub use clock::{Clock, ManualClock, TokioClock};
pub use history::{ExecutionHistory, ExecutionSnapshot};
pub use observer::{EventLog, ExecutionEvent, ExecutionObserver, IdSet, MessageLevel, UserMessage};
pub use orchestrator::{ExecutionOrchestrator, ExecutionOutcome, ExecutionState};
pub use result::{
    GraphResult, NodeResult, RawGraphResult, RawNodeResult, ResultsMap, RunSummary, TensorData,
    TensorGrad, TensorStats,
};
pub use service::ExecutionService;
