//! Prelude module for convenient imports
//!
//! This module re-exports the most commonly used types and traits from the modgraph
//! crate. Import it to get the editing, validation and execution types without
//! naming each module.
//!
//! # Example
//!
//! ```rust,no_run
//! use modgraph::prelude::*;
//!
//! # fn run_example() -> Result<()> {
//! let catalog = ModuleCatalog::from_json(&std::fs::read_to_string("modules.json")?)?;
//! let document = GraphDocument::from_file("graph.json")?;
//!
//! let mut session = GraphSession::new();
//! session.load_document(&document, &catalog);
//!
//! let report = session.validate();
//! println!("valid: {}", report.valid);
//! # Ok(())
//! # }
//! ```

// Graph model and editing
pub use crate::graph::{
    Connection, ConnectionValidator, Edge, Graph, GraphModel, HistoryManager, Node, NodeConfig,
    Position,
};
pub use crate::session::GraphSession;

// Catalog and wire format
pub use crate::catalog::{ModuleCatalog, ModuleCatalogEntry, Port, PortType};
pub use crate::codec::{LayoutEngine, WireCodec, WireEdge, WireGraph, WireNode};
pub use crate::document::GraphDocument;
pub use crate::layout::LayeredLayout;

// Validation
pub use crate::validation::{GraphValidator, Severity, ValidationIssue, ValidationResult};

// Execution
pub use crate::config::OrchestratorConfig;
pub use crate::execution::{
    Clock, EventLog, ExecutionEvent, ExecutionHistory, ExecutionObserver, ExecutionOrchestrator,
    ExecutionOutcome, ExecutionService, GraphResult, HttpExecutionService, ManualClock,
    NodeResult, ResultsMap, TokioClock,
};
pub use crate::report::ExecutionLogFormatter;

// Error types
pub use crate::error::{ConfigError, ConnectionRejection, DocumentError, ExecutionError};

// Result type alias for convenience
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;
