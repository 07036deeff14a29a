//! # modgraph - Graph Model and Execution Orchestrator
//!
//! **modgraph** is the client-side core of a visual module editor. It holds a dataflow
//! graph of typed modules, keeps that graph structurally and semantically valid, converts
//! it to and from the wire format of a remote execution service, and replays the
//! service's results to observers as an ordered, paced sequence of steps.
//!
//! The crate performs no numeric work itself. It decides *whether* a graph may run,
//! *in what order* results are shown and *how* edits are remembered for undo/redo.
//!
//! ## Core Workflow
//!
//! 1.  **Load the catalog**: parse the service's module catalog into a `ModuleCatalog`.
//! 2.  **Edit**: build the graph through a `GraphSession`. Connections are checked by the
//!     `ConnectionValidator` before they enter the model, and every structural edit is
//!     recorded for undo/redo.
//! 3.  **Validate**: `GraphValidator` reports missing inputs, type mismatches, cycles and
//!     unconnected nodes. Only errors block execution.
//! 4.  **Execute**: an `ExecutionOrchestrator` encodes the graph with `WireCodec`, calls the
//!     `ExecutionService`, and replays the normalized result node by node.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use modgraph::prelude::*;
//!
//! # async fn run() -> std::result::Result<(), Box<dyn std::error::Error>> {
//! let config = OrchestratorConfig::from_env()?;
//! let service = HttpExecutionService::new(&config)?;
//! let catalog = service.fetch_modules().await?;
//!
//! let mut session = GraphSession::new();
//! let input = session
//!     .add_module(&catalog, "TextInput", Position::new(0.0, 0.0))
//!     .ok_or("TextInput is not in the catalog")?;
//! let tokenizer = session
//!     .add_module(&catalog, "Tokenizer", Position::new(360.0, 0.0))
//!     .ok_or("Tokenizer is not in the catalog")?;
//! session.connect(&Connection::new(&input, "text", &tokenizer, "text"))?;
//!
//! let mut orchestrator = ExecutionOrchestrator::new(service, config);
//! match session.run(&mut orchestrator).await {
//!     ExecutionOutcome::Completed(summary) => println!("{}", summary.headline()),
//!     other => println!("Run did not complete: {:?}", other),
//! }
//! # Ok(())
//! # }
//! ```

pub mod catalog;
pub mod codec;
pub mod config;
pub mod document;
pub mod error;
pub mod execution;
pub mod graph;
pub mod layout;
pub mod prelude;
pub mod report;
pub mod session;
pub mod validation;
