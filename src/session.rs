use crate::catalog::ModuleCatalog;
use crate::codec::{LayoutEngine, WireCodec, WireGraph};
use crate::document::GraphDocument;
use crate::error::ConnectionRejection;
use crate::execution::{Clock, ExecutionOrchestrator, ExecutionOutcome, ExecutionService, UserMessage};
use crate::graph::{Connection, Graph, GraphModel, HistoryManager, Node, NodeConfig, Position};
use crate::validation::{GraphValidator, ValidationResult};
use tracing::{info, warn};

/// Explicit state container for one editing session.
///
/// Bundles the graph model with its undo/redo log and applies the history rule in
/// one place: structural edits (nodes or edges added or removed) record a snapshot
/// first, while config edits, moves and selection do not.
#[derive(Debug, Default)]
pub struct GraphSession {
    model: GraphModel,
    history: HistoryManager,
    validation: Option<ValidationResult>,
}

impl GraphSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_history(history: HistoryManager) -> Self {
        Self {
            model: GraphModel::new(),
            history,
            validation: None,
        }
    }

    pub fn model(&self) -> &GraphModel {
        &self.model
    }

    pub fn graph(&self) -> &Graph {
        self.model.graph()
    }

    pub fn history(&self) -> &HistoryManager {
        &self.history
    }

    pub fn add_node(&mut self, node: Node) -> bool {
        if self.model.graph().contains_node(&node.id) {
            warn!(node_id = %node.id, "Node id already in use");
            return false;
        }
        self.history.push_history(&self.model);
        self.model.add_node(node)
    }

    /// Instantiates a catalog module under a fresh id and adds it.
    pub fn add_module(
        &mut self,
        catalog: &ModuleCatalog,
        module_type: &str,
        position: Position,
    ) -> Option<String> {
        catalog.get(module_type)?;
        let id = self.model.next_node_id(module_type);
        let node = catalog.instantiate(module_type, &id, position)?;
        self.add_node(node).then_some(id)
    }

    pub fn remove_node(&mut self, id: &str) -> bool {
        if !self.model.graph().contains_node(id) {
            return false;
        }
        self.history.push_history(&self.model);
        self.model.remove_node(id)
    }

    pub fn duplicate_node(&mut self, id: &str) -> Option<String> {
        if !self.model.graph().contains_node(id) {
            return None;
        }
        self.history.push_history(&self.model);
        self.model.duplicate_node(id)
    }

    pub fn connect(&mut self, candidate: &Connection) -> Result<String, ConnectionRejection> {
        crate::graph::ConnectionValidator::new(self.model.graph()).check(candidate)?;
        self.history.push_history(&self.model);
        self.model.connect(candidate)
    }

    pub fn remove_edge(&mut self, id: &str) -> bool {
        if self.model.graph().edge(id).is_none() {
            return false;
        }
        self.history.push_history(&self.model);
        self.model.remove_edge(id)
    }

    pub fn update_node_config(&mut self, id: &str, config: NodeConfig) -> bool {
        self.model.update_node_config(id, config)
    }

    pub fn move_node(&mut self, id: &str, position: Position) -> bool {
        self.model.move_node(id, position)
    }

    pub fn select_node(&mut self, id: Option<&str>) {
        self.model.select_node(id);
    }

    pub fn undo(&mut self) -> bool {
        self.history.undo(&mut self.model)
    }

    pub fn redo(&mut self) -> bool {
        self.history.redo(&mut self.model)
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Validates the current graph and keeps the result for later display.
    pub fn validate(&mut self) -> &ValidationResult {
        let result = GraphValidator::validate(self.model.graph());
        self.validation.insert(result)
    }

    pub fn validation_result(&self) -> Option<&ValidationResult> {
        self.validation.as_ref()
    }

    /// Replaces the graph with a decoded wire graph, placed by `layout`. Undoable.
    pub fn load_wire(&mut self, wire: &WireGraph, catalog: &ModuleCatalog, layout: &dyn LayoutEngine) {
        let graph = WireCodec::decode_with_layout(wire, catalog, layout);
        info!(nodes = graph.nodes.len(), edges = graph.edges.len(), "Loading graph");
        self.history.push_history(&self.model);
        self.model.set_graph(graph);
        self.validation = None;
    }

    /// Replaces the graph with an imported document, keeping its stored positions. Undoable.
    pub fn load_document(&mut self, document: &GraphDocument, catalog: &ModuleCatalog) {
        let graph = document.to_graph(catalog);
        self.history.push_history(&self.model);
        self.model.set_graph(graph);
        self.validation = None;
    }

    pub fn export_document(&self) -> GraphDocument {
        GraphDocument::from_graph(self.model.graph())
    }

    /// Empties the graph, the selection, both history stacks and the last validation.
    pub fn clear_all(&mut self) {
        self.model.clear();
        self.history.clear();
        self.validation = None;
    }

    /// Validates a snapshot of the current graph and, if it has no errors, executes
    /// that same snapshot. Warnings never block a run.
    pub async fn run<S, C>(&mut self, orchestrator: &mut ExecutionOrchestrator<S, C>) -> ExecutionOutcome
    where
        S: ExecutionService,
        C: Clock,
    {
        let snapshot = self.model.snapshot();
        let result = GraphValidator::validate(&snapshot);
        let errors = result.errors.len();
        self.validation = Some(result);

        if errors > 0 {
            warn!(errors, "Refusing to execute invalid graph");
            orchestrator.notify(UserMessage::error(format!(
                "Cannot execute: {} validation error(s)",
                errors
            )));
            return ExecutionOutcome::Rejected { errors };
        }

        orchestrator.execute(&snapshot).await
    }
}
