use super::connection::ConnectionValidator;
use super::definition::{Connection, Edge, Graph, Node, NodeConfig, Position};
use crate::error::ConnectionRejection;
use tracing::{debug, warn};

/// Offset applied to a duplicated node so it does not sit on top of its original.
pub const DUPLICATE_OFFSET: (f64, f64) = (50.0, 50.0);

/// Owns the nodes, edges and selection of the graph being edited.
///
/// Every operation is synchronous and mutates only the state it names. History is
/// not recorded here; see `HistoryManager` and `GraphSession`.
#[derive(Debug, Clone, Default)]
pub struct GraphModel {
    graph: Graph,
    selected_node_id: Option<String>,
    next_suffix: u64,
}

impl GraphModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_graph(graph: Graph) -> Self {
        Self {
            graph,
            selected_node_id: None,
            next_suffix: 0,
        }
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn nodes(&self) -> &[Node] {
        &self.graph.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.graph.edges
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.graph.node(id)
    }

    pub fn selected_node_id(&self) -> Option<&str> {
        self.selected_node_id.as_deref()
    }

    /// Captures an owned copy of the current graph.
    pub fn snapshot(&self) -> Graph {
        self.graph.clone()
    }

    /// Produces an id of the form `{moduletype}_{n}` that no node in the graph uses.
    /// The suffix only ever grows, so ids handed out by one model are never reused.
    pub fn next_node_id(&mut self, module_type: &str) -> String {
        let prefix = module_type.to_lowercase();
        loop {
            self.next_suffix += 1;
            let candidate = format!("{}_{}", prefix, self.next_suffix);
            if !self.graph.contains_node(&candidate) {
                return candidate;
            }
        }
    }

    /// Appends a node. Returns `false` and leaves the graph untouched if the id is taken.
    pub fn add_node(&mut self, node: Node) -> bool {
        if self.graph.contains_node(&node.id) {
            warn!(node_id = %node.id, "Refusing to add node with duplicate id");
            return false;
        }
        debug!(node_id = %node.id, module_type = %node.module_type, "Adding node");
        self.graph.nodes.push(node);
        true
    }

    /// Removes a node and every edge touching it. Unknown ids are a no-op.
    pub fn remove_node(&mut self, id: &str) -> bool {
        let before = self.graph.nodes.len();
        self.graph.nodes.retain(|n| n.id != id);
        if self.graph.nodes.len() == before {
            return false;
        }

        let edges_before = self.graph.edges.len();
        self.graph.edges.retain(|e| !e.touches(id));
        debug!(
            node_id = %id,
            removed_edges = edges_before - self.graph.edges.len(),
            "Removed node"
        );

        if self.selected_node_id.as_deref() == Some(id) {
            self.selected_node_id = None;
        }
        true
    }

    /// Clones a node under a fresh id, shifted by `DUPLICATE_OFFSET`.
    /// Returns the new id, or `None` when `id` is unknown.
    pub fn duplicate_node(&mut self, id: &str) -> Option<String> {
        let original = self.graph.node(id)?.clone();
        let new_id = self.next_node_id(&original.module_type);
        let position = original
            .position
            .unwrap_or_default()
            .offset(DUPLICATE_OFFSET.0, DUPLICATE_OFFSET.1);

        let copy = Node {
            id: new_id.clone(),
            label: new_id.clone(),
            position: Some(position),
            ..original
        };
        debug!(source = %id, node_id = %new_id, "Duplicated node");
        self.graph.nodes.push(copy);
        Some(new_id)
    }

    /// Replaces the config of one node. Returns `false` for unknown ids.
    pub fn update_node_config(&mut self, id: &str, config: NodeConfig) -> bool {
        match self.graph.nodes.iter_mut().find(|n| n.id == id) {
            Some(node) => {
                node.config = config;
                true
            }
            None => false,
        }
    }

    pub fn move_node(&mut self, id: &str, position: Position) -> bool {
        match self.graph.nodes.iter_mut().find(|n| n.id == id) {
            Some(node) => {
                node.position = Some(position);
                true
            }
            None => false,
        }
    }

    /// Selects a node, or clears the selection with `None`. Unknown ids are ignored.
    pub fn select_node(&mut self, id: Option<&str>) {
        match id {
            Some(id) if self.graph.contains_node(id) => {
                self.selected_node_id = Some(id.to_string());
            }
            Some(id) => debug!(node_id = %id, "Ignoring selection of unknown node"),
            None => self.selected_node_id = None,
        }
    }

    /// Adds an edge after `ConnectionValidator` accepts it.
    pub fn connect(&mut self, candidate: &Connection) -> Result<String, ConnectionRejection> {
        if let Err(rejection) = ConnectionValidator::new(&self.graph).check(candidate) {
            debug!(reason = %rejection, "Connection rejected");
            return Err(rejection);
        }

        // The validator guarantees every field is present and resolvable.
        let source = candidate.source.clone().unwrap_or_default();
        let source_handle = candidate.source_handle.clone().unwrap_or_default();
        let target = candidate.target.clone().unwrap_or_default();
        let target_handle = candidate.target_handle.clone().unwrap_or_default();
        let port_type = self
            .graph
            .node(&source)
            .and_then(|n| n.output(&source_handle))
            .map(|p| p.port_type);

        let id = self
            .graph
            .unused_edge_id(&source, &source_handle, &target, &target_handle);
        debug!(edge_id = %id, "Connected");
        self.graph.edges.push(Edge {
            id: id.clone(),
            source,
            source_handle: Some(source_handle),
            target,
            target_handle: Some(target_handle),
            port_type,
        });
        Ok(id)
    }

    pub fn remove_edge(&mut self, id: &str) -> bool {
        let before = self.graph.edges.len();
        self.graph.edges.retain(|e| e.id != id);
        self.graph.edges.len() != before
    }

    /// Replaces the whole graph, e.g. when restoring a history entry or importing.
    /// A selection pointing at a node that no longer exists is cleared.
    pub fn set_graph(&mut self, graph: Graph) {
        self.graph = graph;
        if let Some(selected) = &self.selected_node_id {
            if !self.graph.contains_node(selected) {
                self.selected_node_id = None;
            }
        }
    }

    pub fn clear(&mut self) {
        self.graph = Graph::default();
        self.selected_node_id = None;
    }
}
