use crate::catalog::{Port, PortType};
use serde::{Deserialize, Serialize};

/// Free-form module configuration, keyed by option name.
pub type NodeConfig = serde_json::Map<String, serde_json::Value>;

/// Canvas position of a node. Visual only; never sent over the wire.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: f64, dy: f64) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

/// A module instance in the dataflow graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub module_type: String,
    pub category: String,
    pub label: String,
    pub config: NodeConfig,
    pub inputs: Vec<Port>,
    pub outputs: Vec<Port>,
    /// `None` until a layout pass (or the user) places the node.
    pub position: Option<Position>,
}

impl Node {
    pub fn input(&self, name: &str) -> Option<&Port> {
        self.inputs.iter().find(|p| p.name == name)
    }

    pub fn output(&self, name: &str) -> Option<&Port> {
        self.outputs.iter().find(|p| p.name == name)
    }
}

/// A directed connection from an output port to an input port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub id: String,
    pub source: String,
    pub source_handle: Option<String>,
    pub target: String,
    pub target_handle: Option<String>,
    /// Type carried by the edge, taken from the source output port.
    pub port_type: Option<PortType>,
}

impl Edge {
    /// Canonical edge id for a fully specified connection.
    pub fn derive_id(source: &str, source_port: &str, target: &str, target_port: &str) -> String {
        format!("e-{}-{}-{}-{}", source, source_port, target, target_port)
    }

    pub fn touches(&self, node_id: &str) -> bool {
        self.source == node_id || self.target == node_id
    }
}

/// A candidate edge as produced by an interactive drag. Any field may still be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Connection {
    pub source: Option<String>,
    pub source_handle: Option<String>,
    pub target: Option<String>,
    pub target_handle: Option<String>,
}

impl Connection {
    pub fn new(source: &str, source_handle: &str, target: &str, target_handle: &str) -> Self {
        Self {
            source: Some(source.to_string()),
            source_handle: Some(source_handle.to_string()),
            target: Some(target.to_string()),
            target_handle: Some(target_handle.to_string()),
        }
    }
}

/// The unit snapshotted by undo/redo and by the wire codec.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Graph {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

impl Graph {
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn edge(&self, id: &str) -> Option<&Edge> {
        self.edges.iter().find(|e| e.id == id)
    }

    /// Id for a new edge between the given ports. Ids built from names containing
    /// `-` can coincide, so a taken id gets a `#n` suffix.
    pub fn unused_edge_id(
        &self,
        source: &str,
        source_port: &str,
        target: &str,
        target_port: &str,
    ) -> String {
        let base = Edge::derive_id(source, source_port, target, target_port);
        if self.edge(&base).is_none() {
            return base;
        }
        (2u32..)
            .map(|n| format!("{}#{}", base, n))
            .find(|id| self.edge(id).is_none())
            .unwrap_or(base)
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.nodes.iter().any(|n| n.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Ids of the edges leaving `node_id`.
    pub fn outgoing_edge_ids(&self, node_id: &str) -> Vec<String> {
        self.edges
            .iter()
            .filter(|e| e.source == node_id)
            .map(|e| e.id.clone())
            .collect()
    }
}

/// An immutable copy of the graph at a point in time.
pub type HistoryEntry = Graph;
