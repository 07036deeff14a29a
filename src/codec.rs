use crate::catalog::ModuleCatalog;
use crate::graph::{Edge, Graph, Node, NodeConfig, Position};
use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Category given to nodes whose module type the catalog does not know.
pub const UNKNOWN_CATEGORY: &str = "unknown";

/// Node projection exchanged with the execution service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireNode {
    pub id: String,
    #[serde(rename = "type")]
    pub module_type: String,
    #[serde(default)]
    pub config: NodeConfig,
}

/// Edge projection exchanged with the execution service. Ports are never null.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireEdge {
    pub source_node: String,
    #[serde(default)]
    pub source_port: String,
    pub target_node: String,
    #[serde(default)]
    pub target_port: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WireGraph {
    pub nodes: Vec<WireNode>,
    pub edges: Vec<WireEdge>,
}

/// Assigns canvas positions to decoded nodes.
///
/// Implementations receive stable node ids and must return one position per id.
/// The codec never calls a layout itself.
pub trait LayoutEngine {
    fn layout(&self, nodes: &[Node], edges: &[Edge]) -> AHashMap<String, Position>;
}

/// Bidirectional mapping between the editable graph and the wire format.
pub struct WireCodec;

impl WireCodec {
    /// Projects the graph onto the wire format, dropping positions and labels.
    pub fn encode(graph: &Graph) -> WireGraph {
        let nodes = graph
            .nodes
            .iter()
            .map(|n| WireNode {
                id: n.id.clone(),
                module_type: n.module_type.clone(),
                config: n.config.clone(),
            })
            .collect();

        let edges = graph
            .edges
            .iter()
            .map(|e| WireEdge {
                source_node: e.source.clone(),
                source_port: e.source_handle.clone().unwrap_or_default(),
                target_node: e.target.clone(),
                target_port: e.target_handle.clone().unwrap_or_default(),
            })
            .collect();

        WireGraph { nodes, edges }
    }

    /// Rebuilds an editable graph from its wire form.
    ///
    /// Unknown module types degrade to a node with category `"unknown"` and no ports
    /// instead of failing the whole import. Decoded nodes carry no position.
    pub fn decode(wire: &WireGraph, catalog: &ModuleCatalog) -> Graph {
        let nodes: Vec<Node> = wire
            .nodes
            .iter()
            .map(|wn| Self::decode_node(wn, catalog))
            .collect();

        let mut graph = Graph {
            nodes,
            edges: Vec::with_capacity(wire.edges.len()),
        };
        for we in &wire.edges {
            let port_type = graph
                .node(&we.source_node)
                .and_then(|n| n.output(&we.source_port))
                .map(|p| p.port_type);
            let id = graph.unused_edge_id(
                &we.source_node,
                &we.source_port,
                &we.target_node,
                &we.target_port,
            );
            graph.edges.push(Edge {
                id,
                source: we.source_node.clone(),
                source_handle: non_empty(&we.source_port),
                target: we.target_node.clone(),
                target_handle: non_empty(&we.target_port),
                port_type,
            });
        }
        graph
    }

    /// Decodes and then places every node with the given layout.
    pub fn decode_with_layout(
        wire: &WireGraph,
        catalog: &ModuleCatalog,
        layout: &dyn LayoutEngine,
    ) -> Graph {
        let mut graph = Self::decode(wire, catalog);
        apply_layout(&mut graph, layout);
        graph
    }

    fn decode_node(wire_node: &WireNode, catalog: &ModuleCatalog) -> Node {
        match catalog.get(&wire_node.module_type) {
            Some(entry) => {
                let mut config = entry.default_config.clone();
                for (key, value) in &wire_node.config {
                    config.insert(key.clone(), value.clone());
                }
                Node {
                    id: wire_node.id.clone(),
                    module_type: wire_node.module_type.clone(),
                    category: entry.category.clone(),
                    label: wire_node.id.clone(),
                    config,
                    inputs: entry.inputs.clone(),
                    outputs: entry.outputs.clone(),
                    position: None,
                }
            }
            None => {
                warn!(
                    node_id = %wire_node.id,
                    module_type = %wire_node.module_type,
                    "Unknown module type, importing node without ports"
                );
                Node {
                    id: wire_node.id.clone(),
                    module_type: wire_node.module_type.clone(),
                    category: UNKNOWN_CATEGORY.to_string(),
                    label: wire_node.id.clone(),
                    config: wire_node.config.clone(),
                    inputs: Vec::new(),
                    outputs: Vec::new(),
                    position: None,
                }
            }
        }
    }
}

/// Writes layout positions into the graph's nodes. Nodes the layout skipped keep
/// whatever position they had.
pub fn apply_layout(graph: &mut Graph, layout: &dyn LayoutEngine) {
    let positions = layout.layout(&graph.nodes, &graph.edges);
    for node in &mut graph.nodes {
        if let Some(position) = positions.get(&node.id) {
            node.position = Some(*position);
        }
    }
}

fn non_empty(handle: &str) -> Option<String> {
    (!handle.is_empty()).then(|| handle.to_string())
}
