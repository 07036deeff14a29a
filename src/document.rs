use crate::catalog::ModuleCatalog;
use crate::codec::{WireCodec, WireEdge, WireGraph, WireNode};
use crate::error::DocumentError;
use crate::graph::{Graph, NodeConfig, Position};
use serde::{Deserialize, Serialize};
use std::fs;

/// A node as stored in an exported graph file. Unlike the wire form it keeps the
/// canvas position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentNode {
    pub id: String,
    #[serde(rename = "type")]
    pub module_type: String,
    #[serde(default)]
    pub config: NodeConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentEdge {
    pub source: String,
    #[serde(default)]
    pub source_handle: Option<String>,
    pub target: String,
    #[serde(default)]
    pub target_handle: Option<String>,
}

/// The `graph.json` export format.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphDocument {
    pub nodes: Vec<DocumentNode>,
    pub edges: Vec<DocumentEdge>,
}

impl GraphDocument {
    pub fn from_graph(graph: &Graph) -> Self {
        let nodes = graph
            .nodes
            .iter()
            .map(|n| DocumentNode {
                id: n.id.clone(),
                module_type: n.module_type.clone(),
                config: n.config.clone(),
                position: n.position,
            })
            .collect();
        let edges = graph
            .edges
            .iter()
            .map(|e| DocumentEdge {
                source: e.source.clone(),
                source_handle: e.source_handle.clone(),
                target: e.target.clone(),
                target_handle: e.target_handle.clone(),
            })
            .collect();
        Self { nodes, edges }
    }

    /// Resolves the document against the catalog the same way `WireCodec::decode`
    /// does, then restores the stored positions.
    pub fn to_graph(&self, catalog: &ModuleCatalog) -> Graph {
        let mut graph = WireCodec::decode(&self.to_wire(), catalog);
        for (node, stored) in graph.nodes.iter_mut().zip(&self.nodes) {
            node.position = stored.position;
        }
        graph
    }

    pub fn to_wire(&self) -> WireGraph {
        WireGraph {
            nodes: self
                .nodes
                .iter()
                .map(|n| WireNode {
                    id: n.id.clone(),
                    module_type: n.module_type.clone(),
                    config: n.config.clone(),
                })
                .collect(),
            edges: self
                .edges
                .iter()
                .map(|e| WireEdge {
                    source_node: e.source.clone(),
                    source_port: e.source_handle.clone().unwrap_or_default(),
                    target_node: e.target.clone(),
                    target_port: e.target_handle.clone().unwrap_or_default(),
                })
                .collect(),
        }
    }

    pub fn from_json(json: &str) -> Result<Self, DocumentError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, DocumentError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_file(path: &str) -> Result<Self, DocumentError> {
        let content = fs::read_to_string(path).map_err(|source| DocumentError::Io {
            path: path.to_string(),
            source,
        })?;
        Self::from_json(&content)
    }

    pub fn save(&self, path: &str) -> Result<(), DocumentError> {
        fs::write(path, self.to_json()?).map_err(|source| DocumentError::Io {
            path: path.to_string(),
            source,
        })
    }
}
