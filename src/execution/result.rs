use crate::catalog::PortType;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Results of a run keyed by node id, in the order they were published.
pub type ResultsMap = IndexMap<String, NodeResult>;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TensorStats {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TensorGrad {
    pub shape: Vec<usize>,
    pub data: Vec<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats: Option<TensorStats>,
    #[serde(default)]
    pub truncated: bool,
}

/// One output value as serialized by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TensorData {
    #[serde(rename = "type")]
    pub port_type: PortType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shape: Option<Vec<usize>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats: Option<TensorStats>,
    #[serde(default)]
    pub truncated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grad: Option<TensorGrad>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeResult {
    pub node_id: String,
    pub node_type: String,
    pub execution_time_ms: f64,
    pub outputs: IndexMap<String, TensorData>,
    pub error: String,
}

impl NodeResult {
    pub fn has_error(&self) -> bool {
        !self.error.is_empty()
    }
}

/// Normalized result of one graph run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphResult {
    pub node_results: Vec<NodeResult>,
    pub execution_order: Vec<String>,
    pub total_time_ms: f64,
    pub error: String,
}

impl GraphResult {
    pub fn node_result(&self, node_id: &str) -> Option<&NodeResult> {
        self.node_results.iter().find(|r| r.node_id == node_id)
    }
}

/// Per-node entry of the raw service response.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawNodeResult {
    #[serde(rename = "type", default)]
    pub node_type: String,
    #[serde(default)]
    pub execution_time_ms: f64,
    #[serde(default)]
    pub outputs: Option<IndexMap<String, TensorData>>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Body of `POST /api/v1/execute`, keyed by node id.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawGraphResult {
    #[serde(default)]
    pub nodes: IndexMap<String, RawNodeResult>,
    #[serde(default)]
    pub execution_order: Vec<String>,
    #[serde(default)]
    pub total_time_ms: f64,
    #[serde(default)]
    pub error: Option<String>,
}

impl From<RawGraphResult> for GraphResult {
    fn from(raw: RawGraphResult) -> Self {
        let node_results = raw
            .nodes
            .into_iter()
            .map(|(node_id, node)| NodeResult {
                node_id,
                node_type: node.node_type,
                execution_time_ms: node.execution_time_ms,
                outputs: node.outputs.unwrap_or_default(),
                error: node.error.unwrap_or_default(),
            })
            .collect();

        GraphResult {
            node_results,
            execution_order: raw.execution_order,
            total_time_ms: raw.total_time_ms,
            error: raw.error.unwrap_or_default(),
        }
    }
}

/// Headline numbers shown to the user after a successful run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub node_count: usize,
    pub total_time_ms: f64,
    pub error_count: usize,
    pub slowest_node_type: Option<String>,
    pub slowest_time_ms: f64,
}

impl RunSummary {
    pub fn from_result(result: &GraphResult) -> Self {
        let slowest = result
            .node_results
            .iter()
            .max_by(|a, b| a.execution_time_ms.total_cmp(&b.execution_time_ms));
        Self {
            node_count: result.node_results.len(),
            total_time_ms: result.total_time_ms,
            error_count: result.node_results.iter().filter(|r| r.has_error()).count(),
            slowest_node_type: slowest.map(|r| r.node_type.clone()),
            slowest_time_ms: slowest.map_or(0.0, |r| r.execution_time_ms),
        }
    }

    pub fn headline(&self) -> String {
        format!(
            "Executed {} nodes in {:.1}ms",
            self.node_count, self.total_time_ms
        )
    }

    pub fn detail(&self) -> String {
        if self.error_count > 0 {
            format!("{} node(s) had errors", self.error_count)
        } else {
            format!(
                "Slowest: {} ({:.1}ms)",
                self.slowest_node_type.as_deref().unwrap_or("none"),
                self.slowest_time_ms
            )
        }
    }
}
