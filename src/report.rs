use crate::catalog::PortType;
use crate::execution::{ExecutionHistory, NodeResult, ResultsMap, TensorData};
use crate::graph::Graph;
use itertools::Itertools;

/// Renders results, run history and the graph definition as a plain-text log.
pub struct ExecutionLogFormatter;

impl ExecutionLogFormatter {
    pub fn format_log(graph: &Graph, results: &ResultsMap, history: &ExecutionHistory) -> String {
        let mut lines = vec![
            "=== Execution Log ===".to_string(),
            format!("Nodes: {}, Edges: {}", graph.nodes.len(), graph.edges.len()),
            String::new(),
        ];

        if !results.is_empty() {
            lines.push("--- Current Execution Results ---".to_string());
            for (node_id, result) in results {
                let module_type = graph
                    .node(node_id)
                    .map_or("unknown", |n| n.module_type.as_str());
                lines.push(String::new());
                lines.push(format!("[{}] {}", node_id, module_type));
                lines.push(format!("  Time: {:.3}ms", result.execution_time_ms));
                if result.has_error() {
                    lines.push(format!("  ERROR: {}", result.error));
                } else {
                    Self::push_outputs(&mut lines, result);
                }
            }
            lines.push(String::new());
        }

        if !history.is_empty() {
            lines.push("--- Execution History ---".to_string());
            for snapshot in history.iter() {
                lines.push(String::new());
                lines.push(format!(
                    "Run {} at {} - {:.1}ms total",
                    snapshot.id, snapshot.timestamp_ms, snapshot.total_time_ms
                ));
                lines.push(format!(
                    "  Order: {}",
                    snapshot.execution_order.iter().join(" -> ")
                ));
                for (node_id, result) in snapshot.node_results.iter() {
                    if result.has_error() {
                        lines.push(format!(
                            "  [{}] {}: ERROR - {}",
                            node_id, result.node_type, result.error
                        ));
                    } else {
                        lines.push(format!(
                            "  [{}] {}: {:.2}ms",
                            node_id, result.node_type, result.execution_time_ms
                        ));
                        Self::push_outputs(&mut lines, result);
                    }
                }
            }
        }

        lines.push(String::new());
        lines.push("--- Graph Definition ---".to_string());
        for node in &graph.nodes {
            lines.push(format!(
                "Node: {} ({}) config={}",
                node.id,
                node.module_type,
                serde_json::Value::Object(node.config.clone())
            ));
        }
        for edge in &graph.edges {
            lines.push(format!(
                "Edge: {}:{} -> {}:{}",
                edge.source,
                edge.source_handle.as_deref().unwrap_or(""),
                edge.target,
                edge.target_handle.as_deref().unwrap_or("")
            ));
        }

        lines.join("\n")
    }

    fn push_outputs(lines: &mut Vec<String>, result: &NodeResult) {
        for (port, data) in &result.outputs {
            lines.extend(Self::format_port_output(port, data));
        }
    }

    /// Formats a single output port value.
    pub fn format_port_output(port: &str, data: &TensorData) -> Vec<String> {
        let kind = data.port_type;
        let mut lines = Vec::new();

        match kind {
            PortType::Tensor | PortType::AdTensor => {
                let shape = data
                    .shape
                    .as_ref()
                    .map_or("[]".to_string(), |s| format!("[{}]", s.iter().join("x")));
                lines.push(format!("  {}: {} {}", port, kind, shape));
                if let Some(stats) = &data.stats {
                    lines.push(format!(
                        "    stats: min={:.4}, max={:.4}, mean={:.4}, std={:.4}",
                        stats.min, stats.max, stats.mean, stats.std
                    ));
                }
                if let (Some(values), Some(shape)) = (&data.data, &data.shape) {
                    lines.push("    data:".to_string());
                    lines.push(Self::format_tensor(shape, values));
                }
                if data.truncated {
                    lines.push("    (data truncated)".to_string());
                }
                if let Some(grad) = &data.grad {
                    lines.push(format!("    gradient: [{}]", grad.shape.iter().join("x")));
                    if let Some(stats) = &grad.stats {
                        lines.push(format!(
                            "    grad stats: min={:.4}, max={:.4}, mean={:.4}, std={:.4}",
                            stats.min, stats.max, stats.mean, stats.std
                        ));
                    }
                    lines.push("    grad data:".to_string());
                    lines.push(Self::format_tensor(&grad.shape, &grad.data));
                }
            }
            PortType::TokenIds => {
                let tokens = data
                    .value
                    .as_ref()
                    .and_then(|v| v.as_array())
                    .cloned()
                    .unwrap_or_default();
                lines.push(format!("  {}: {} ({} tokens)", port, kind, tokens.len()));
                lines.push(format!("    [{}]", tokens.iter().join(", ")));
            }
            PortType::Text => {
                let text = match &data.value {
                    Some(serde_json::Value::String(s)) => s.clone(),
                    Some(other) => other.to_string(),
                    None => String::new(),
                };
                lines.push(format!("  {}: {}", port, kind));
                lines.push(format!("    \"{}\"", text));
            }
            PortType::Scalar => {
                let value = data.value.as_ref().and_then(|v| v.as_f64()).unwrap_or(f64::NAN);
                lines.push(format!("  {}: {} = {:.6}", port, kind, value));
            }
            PortType::Int => {
                let value = data
                    .value
                    .as_ref()
                    .map_or("null".to_string(), |v| v.to_string());
                lines.push(format!("  {}: {} = {}", port, kind, value));
            }
        }
        lines
    }

    /// Prints rank-2 tensors row by row and anything else as a flat list.
    /// Only rows backed by `data` are printed, whatever the declared shape says.
    fn format_tensor(shape: &[usize], data: &[f64]) -> String {
        if let [rows, cols] = shape {
            let cols = (*cols).max(1);
            let rows = (*rows).min(data.len().div_ceil(cols));
            let body = (0..rows)
                .map(|r| {
                    let row = data.iter().skip(r.saturating_mul(cols)).take(cols);
                    format!("    [{}]", row.map(|v| format!("{:>9.4}", v)).join(", "))
                })
                .join(",\n");
            format!("  [\n{}\n  ]", body)
        } else {
            format!("  [{}]", data.iter().map(|v| format!("{:.4}", v)).join(", "))
        }
    }
}
