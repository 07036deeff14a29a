//! Whole-graph static analysis run before execution.
//!
//! Four independent checks are run over one immutable snapshot and their issues are
//! merged by severity:
//!
//! 1. **Required ports**: every non-optional input has exactly one incoming edge.
//! 2. **Type consistency**: every edge still joins ports of the same type.
//! 3. **Cycles**: Kahn's algorithm must consume every node.
//! 4. **Orphans**: in a graph of more than one node, unconnected nodes are flagged.
//!
//! Only errors make a graph invalid. Orphans are warnings and never block a run.

use crate::graph::{Edge, Graph, Node};
use ahash::AHashMap;
use serde::Serialize;
use std::collections::VecDeque;
use std::fmt;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// A single finding, optionally pointing at the node or edge it concerns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    pub severity: Severity,
    pub message: String,
    pub node_id: Option<String>,
    pub edge_id: Option<String>,
}

impl ValidationIssue {
    fn error(message: String) -> Self {
        Self {
            severity: Severity::Error,
            message,
            node_id: None,
            edge_id: None,
        }
    }

    fn warning(message: String) -> Self {
        Self {
            severity: Severity::Warning,
            message,
            node_id: None,
            edge_id: None,
        }
    }

    fn on_node(mut self, node_id: &str) -> Self {
        self.node_id = Some(node_id.to_string());
        self
    }

    fn on_edge(mut self, edge_id: &str) -> Self {
        self.edge_id = Some(edge_id.to_string());
        self
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(f, "[{}] {}", level, self.message)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
    pub valid: bool,
}

/// Stateless validator. `validate` is pure and re-entrant.
pub struct GraphValidator;

impl GraphValidator {
    pub fn validate(graph: &Graph) -> ValidationResult {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        let issues = check_required_ports(graph)
            .into_iter()
            .chain(check_type_mismatches(graph))
            .chain(check_cycles(graph))
            .chain(check_orphan_nodes(graph));

        for issue in issues {
            match issue.severity {
                Severity::Error => errors.push(issue),
                Severity::Warning => warnings.push(issue),
            }
        }

        debug!(
            errors = errors.len(),
            warnings = warnings.len(),
            "Validated graph"
        );
        let valid = errors.is_empty();
        ValidationResult {
            errors,
            warnings,
            valid,
        }
    }
}

fn incoming_on<'g>(graph: &'g Graph, node: &Node, port: &str) -> Vec<&'g Edge> {
    graph
        .edges
        .iter()
        .filter(|e| e.target == node.id && e.target_handle.as_deref() == Some(port))
        .collect()
}

fn check_required_ports(graph: &Graph) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    for node in &graph.nodes {
        for input in &node.inputs {
            let incoming = incoming_on(graph, node, &input.name);
            if incoming.len() > 1 {
                issues.push(
                    ValidationIssue::error(format!(
                        "\"{}\" input \"{}\" has {} incoming connections, expected one",
                        node.module_type,
                        input.name,
                        incoming.len()
                    ))
                    .on_node(&node.id),
                );
            } else if incoming.is_empty() && !input.optional {
                issues.push(
                    ValidationIssue::error(format!(
                        "\"{}\" is missing required input \"{}\" ({})",
                        node.module_type, input.name, input.port_type
                    ))
                    .on_node(&node.id),
                );
            }
        }
    }
    issues
}

fn check_type_mismatches(graph: &Graph) -> Vec<ValidationIssue> {
    let nodes: AHashMap<&str, &Node> = graph.nodes.iter().map(|n| (n.id.as_str(), n)).collect();
    let mut issues = Vec::new();

    for edge in &graph.edges {
        let (Some(source), Some(target)) = (
            nodes.get(edge.source.as_str()),
            nodes.get(edge.target.as_str()),
        ) else {
            continue;
        };
        let source_port = edge.source_handle.as_deref().and_then(|h| source.output(h));
        let target_port = edge.target_handle.as_deref().and_then(|h| target.input(h));

        if let (Some(sp), Some(tp)) = (source_port, target_port) {
            if sp.port_type != tp.port_type {
                issues.push(
                    ValidationIssue::error(format!(
                        "Type mismatch: {}.{} ({}) -> {}.{} ({})",
                        source.module_type,
                        sp.name,
                        sp.port_type,
                        target.module_type,
                        tp.name,
                        tp.port_type
                    ))
                    .on_edge(&edge.id)
                    .on_node(&edge.target),
                );
            }
        }
    }
    issues
}

fn check_cycles(graph: &Graph) -> Vec<ValidationIssue> {
    let mut in_degree: AHashMap<&str, usize> = AHashMap::with_capacity(graph.nodes.len());
    let mut adjacency: AHashMap<&str, Vec<&str>> = AHashMap::with_capacity(graph.nodes.len());
    for node in &graph.nodes {
        in_degree.insert(node.id.as_str(), 0);
        adjacency.insert(node.id.as_str(), Vec::new());
    }

    for edge in &graph.edges {
        if !in_degree.contains_key(edge.target.as_str()) {
            continue;
        }
        if let Some(neighbors) = adjacency.get_mut(edge.source.as_str()) {
            neighbors.push(edge.target.as_str());
            *in_degree.entry(edge.target.as_str()).or_default() += 1;
        }
    }

    let mut queue: VecDeque<&str> = graph
        .nodes
        .iter()
        .map(|n| n.id.as_str())
        .filter(|id| in_degree.get(id) == Some(&0))
        .collect();

    let mut processed = 0;
    while let Some(node_id) = queue.pop_front() {
        processed += 1;
        for &neighbor in adjacency.get(node_id).into_iter().flatten() {
            if let Some(degree) = in_degree.get_mut(neighbor) {
                *degree -= 1;
                if *degree == 0 {
                    queue.push_back(neighbor);
                }
            }
        }
    }

    if processed < graph.nodes.len() {
        vec![ValidationIssue::error(format!(
            "Graph contains a cycle ({} nodes involved)",
            graph.nodes.len() - processed
        ))]
    } else {
        Vec::new()
    }
}

fn check_orphan_nodes(graph: &Graph) -> Vec<ValidationIssue> {
    if graph.nodes.len() <= 1 {
        return Vec::new();
    }
    graph
        .nodes
        .iter()
        .filter(|node| !graph.edges.iter().any(|e| e.touches(&node.id)))
        .map(|node| {
            ValidationIssue::warning(format!("\"{}\" has no connections", node.module_type))
                .on_node(&node.id)
        })
        .collect()
}
