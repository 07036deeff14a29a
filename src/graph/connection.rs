use super::definition::{Connection, Graph};
use crate::error::ConnectionRejection;

/// Per-candidate edge legality check, run on every interactive drag frame.
///
/// Reads the graph it was built from and never writes, so it can be called from
/// any handler without coordination. Cost is linear in the current edge count.
pub struct ConnectionValidator<'a> {
    graph: &'a Graph,
}

impl<'a> ConnectionValidator<'a> {
    pub fn new(graph: &'a Graph) -> Self {
        Self { graph }
    }

    pub fn is_valid_connection(&self, candidate: &Connection) -> bool {
        self.check(candidate).is_ok()
    }

    /// Same as `is_valid_connection`, but reports the first rule the candidate breaks.
    pub fn check(&self, candidate: &Connection) -> Result<(), ConnectionRejection> {
        let source = present(&candidate.source, "source node")?;
        let target = present(&candidate.target, "target node")?;
        let source_handle = present(&candidate.source_handle, "source port")?;
        let target_handle = present(&candidate.target_handle, "target port")?;

        if source == target {
            return Err(ConnectionRejection::SelfLoop(source.to_string()));
        }

        let source_node = self
            .graph
            .node(source)
            .ok_or_else(|| ConnectionRejection::UnknownNode(source.to_string()))?;
        let target_node = self
            .graph
            .node(target)
            .ok_or_else(|| ConnectionRejection::UnknownNode(target.to_string()))?;

        let source_port =
            source_node
                .output(source_handle)
                .ok_or_else(|| ConnectionRejection::UnknownPort {
                    node_id: source.to_string(),
                    port: source_handle.to_string(),
                    direction: "output",
                })?;
        let target_port =
            target_node
                .input(target_handle)
                .ok_or_else(|| ConnectionRejection::UnknownPort {
                    node_id: target.to_string(),
                    port: target_handle.to_string(),
                    direction: "input",
                })?;

        if source_port.port_type != target_port.port_type {
            return Err(ConnectionRejection::TypeMismatch {
                source_type: source_port.port_type,
                target_type: target_port.port_type,
            });
        }

        // First connection wins; a second edge into the same input is refused.
        let occupied = self.graph.edges.iter().any(|e| {
            e.target == target && e.target_handle.as_deref() == Some(target_handle)
        });
        if occupied {
            return Err(ConnectionRejection::PortOccupied {
                node_id: target.to_string(),
                port: target_handle.to_string(),
            });
        }

        Ok(())
    }
}

fn present<'c>(
    field: &'c Option<String>,
    what: &'static str,
) -> Result<&'c str, ConnectionRejection> {
    match field.as_deref() {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(ConnectionRejection::MissingEndpoint(what)),
    }
}

/// Convenience wrapper for one-off checks.
pub fn is_valid_connection(graph: &Graph, candidate: &Connection) -> bool {
    ConnectionValidator::new(graph).is_valid_connection(candidate)
}
