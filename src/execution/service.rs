use super::result::RawGraphResult;
use crate::codec::WireGraph;
use crate::error::ExecutionError;
use async_trait::async_trait;
use std::sync::Arc;

/// The remote engine that actually runs a graph.
///
/// Implementations return the raw per-node-keyed response; normalization into
/// `GraphResult` is the orchestrator's job.
#[async_trait]
pub trait ExecutionService: Send + Sync {
    async fn execute_graph(&self, graph: &WireGraph) -> Result<RawGraphResult, ExecutionError>;
}

#[async_trait]
impl<S: ExecutionService + ?Sized> ExecutionService for Arc<S> {
    async fn execute_graph(&self, graph: &WireGraph) -> Result<RawGraphResult, ExecutionError> {
        (**self).execute_graph(graph).await
    }
}

#[async_trait]
impl<S: ExecutionService + ?Sized> ExecutionService for Box<S> {
    async fn execute_graph(&self, graph: &WireGraph) -> Result<RawGraphResult, ExecutionError> {
        (**self).execute_graph(graph).await
    }
}
