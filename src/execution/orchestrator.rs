use super::clock::{Clock, TokioClock};
use super::history::ExecutionHistory;
use super::observer::{ExecutionEvent, ExecutionObserver, IdSet, UserMessage};
use super::result::{GraphResult, ResultsMap, RunSummary};
use super::service::ExecutionService;
use crate::codec::WireCodec;
use crate::config::OrchestratorConfig;
use crate::graph::Graph;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Published view of the current run. Collections are replaced, never edited in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecutionState {
    pub is_executing: bool,
    pub executing_node_id: Option<String>,
    pub results: Arc<ResultsMap>,
    pub flowing_edge_ids: Arc<IdSet>,
    pub completed_node_ids: Arc<IdSet>,
    /// Incremented every time `results` is republished.
    pub results_version: u64,
}

/// How a call to `execute` ended.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionOutcome {
    /// The graph had no nodes; the service was not contacted.
    NoNodes,
    /// Validation found errors; the service was not contacted.
    Rejected { errors: usize },
    /// The call failed or the service reported an error. Nothing was published.
    Failed { message: String },
    /// The call succeeded but returned no node results.
    Empty,
    Completed(RunSummary),
}

/// Dispatches a graph to the execution service and replays the result step by step.
///
/// Runs are single-flight by convention: callers check `is_executing` before
/// starting another one. Each run works on the graph it was given at call time, so
/// later edits to the live graph do not affect a replay in progress.
pub struct ExecutionOrchestrator<S, C = TokioClock> {
    service: S,
    clock: C,
    config: OrchestratorConfig,
    state: ExecutionState,
    history: ExecutionHistory,
    observers: Vec<Box<dyn ExecutionObserver>>,
}

impl<S: ExecutionService> ExecutionOrchestrator<S, TokioClock> {
    pub fn new(service: S, config: OrchestratorConfig) -> Self {
        Self::with_clock(service, TokioClock, config)
    }
}

impl<S: ExecutionService, C: Clock> ExecutionOrchestrator<S, C> {
    pub fn with_clock(service: S, clock: C, config: OrchestratorConfig) -> Self {
        let history = ExecutionHistory::with_capacity(config.execution_history_cap);
        Self {
            service,
            clock,
            config,
            state: ExecutionState::default(),
            history,
            observers: Vec::new(),
        }
    }

    pub fn add_observer(&mut self, observer: Box<dyn ExecutionObserver>) {
        self.observers.push(observer);
    }

    pub fn state(&self) -> &ExecutionState {
        &self.state
    }

    pub fn is_executing(&self) -> bool {
        self.state.is_executing
    }

    pub fn results(&self) -> Arc<ResultsMap> {
        Arc::clone(&self.state.results)
    }

    pub fn history(&self) -> &ExecutionHistory {
        &self.history
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub async fn execute(&mut self, graph: &Graph) -> ExecutionOutcome {
        if graph.nodes.is_empty() {
            self.notify(UserMessage::error("No nodes in the graph"));
            return ExecutionOutcome::NoNodes;
        }

        let snapshot = graph.clone();
        self.state.is_executing = true;
        self.state.executing_node_id = None;
        self.state.completed_node_ids = Arc::new(IdSet::new());
        self.emit(ExecutionEvent::Started);

        let outcome = self.dispatch_and_replay(&snapshot).await;

        self.finish();
        outcome
    }

    async fn dispatch_and_replay(&mut self, graph: &Graph) -> ExecutionOutcome {
        let wire = WireCodec::encode(graph);
        info!(
            nodes = wire.nodes.len(),
            edges = wire.edges.len(),
            "Dispatching graph for execution"
        );

        let result: GraphResult = match self.service.execute_graph(&wire).await {
            Ok(raw) => raw.into(),
            Err(e) => {
                warn!(error = %e, "Execution request failed");
                let message = e.to_string();
                self.notify(UserMessage::error(message.clone()));
                return ExecutionOutcome::Failed { message };
            }
        };

        if !result.error.is_empty() {
            warn!(error = %result.error, "Execution service reported an error");
            let message = format!("Graph error: {}", result.error);
            self.notify(UserMessage::error(message.clone()));
            return ExecutionOutcome::Failed { message };
        }

        if result.node_results.is_empty() {
            warn!("Execution returned no node results");
            self.notify(UserMessage::warning("Execution returned no node results"));
            return ExecutionOutcome::Empty;
        }

        self.replay(graph, &result).await;

        let timestamp = self.clock.now_millis();
        let snapshot_id = self.history.add_snapshot(&result, timestamp).id.clone();
        debug!(%snapshot_id, "Recorded execution snapshot");

        let summary = RunSummary::from_result(&result);
        info!(
            nodes = summary.node_count,
            total_time_ms = summary.total_time_ms,
            errors = summary.error_count,
            "Execution finished"
        );
        self.notify(UserMessage::success(summary.headline(), summary.detail()));
        ExecutionOutcome::Completed(summary)
    }

    /// Walks `execution_order`, publishing one node's result per step.
    async fn replay(&mut self, graph: &Graph, result: &GraphResult) {
        let mut running = ResultsMap::new();
        let delay = self.config.step_delay();

        for node_id in &result.execution_order {
            debug!(%node_id, "Replaying node");
            self.state.executing_node_id = Some(node_id.clone());
            self.emit(ExecutionEvent::NodeExecuting {
                node_id: Some(node_id.clone()),
            });

            if let Some(node_result) = result.node_result(node_id) {
                running.insert(node_id.clone(), node_result.clone());
                self.publish_results(running.clone());
            }

            let outgoing = graph.outgoing_edge_ids(node_id);
            if !outgoing.is_empty() {
                let mut flowing = (*self.state.flowing_edge_ids).clone();
                flowing.extend(outgoing.iter().cloned());
                self.publish_flowing(flowing);
            }

            let mut completed = (*self.state.completed_node_ids).clone();
            completed.insert(node_id.clone());
            self.state.completed_node_ids = Arc::new(completed);
            self.emit(ExecutionEvent::NodeCompleted {
                node_id: node_id.clone(),
                completed: Arc::clone(&self.state.completed_node_ids),
            });

            self.clock.sleep(delay).await;

            if !outgoing.is_empty() {
                let mut flowing = (*self.state.flowing_edge_ids).clone();
                for edge_id in &outgoing {
                    flowing.remove(edge_id);
                }
                self.publish_flowing(flowing);
            }
        }

        self.state.executing_node_id = None;
        self.emit(ExecutionEvent::NodeExecuting { node_id: None });

        // Results the service returned for nodes missing from the order.
        let before = running.len();
        for node_result in &result.node_results {
            if !running.contains_key(&node_result.node_id) {
                running.insert(node_result.node_id.clone(), node_result.clone());
            }
        }
        if running.len() != before {
            debug!(
                extra = running.len() - before,
                "Merged results absent from execution order"
            );
            self.publish_results(running);
        }
    }

    /// Republishes a past run's results without contacting the service.
    pub fn restore_snapshot(&mut self, snapshot_id: &str) -> bool {
        match self.history.restore(snapshot_id) {
            Some(results) => {
                info!(%snapshot_id, "Restoring execution snapshot");
                self.state.results_version += 1;
                self.state.results = results;
                self.emit(ExecutionEvent::ResultsPublished {
                    version: self.state.results_version,
                    results: Arc::clone(&self.state.results),
                });
                true
            }
            None => false,
        }
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    /// Drops current results and animation markers.
    pub fn clear_results(&mut self) {
        self.publish_results(ResultsMap::new());
        self.state.executing_node_id = None;
        self.state.completed_node_ids = Arc::new(IdSet::new());
        self.publish_flowing(IdSet::new());
    }

    fn publish_results(&mut self, results: ResultsMap) {
        self.state.results_version += 1;
        self.state.results = Arc::new(results);
        self.emit(ExecutionEvent::ResultsPublished {
            version: self.state.results_version,
            results: Arc::clone(&self.state.results),
        });
    }

    fn publish_flowing(&mut self, edge_ids: IdSet) {
        self.state.flowing_edge_ids = Arc::new(edge_ids);
        self.emit(ExecutionEvent::FlowingEdgesChanged {
            edge_ids: Arc::clone(&self.state.flowing_edge_ids),
        });
    }

    /// Resets the transient run flags. Runs on every exit path of `execute`.
    fn finish(&mut self) {
        self.state.is_executing = false;
        self.state.executing_node_id = None;
        if !self.state.flowing_edge_ids.is_empty() {
            self.publish_flowing(IdSet::new());
        }
        self.emit(ExecutionEvent::Finished);
    }

    pub(crate) fn notify(&mut self, message: UserMessage) {
        self.emit(ExecutionEvent::Message(message));
    }

    fn emit(&mut self, event: ExecutionEvent) {
        for observer in &mut self.observers {
            observer.on_event(&event);
        }
    }
}
