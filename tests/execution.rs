//! Tests for dispatching graphs and replaying their results.
mod common;
use common::*;
use modgraph::execution::{ExecutionSnapshot, MessageLevel, RawGraphResult};
use modgraph::prelude::*;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

type TestOrchestrator = ExecutionOrchestrator<Arc<ScriptedService>, Arc<ManualClock>>;

fn orchestrator(service: &Arc<ScriptedService>, clock: &Arc<ManualClock>) -> TestOrchestrator {
    ExecutionOrchestrator::with_clock(
        Arc::clone(service),
        Arc::clone(clock),
        OrchestratorConfig::default(),
    )
}

fn observed(orchestrator: &mut TestOrchestrator) -> EventLog {
    let log = EventLog::new();
    orchestrator.add_observer(Box::new(log.clone()));
    log
}

fn raw(value: serde_json::Value) -> RawGraphResult {
    serde_json::from_value(value).unwrap()
}

mod orchestrator_tests {
    use super::*;

    #[tokio::test]
    async fn test_empty_graph_never_reaches_service() {
        let service = Arc::new(ScriptedService::responding(text_pipeline_response()));
        let clock = Arc::new(ManualClock::new());
        let mut orchestrator = orchestrator(&service, &clock);
        let log = observed(&mut orchestrator);

        let outcome = orchestrator.execute(&Graph::default()).await;

        assert_eq!(outcome, ExecutionOutcome::NoNodes);
        assert_eq!(service.calls(), 0);
        assert!(orchestrator.results().is_empty());
        assert!(!orchestrator.is_executing());
        let messages = log.messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].level, MessageLevel::Error);
        assert_eq!(messages[0].text, "No nodes in the graph");
    }

    #[tokio::test]
    async fn test_text_pipeline_replays_in_execution_order() {
        let catalog = create_catalog();
        let model = create_text_pipeline(&catalog);
        let service = Arc::new(ScriptedService::responding(text_pipeline_response()));
        let clock = Arc::new(ManualClock::starting_at(1_000));
        let mut orchestrator = orchestrator(&service, &clock);

        let outcome = orchestrator.execute(model.graph()).await;

        let ExecutionOutcome::Completed(summary) = outcome else {
            panic!("expected a completed run");
        };
        assert_eq!(summary.node_count, 2);
        assert_eq!(summary.headline(), "Executed 2 nodes in 1.7ms");

        let results = orchestrator.results();
        let keys: Vec<&str> = results.keys().map(|k| k.as_str()).collect();
        assert_eq!(keys, vec!["t1", "k1"]);
        assert_eq!(results["k1"].node_type, "Tokenizer");
        assert_eq!(
            results["k1"].outputs["token_ids"].value,
            Some(json!([104, 105]))
        );

        assert_eq!(orchestrator.history().len(), 1);
        let snapshot = orchestrator.history().latest().unwrap();
        assert_eq!(snapshot.execution_order, vec!["t1", "k1"]);
        assert_eq!(snapshot.timestamp_ms, 1_400);
        assert!(snapshot.id.starts_with("exec_"));

        assert_eq!(clock.sleeps(), vec![Duration::from_millis(200); 2]);
        assert!(!orchestrator.is_executing());
        assert_eq!(orchestrator.state().executing_node_id, None);
        assert!(orchestrator.state().flowing_edge_ids.is_empty());
        assert_eq!(orchestrator.state().completed_node_ids.len(), 2);
    }

    #[tokio::test]
    async fn test_request_carries_encoded_graph() {
        let catalog = create_catalog();
        let model = create_text_pipeline(&catalog);
        let service = Arc::new(ScriptedService::responding(text_pipeline_response()));
        let clock = Arc::new(ManualClock::new());
        let mut orchestrator = orchestrator(&service, &clock);

        orchestrator.execute(model.graph()).await;

        assert_eq!(service.calls(), 1);
        assert_eq!(service.last_request(), Some(WireCodec::encode(model.graph())));
    }

    #[tokio::test]
    async fn test_replay_publishes_one_node_per_step() {
        let catalog = create_catalog();
        let model = create_text_pipeline(&catalog);
        let service = Arc::new(ScriptedService::responding(text_pipeline_response()));
        let clock = Arc::new(ManualClock::new());
        let mut orchestrator = orchestrator(&service, &clock);
        let log = observed(&mut orchestrator);

        orchestrator.execute(model.graph()).await;

        let events = log.events();
        assert_eq!(events.first(), Some(&ExecutionEvent::Started));
        assert_eq!(events.last(), Some(&ExecutionEvent::Finished));

        let executing: Vec<Option<String>> = events
            .iter()
            .filter_map(|e| match e {
                ExecutionEvent::NodeExecuting { node_id } => Some(node_id.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(
            executing,
            vec![Some("t1".to_string()), Some("k1".to_string()), None]
        );

        let published: Vec<usize> = events
            .iter()
            .filter_map(|e| match e {
                ExecutionEvent::ResultsPublished { results, .. } => Some(results.len()),
                _ => None,
            })
            .collect();
        assert_eq!(published, vec![1, 2]);

        let flowing: Vec<usize> = events
            .iter()
            .filter_map(|e| match e {
                ExecutionEvent::FlowingEdgesChanged { edge_ids } => Some(edge_ids.len()),
                _ => None,
            })
            .collect();
        // t1 lights its outgoing edge for one step; k1 has none.
        assert_eq!(flowing, vec![1, 0]);
    }

    #[tokio::test]
    async fn test_service_failure_leaves_state_clean() {
        let catalog = create_catalog();
        let model = create_text_pipeline(&catalog);
        let service = Arc::new(ScriptedService::failing("connection refused"));
        let clock = Arc::new(ManualClock::new());
        let mut orchestrator = orchestrator(&service, &clock);
        let log = observed(&mut orchestrator);

        let outcome = orchestrator.execute(model.graph()).await;

        assert_eq!(
            outcome,
            ExecutionOutcome::Failed {
                message: "Execution service error: connection refused".to_string()
            }
        );
        assert!(orchestrator.history().is_empty());
        assert!(orchestrator.results().is_empty());
        assert!(!orchestrator.is_executing());
        assert!(clock.sleeps().is_empty());
        assert_eq!(log.messages()[0].level, MessageLevel::Error);
    }

    #[tokio::test]
    async fn test_graph_level_error_publishes_nothing() {
        let catalog = create_catalog();
        let model = create_text_pipeline(&catalog);
        let mut response = text_pipeline_response();
        response.error = Some("shape mismatch in k1".to_string());
        let service = Arc::new(ScriptedService::responding(response));
        let clock = Arc::new(ManualClock::new());
        let mut orchestrator = orchestrator(&service, &clock);

        let outcome = orchestrator.execute(model.graph()).await;

        assert_eq!(
            outcome,
            ExecutionOutcome::Failed {
                message: "Graph error: shape mismatch in k1".to_string()
            }
        );
        assert!(orchestrator.results().is_empty());
        assert!(orchestrator.history().is_empty());
        assert_eq!(orchestrator.state().results_version, 0);
    }

    #[tokio::test]
    async fn test_empty_response_is_a_warning() {
        let catalog = create_catalog();
        let model = create_text_pipeline(&catalog);
        let service = Arc::new(ScriptedService::responding(raw(json!({
            "nodes": {},
            "execution_order": [],
            "total_time_ms": 0.0
        }))));
        let clock = Arc::new(ManualClock::new());
        let mut orchestrator = orchestrator(&service, &clock);
        let log = observed(&mut orchestrator);

        let outcome = orchestrator.execute(model.graph()).await;

        assert_eq!(outcome, ExecutionOutcome::Empty);
        assert!(orchestrator.history().is_empty());
        assert_eq!(log.messages()[0].level, MessageLevel::Warning);
    }

    #[tokio::test]
    async fn test_results_missing_from_order_are_merged_last() {
        let catalog = create_catalog();
        let model = create_text_pipeline(&catalog);
        let service = Arc::new(ScriptedService::responding(raw(json!({
            "nodes": {
                "t1": {"type": "TextInput", "execution_time_ms": 0.1, "outputs": null},
                "k1": {"type": "Tokenizer", "execution_time_ms": 0.3, "outputs": {}}
            },
            "execution_order": ["k1"],
            "total_time_ms": 0.4
        }))));
        let clock = Arc::new(ManualClock::new());
        let mut orchestrator = orchestrator(&service, &clock);

        orchestrator.execute(model.graph()).await;

        let results = orchestrator.results();
        let keys: Vec<&str> = results.keys().map(|k| k.as_str()).collect();
        assert_eq!(keys, vec!["k1", "t1"]);
        assert!(results["t1"].outputs.is_empty());
        assert_eq!(clock.sleeps().len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_ids_in_order_are_stepped_without_results() {
        let catalog = create_catalog();
        let model = create_text_pipeline(&catalog);
        let mut response = text_pipeline_response();
        response.execution_order.insert(1, "ghost".to_string());
        let service = Arc::new(ScriptedService::responding(response));
        let clock = Arc::new(ManualClock::new());
        let mut orchestrator = orchestrator(&service, &clock);

        orchestrator.execute(model.graph()).await;

        assert_eq!(orchestrator.results().len(), 2);
        assert_eq!(clock.sleeps().len(), 3);
    }

    #[tokio::test]
    async fn test_node_errors_are_reported_in_summary() {
        let catalog = create_catalog();
        let model = create_text_pipeline(&catalog);
        let service = Arc::new(ScriptedService::responding(raw(json!({
            "nodes": {
                "t1": {"type": "TextInput", "execution_time_ms": 0.1, "outputs": {}},
                "k1": {"type": "Tokenizer", "execution_time_ms": 0.0, "error": "bad vocab"}
            },
            "execution_order": ["t1", "k1"],
            "total_time_ms": 0.1
        }))));
        let clock = Arc::new(ManualClock::new());
        let mut orchestrator = orchestrator(&service, &clock);
        let log = observed(&mut orchestrator);

        let outcome = orchestrator.execute(model.graph()).await;

        let ExecutionOutcome::Completed(summary) = outcome else {
            panic!("expected a completed run");
        };
        assert_eq!(summary.error_count, 1);
        assert!(orchestrator.results()["k1"].has_error());
        let success = log.messages().pop().unwrap();
        assert_eq!(success.level, MessageLevel::Success);
        assert_eq!(success.detail.as_deref(), Some("1 node(s) had errors"));
    }

    #[tokio::test]
    async fn test_zero_step_delay_still_replays() {
        let catalog = create_catalog();
        let model = create_text_pipeline(&catalog);
        let service = Arc::new(ScriptedService::responding(text_pipeline_response()));
        let clock = Arc::new(ManualClock::new());
        let config = OrchestratorConfig::default().with_step_delay(Duration::ZERO);
        let mut orchestrator =
            ExecutionOrchestrator::with_clock(Arc::clone(&service), Arc::clone(&clock), config);

        orchestrator.execute(model.graph()).await;

        assert_eq!(orchestrator.results().len(), 2);
        assert_eq!(clock.sleeps(), vec![Duration::ZERO; 2]);
    }

    #[tokio::test]
    async fn test_clear_results_resets_published_state() {
        let catalog = create_catalog();
        let model = create_text_pipeline(&catalog);
        let service = Arc::new(ScriptedService::responding(text_pipeline_response()));
        let clock = Arc::new(ManualClock::new());
        let mut orchestrator = orchestrator(&service, &clock);

        orchestrator.execute(model.graph()).await;
        orchestrator.clear_results();

        assert!(orchestrator.results().is_empty());
        assert!(orchestrator.state().completed_node_ids.is_empty());
        assert_eq!(orchestrator.history().len(), 1);
    }
}

mod history_tests {
    use super::*;

    #[tokio::test]
    async fn test_history_is_capped_newest_first() {
        let catalog = create_catalog();
        let model = create_text_pipeline(&catalog);
        let service = Arc::new(ScriptedService::responding(text_pipeline_response()));
        let clock = Arc::new(ManualClock::new());
        let mut orchestrator = orchestrator(&service, &clock);

        for _ in 0..25 {
            orchestrator.execute(model.graph()).await;
        }

        let history = orchestrator.history();
        assert_eq!(history.len(), 20);
        let stamps: Vec<u64> = history.iter().map(|s| s.timestamp_ms).collect();
        assert!(stamps.windows(2).all(|w| w[0] > w[1]));
        assert_eq!(history.latest().map(|s| s.timestamp_ms), Some(25 * 400));
    }

    #[tokio::test]
    async fn test_restore_snapshot_republishes_past_results() {
        let catalog = create_catalog();
        let model = create_text_pipeline(&catalog);
        let service = Arc::new(ScriptedService::responding(text_pipeline_response()));
        let clock = Arc::new(ManualClock::new());
        let mut orchestrator = orchestrator(&service, &clock);

        orchestrator.execute(model.graph()).await;
        let snapshot_id = orchestrator.history().latest().unwrap().id.clone();
        orchestrator.clear_results();
        let service_calls = service.calls();

        assert!(orchestrator.restore_snapshot(&snapshot_id));
        assert_eq!(orchestrator.results().len(), 2);
        assert_eq!(service.calls(), service_calls);
        assert!(!orchestrator.restore_snapshot("exec_missing"));
    }

    #[test]
    fn test_replay_completes_without_runtime_timers() {
        let catalog = create_catalog();
        let model = create_text_pipeline(&catalog);
        let service = Arc::new(ScriptedService::responding(text_pipeline_response()));
        let clock = Arc::new(ManualClock::new());
        let mut orchestrator = orchestrator(&service, &clock);

        let outcome = tokio_test::block_on(orchestrator.execute(model.graph()));

        assert!(matches!(outcome, ExecutionOutcome::Completed(_)));
        assert_eq!(orchestrator.history().len(), 1);
    }

    #[test]
    fn test_snapshot_ids_are_unique() {
        let mut history = ExecutionHistory::with_capacity(5);
        let result: GraphResult = text_pipeline_response().into();

        let first = history.add_snapshot(&result, 1).id.clone();
        let second = history.add_snapshot(&result, 2).id.clone();
        assert_ne!(first, second);

        let ids: Vec<&str> = history.iter().map(|s: &ExecutionSnapshot| s.id.as_str()).collect();
        assert_eq!(ids, vec![second.as_str(), first.as_str()]);
        assert_eq!(history.restore(&first).map(|r| r.len()), Some(2));
    }

    #[test]
    fn test_clear_history() {
        let mut history = ExecutionHistory::new();
        let result: GraphResult = text_pipeline_response().into();
        history.add_snapshot(&result, 1);
        history.clear();
        assert!(history.is_empty());
        assert_eq!(history.capacity(), 20);
    }
}

mod session_run_tests {
    use super::*;

    #[tokio::test]
    async fn test_invalid_graph_is_rejected_before_dispatch() {
        let catalog = create_catalog();
        let mut session = GraphSession::new();
        session.add_module(&catalog, "Tokenizer", Position::default());

        let service = Arc::new(ScriptedService::responding(text_pipeline_response()));
        let clock = Arc::new(ManualClock::new());
        let mut orchestrator = orchestrator(&service, &clock);
        let log = observed(&mut orchestrator);

        let outcome = session.run(&mut orchestrator).await;

        assert_eq!(outcome, ExecutionOutcome::Rejected { errors: 1 });
        assert_eq!(service.calls(), 0);
        assert_eq!(
            log.messages()[0].text,
            "Cannot execute: 1 validation error(s)"
        );
        assert!(!session.validation_result().unwrap().valid);
    }

    #[tokio::test]
    async fn test_warnings_do_not_block_a_run() {
        let catalog = create_catalog();
        let mut session = GraphSession::new();
        session.add_node(node(&catalog, "TextInput", "t1"));
        session.add_node(node(&catalog, "ScalarInput", "s1"));

        let service = Arc::new(ScriptedService::responding(text_pipeline_response()));
        let clock = Arc::new(ManualClock::new());
        let mut orchestrator = orchestrator(&service, &clock);

        let outcome = session.run(&mut orchestrator).await;

        assert!(matches!(outcome, ExecutionOutcome::Completed(_)));
        assert_eq!(session.validation_result().unwrap().warnings.len(), 2);
        assert_eq!(service.calls(), 1);
    }

    #[tokio::test]
    async fn test_run_dispatches_the_session_graph() {
        let catalog = create_catalog();
        let mut session = GraphSession::new();
        session.add_node(node(&catalog, "TextInput", "t1"));
        session.add_node(node(&catalog, "Tokenizer", "k1"));
        session
            .connect(&Connection::new("t1", "text", "k1", "text"))
            .unwrap();

        let service = Arc::new(ScriptedService::responding(text_pipeline_response()));
        let clock = Arc::new(ManualClock::new());
        let mut orchestrator = orchestrator(&service, &clock);

        session.run(&mut orchestrator).await;

        let request = service.last_request().unwrap();
        assert_eq!(request, WireCodec::encode(session.graph()));
        assert_eq!(request.edges.len(), 1);
    }
}
