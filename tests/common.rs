//! Common test utilities for building catalogs, graphs and scripted services.
use async_trait::async_trait;
use modgraph::error::ExecutionError;
use modgraph::execution::RawGraphResult;
use modgraph::prelude::*;
use serde_json::json;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Catalog with a small text-to-tensor pipeline.
///
/// TextInput(text) -> Tokenizer(text -> token_ids) -> Embedding(token_ids -> embeddings)
/// -> LayerNorm(x, gamma? -> out), plus Add(a, b -> out) and ScalarInput(value).
#[allow(dead_code)]
pub fn create_catalog() -> ModuleCatalog {
    ModuleCatalog::from_json(CATALOG_JSON).expect("fixture catalog must parse")
}

#[allow(dead_code)]
pub const CATALOG_JSON: &str = r#"{
  "modules": [
    {
      "type": "TextInput",
      "category": "input",
      "description": "Provides a text string",
      "default_config": {"text": "hello world"},
      "inputs": [],
      "outputs": [{"name": "text", "type": "TEXT", "optional": false}]
    },
    {
      "type": "Tokenizer",
      "category": "preprocessing",
      "description": "Byte-pair tokenizer",
      "default_config": {"vocab_size": 256},
      "inputs": [{"name": "text", "type": "TEXT", "optional": false}],
      "outputs": [{"name": "token_ids", "type": "TOKEN_IDS", "optional": false}]
    },
    {
      "type": "Embedding",
      "category": "embedding",
      "description": "Token embedding lookup",
      "default_config": {"vocab_size": 256, "d_model": 16},
      "inputs": [{"name": "token_ids", "type": "TOKEN_IDS", "optional": false}],
      "outputs": [{"name": "embeddings", "type": "TENSOR", "optional": false}]
    },
    {
      "type": "LayerNorm",
      "category": "normalization",
      "description": "Layer normalization",
      "default_config": {"eps": 0.00001},
      "inputs": [
        {"name": "x", "type": "TENSOR", "optional": false},
        {"name": "gamma", "type": "TENSOR", "optional": true}
      ],
      "outputs": [{"name": "out", "type": "TENSOR", "optional": false}]
    },
    {
      "type": "Add",
      "category": "math",
      "description": "Element-wise addition",
      "default_config": {},
      "inputs": [
        {"name": "a", "type": "TENSOR", "optional": false},
        {"name": "b", "type": "TENSOR", "optional": false}
      ],
      "outputs": [{"name": "out", "type": "TENSOR", "optional": false}]
    },
    {
      "type": "ScalarInput",
      "category": "input",
      "description": "Provides a scalar",
      "default_config": {"value": 1.0},
      "inputs": [],
      "outputs": [{"name": "value", "type": "SCALAR", "optional": false}]
    }
  ]
}"#;

/// Builds a node from the fixture catalog at the origin.
#[allow(dead_code)]
pub fn node(catalog: &ModuleCatalog, module_type: &str, id: &str) -> Node {
    catalog
        .instantiate(module_type, id, Position::default())
        .expect("module type must exist in the fixture catalog")
}

/// A node whose ports are plain `in`/`out` tensors, for pure structure tests.
#[allow(dead_code)]
pub fn passthrough_node(id: &str) -> Node {
    Node {
        id: id.to_string(),
        module_type: "Passthrough".to_string(),
        category: "math".to_string(),
        label: id.to_string(),
        config: NodeConfig::new(),
        inputs: vec![Port::optional("in", PortType::Tensor)],
        outputs: vec![Port::required("out", PortType::Tensor)],
        position: Some(Position::default()),
    }
}

/// The two-node scenario: `t1.text -> k1.text`.
#[allow(dead_code)]
pub fn create_text_pipeline(catalog: &ModuleCatalog) -> GraphModel {
    let mut model = GraphModel::new();
    model.add_node(node(catalog, "TextInput", "t1"));
    model.add_node(node(catalog, "Tokenizer", "k1"));
    model
        .connect(&Connection::new("t1", "text", "k1", "text"))
        .expect("text pipeline edge must be accepted");
    model
}

/// Raw service response for the text pipeline.
#[allow(dead_code)]
pub fn text_pipeline_response() -> RawGraphResult {
    serde_json::from_value(json!({
        "nodes": {
            "k1": {
                "type": "Tokenizer",
                "execution_time_ms": 1.5,
                "outputs": {"token_ids": {"type": "TOKEN_IDS", "value": [104, 105]}}
            },
            "t1": {
                "type": "TextInput",
                "execution_time_ms": 0.2,
                "outputs": {"text": {"type": "TEXT", "value": "hi"}}
            }
        },
        "execution_order": ["t1", "k1"],
        "total_time_ms": 1.7
    }))
    .expect("fixture response must parse")
}

/// How a `ScriptedService` answers.
#[allow(dead_code)]
pub enum Reply {
    Respond(RawGraphResult),
    Fail(String),
}

/// In-memory `ExecutionService` that returns a fixed reply and records each request.
#[allow(dead_code)]
pub struct ScriptedService {
    reply: Reply,
    calls: AtomicUsize,
    last_request: Mutex<Option<WireGraph>>,
}

#[allow(dead_code)]
impl ScriptedService {
    pub fn responding(result: RawGraphResult) -> Self {
        Self::new(Reply::Respond(result))
    }

    pub fn failing(message: &str) -> Self {
        Self::new(Reply::Fail(message.to_string()))
    }

    fn new(reply: Reply) -> Self {
        Self {
            reply,
            calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<WireGraph> {
        self.last_request.lock().unwrap().clone()
    }
}

#[async_trait]
impl ExecutionService for ScriptedService {
    async fn execute_graph(
        &self,
        graph: &WireGraph,
    ) -> std::result::Result<RawGraphResult, ExecutionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().unwrap() = Some(graph.clone());
        match &self.reply {
            Reply::Respond(result) => Ok(result.clone()),
            Reply::Fail(message) => Err(ExecutionError::Service(message.clone())),
        }
    }
}
