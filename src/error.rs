use crate::catalog::PortType;
use thiserror::Error;

/// Reasons a candidate connection is refused at the connection boundary.
///
/// A rejection never enters the model and is never thrown; `GraphModel::connect`
/// returns it so interactive callers can explain why a drag was refused.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConnectionRejection {
    #[error("Connection is missing its {0}")]
    MissingEndpoint(&'static str),

    #[error("Node '{0}' cannot be connected to itself")]
    SelfLoop(String),

    #[error("Node '{0}' does not exist in the graph")]
    UnknownNode(String),

    #[error("Node '{node_id}' has no {direction} port named '{port}'")]
    UnknownPort {
        node_id: String,
        port: String,
        direction: &'static str,
    },

    #[error("Port type mismatch: {source_type} cannot feed {target_type}")]
    TypeMismatch {
        source_type: PortType,
        target_type: PortType,
    },

    #[error("Input '{port}' on node '{node_id}' is already connected")]
    PortOccupied { node_id: String, port: String },
}

/// Errors raised while talking to the remote execution service.
#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Request failed ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Failed to deserialize response: {0}")]
    Deserialize(#[from] serde_json::Error),

    #[error("Execution service error: {0}")]
    Service(String),
}

/// Errors that can occur while reading or writing graph documents, catalogs and
/// config files.
#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("Could not access '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Errors produced while assembling an `OrchestratorConfig`.
#[derive(Error, Debug, Clone)]
pub enum ConfigError {
    #[error("Environment variable '{name}' has invalid value '{value}': {message}")]
    InvalidEnv {
        name: String,
        value: String,
        message: String,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
