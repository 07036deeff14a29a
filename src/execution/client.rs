//! HTTP client for the execution service.

use super::result::RawGraphResult;
use super::service::ExecutionService;
use crate::catalog::{ModuleCatalog, ModulesResponse};
use crate::codec::{WireEdge, WireGraph, WireNode};
use crate::config::OrchestratorConfig;
use crate::error::ExecutionError;
use async_trait::async_trait;
use reqwest::{Client as HttpClient, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Error bodies longer than this are cut before being shown to the user.
const MAX_ERROR_BODY: usize = 200;

/// A ready-made graph offered by the service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresetGraph {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub nodes: Vec<WireNode>,
    pub edges: Vec<WireEdge>,
}

impl PresetGraph {
    pub fn to_wire(&self) -> WireGraph {
        WireGraph {
            nodes: self.nodes.clone(),
            edges: self.edges.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresetsResponse {
    pub presets: Vec<PresetGraph>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// `ExecutionService` that talks to the backend over HTTP.
///
/// # Example
///
/// ```no_run
/// use modgraph::config::OrchestratorConfig;
/// use modgraph::execution::HttpExecutionService;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let service = HttpExecutionService::new(&OrchestratorConfig::default())?;
/// let catalog = service.fetch_modules().await?;
/// println!("{} modules available", catalog.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpExecutionService {
    base_url: String,
    http: HttpClient,
}

impl HttpExecutionService {
    pub fn new(config: &OrchestratorConfig) -> Result<Self, ExecutionError> {
        let base_url = config.api_url.trim_end_matches('/').to_string();
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(ExecutionError::InvalidUrl(format!(
                "URL must start with http:// or https://, got: {}",
                config.api_url
            )));
        }

        let http = HttpClient::builder()
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self { base_url, http })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        let path = path.strip_prefix('/').unwrap_or(path);
        format!("{}/api/v1/{}", self.base_url, path)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ExecutionError> {
        let url = self.url(path);
        debug!(%url, "GET");
        let response = self.http.get(&url).send().await?;
        Self::handle_response(response).await
    }

    async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ExecutionError> {
        let url = self.url(path);
        debug!(%url, "POST");
        let response = self.http.post(&url).json(body).send().await?;
        Self::handle_response(response).await
    }

    async fn handle_response<T: DeserializeOwned>(response: Response) -> Result<T, ExecutionError> {
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(ExecutionError::Api {
                status: status.as_u16(),
                message: truncate_body(&body),
            });
        }
        Ok(serde_json::from_str(&body)?)
    }

    pub async fn fetch_modules(&self) -> Result<ModuleCatalog, ExecutionError> {
        let response: ModulesResponse = self.get("modules").await?;
        Ok(ModuleCatalog::from_modules(response.modules))
    }

    pub async fn fetch_presets(&self) -> Result<Vec<PresetGraph>, ExecutionError> {
        let response: PresetsResponse = self.get("presets").await?;
        Ok(response.presets)
    }

    pub async fn health(&self) -> Result<HealthResponse, ExecutionError> {
        self.get("health").await
    }
}

#[async_trait]
impl ExecutionService for HttpExecutionService {
    async fn execute_graph(&self, graph: &WireGraph) -> Result<RawGraphResult, ExecutionError> {
        self.post("execute", graph).await
    }
}

/// Shortens an error body to `MAX_ERROR_BODY` characters, marking the cut.
pub fn truncate_body(body: &str) -> String {
    if body.chars().count() > MAX_ERROR_BODY {
        let head: String = body.chars().take(MAX_ERROR_BODY).collect();
        format!("{}...", head)
    } else {
        body.to_string()
    }
}
