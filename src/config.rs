use crate::error::{ConfigError, DocumentError};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://localhost:8080";
pub const DEFAULT_STEP_DELAY_MS: u64 = 200;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_EXECUTION_HISTORY_CAP: usize = 20;

pub const ENV_API_URL: &str = "MODGRAPH_API_URL";
pub const ENV_STEP_DELAY_MS: &str = "MODGRAPH_STEP_DELAY_MS";
pub const ENV_REQUEST_TIMEOUT_SECS: &str = "MODGRAPH_REQUEST_TIMEOUT_SECS";

/// Settings for the execution service client and the replay loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Base URL of the execution service.
    pub api_url: String,
    /// Pause between replay steps. Visual pacing only.
    pub step_delay_ms: u64,
    pub request_timeout_secs: u64,
    /// Number of past runs kept in the execution history.
    pub execution_history_cap: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            step_delay_ms: DEFAULT_STEP_DELAY_MS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            execution_history_cap: DEFAULT_EXECUTION_HISTORY_CAP,
        }
    }
}

impl OrchestratorConfig {
    /// Defaults overlaid with any `MODGRAPH_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_overrides(|name| std::env::var(name).ok())
    }

    /// Loads a JSON config file. Missing keys fall back to their defaults, and the
    /// result is validated like an environment-derived config.
    pub fn from_file(path: &str) -> Result<Self, DocumentError> {
        let content = std::fs::read_to_string(path).map_err(|source| DocumentError::Io {
            path: path.to_string(),
            source,
        })?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Applies overrides looked up by variable name. Split out from `from_env` so the
    /// parsing rules can be exercised without touching the process environment.
    pub fn with_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(url) = lookup(ENV_API_URL) {
            self.api_url = url;
        }
        if let Some(raw) = lookup(ENV_STEP_DELAY_MS) {
            self.step_delay_ms = parse_env(ENV_STEP_DELAY_MS, &raw)?;
        }
        if let Some(raw) = lookup(ENV_REQUEST_TIMEOUT_SECS) {
            self.request_timeout_secs = parse_env(ENV_REQUEST_TIMEOUT_SECS, &raw)?;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    pub fn with_step_delay(mut self, delay: Duration) -> Self {
        self.step_delay_ms = delay.as_millis() as u64;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout_secs = timeout.as_secs();
        self
    }

    pub fn with_execution_history_cap(mut self, cap: usize) -> Self {
        self.execution_history_cap = cap;
        self
    }

    pub fn step_delay(&self) -> Duration {
        Duration::from_millis(self.step_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.execution_history_cap == 0 {
            return Err(ConfigError::Invalid(
                "execution_history_cap must be at least 1".to_string(),
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "request_timeout_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_env(name: &str, raw: &str) -> Result<u64, ConfigError> {
    raw.trim()
        .parse()
        .map_err(|e: std::num::ParseIntError| ConfigError::InvalidEnv {
            name: name.to_string(),
            value: raw.to_string(),
            message: e.to_string(),
        })
}
