use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::config::{
    DEFAULT_ANOMALY_THRESHOLD, DEFAULT_API_VERSION, DEFAULT_BIND, DEFAULT_CONTAINER,
    DEFAULT_DEPLOYMENT, DEFAULT_MAX_TOKENS, DEFAULT_QUESTION, DEFAULT_TEMPERATURE,
    DEFAULT_TIMEOUT_SECS,
};
use crate::errors::ConfigError;

const DEFAULT_CONFIG_PATH: &str = ".cost-agent/config.json";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub llm: LlmConfig,
    pub storage: StorageConfig,
    pub pipeline: PipelineConfig,
    pub server: ServerConfig,
}

impl AppConfig {
    /// Defaults, then the JSON file (if present), then the process environment.
    /// A `.env` file in the working directory is loaded first.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        let mut config = match path {
            Some(path) => Self::load_file(path)?,
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_PATH);
                if default_path.exists() {
                    Self::load_file(default_path)?
                } else {
                    Self::default()
                }
            }
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn load_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Overlay values from an environment lookup. Empty values are ignored.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("AZURE_OPENAI_ENDPOINT") {
            self.llm.endpoint = v;
        }
        if let Some(v) = get("AZURE_OPENAI_API_KEY") {
            self.llm.api_key = v;
        }
        if let Some(v) = get("AZURE_OPENAI_DEPLOYMENT") {
            self.llm.deployment = v;
        }
        if let Some(v) = get("AZURE_OPENAI_API_VERSION") {
            self.llm.api_version = v;
        }
        if let Some(v) = get("AZURE_STORAGE_CONNECTION_STRING") {
            self.storage.connection_string = Some(v);
        }
        if let Some(v) = get("BLOB_CONTAINER_NAME") {
            self.storage.container_name = v;
        }
        if let Some(v) = get("COST_AGENT_LOCAL_DIR") {
            self.storage.local_dir = Some(v);
        }
        if let Some(v) = get("COST_AGENT_BIND") {
            self.server.bind = v;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.llm.endpoint.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "llm.endpoint is empty (set AZURE_OPENAI_ENDPOINT)".to_string(),
            ));
        }
        if self.llm.api_key.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "llm.api_key is empty (set AZURE_OPENAI_API_KEY)".to_string(),
            ));
        }
        if self.storage.connection_string.is_none() && self.storage.local_dir.is_none() {
            return Err(ConfigError::Invalid(
                "no storage target (set AZURE_STORAGE_CONNECTION_STRING or COST_AGENT_LOCAL_DIR)"
                    .to_string(),
            ));
        }
        if self.storage.container_name.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "storage.container_name is empty".to_string(),
            ));
        }
        if !self.pipeline.anomaly_threshold.is_finite() {
            return Err(ConfigError::Invalid(
                "pipeline.anomaly_threshold must be finite".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub endpoint: String,
    pub api_key: String,
    pub deployment: String,
    pub api_version: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            api_key: String::new(),
            deployment: DEFAULT_DEPLOYMENT.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connection_string: Option<String>,
    pub container_name: String,
    /// Write reports to this directory instead of blob storage.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_dir: Option<String>,
    pub timeout_secs: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            connection_string: None,
            container_name: DEFAULT_CONTAINER.to_string(),
            local_dir: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub anomaly_threshold: f64,
    pub default_question: String,
    /// Directory for the per-stage JSONL event log; disabled when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            anomaly_threshold: DEFAULT_ANOMALY_THRESHOLD,
            default_question: DEFAULT_QUESTION.to_string(),
            log_dir: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
        }
    }
}
