use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

pub mod azure_openai;

use crate::app_config::LlmConfig;
use crate::errors::ProviderError;
use crate::types::ModelId;
use reqwest::Client;

pub(crate) struct ProviderHttpClient {
    client: Client,
}

impl ProviderHttpClient {
    pub fn new(timeout_secs: u64) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self { client })
    }

    pub fn into_client(self) -> Client {
        self.client
    }
}

/// Request structure for a single-prompt completion
#[derive(Debug, Clone)]
pub struct InferenceRequest {
    pub model: ModelId,
    pub prompt: String,
    pub max_tokens: u32,
    pub temperature: Option<f32>,
}

/// Response structure from a completion
#[derive(Debug, Clone)]
pub struct InferenceResponse {
    pub text: String,
    pub stop_reason: String,
    pub usage: Usage,
}

/// Token usage information
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// Trait for LLM providers
#[async_trait::async_trait]
pub trait LlmProvider: Send + Sync {
    /// Run inference with the given request
    async fn infer(&self, req: &InferenceRequest) -> Result<InferenceResponse, ProviderError>;

    /// Get the name of this provider
    fn name(&self) -> &str;

    /// Get the model (deployment) being used
    fn model(&self) -> &ModelId;

    /// Validate that this provider is properly configured
    fn validate_config(&self) -> Result<(), ProviderError>;
}

/// Build the configured provider. Only Azure OpenAI is wired in.
pub fn create_provider(config: &LlmConfig) -> Result<Arc<dyn LlmProvider>, ProviderError> {
    let provider = azure_openai::AzureOpenAIProvider::from_config(config)?;
    provider.validate_config()?;
    Ok(Arc::new(provider))
}
