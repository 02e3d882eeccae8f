use serde_json::{Value, json};

use crate::app_config::LlmConfig;
use crate::errors::ProviderError;
use crate::types::ModelId;

use super::{InferenceRequest, InferenceResponse, LlmProvider, ProviderHttpClient, Usage};

pub struct AzureOpenAIProvider {
    client: reqwest::Client,
    endpoint: String,
    key: String,
    api_version: String,
    model: ModelId,
}

impl AzureOpenAIProvider {
    pub fn new(
        endpoint: impl Into<String>,
        key: impl Into<String>,
        deployment: ModelId,
        api_version: impl Into<String>,
        timeout_secs: u64,
    ) -> Result<Self, ProviderError> {
        let client = ProviderHttpClient::new(timeout_secs)?.into_client();
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            key: key.into(),
            api_version: api_version.into(),
            model: deployment,
        })
    }

    pub fn from_config(config: &LlmConfig) -> Result<Self, ProviderError> {
        if config.api_key.is_empty() {
            return Err(ProviderError::MissingApiKey("azure-openai".to_string()));
        }
        Self::new(
            config.endpoint.clone(),
            config.api_key.clone(),
            ModelId::new(config.deployment.clone()),
            config.api_version.clone(),
            config.timeout_secs,
        )
    }

    fn completions_url(&self, deployment: &ModelId) -> String {
        format!(
            "{}/openai/deployments/{}/chat/completions",
            self.endpoint.trim_end_matches('/'),
            deployment
        )
    }
}

#[async_trait::async_trait]
impl LlmProvider for AzureOpenAIProvider {
    async fn infer(&self, req: &InferenceRequest) -> Result<InferenceResponse, ProviderError> {
        let mut body = json!({
            "messages": [
                { "role": "user", "content": req.prompt }
            ],
            "max_tokens": req.max_tokens,
        });
        if let Some(temp) = req.temperature {
            body["temperature"] = json!(temp);
        }

        let res = self
            .client
            .post(self.completions_url(&req.model))
            .query(&[("api-version", self.api_version.as_str())])
            .header("api-key", &self.key)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        if !res.status().is_success() {
            let status = res.status();
            let err_text = res.text().await?;
            return Err(ProviderError::ApiError(format!(
                "Azure OpenAI API Error {status}: {err_text}"
            )));
        }

        let response_json: Value = res.json().await?;

        let choice = response_json
            .get("choices")
            .and_then(|arr| arr.as_array())
            .and_then(|arr| arr.first())
            .ok_or_else(|| ProviderError::InvalidResponse("No choices in response".to_string()))?;

        // A null content (e.g. filtered output) is still a reply; treat it as empty text.
        let text = choice
            .get("message")
            .ok_or_else(|| ProviderError::InvalidResponse("No message in choice".to_string()))?
            .get("content")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();

        let stop_reason = choice
            .get("finish_reason")
            .and_then(|v| v.as_str())
            .unwrap_or("stop")
            .to_string();

        let usage = response_json
            .get("usage")
            .map(|usage_obj| Usage {
                input_tokens: usage_obj
                    .get("prompt_tokens")
                    .and_then(|v| v.as_u64())
                    .unwrap_or(0) as u32,
                output_tokens: usage_obj
                    .get("completion_tokens")
                    .and_then(|v| v.as_u64())
                    .unwrap_or(0) as u32,
            })
            .unwrap_or_default();

        Ok(InferenceResponse {
            text,
            stop_reason,
            usage,
        })
    }

    fn name(&self) -> &str {
        "azure-openai"
    }

    fn model(&self) -> &ModelId {
        &self.model
    }

    fn validate_config(&self) -> Result<(), ProviderError> {
        if self.key.is_empty() {
            return Err(ProviderError::MissingApiKey("azure-openai".to_string()));
        }
        if self.endpoint.is_empty() {
            return Err(ProviderError::Config(
                "Azure OpenAI endpoint is empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider_for(server: &MockServer) -> AzureOpenAIProvider {
        AzureOpenAIProvider::new(
            server.uri(),
            "test-key",
            ModelId::new("gpt-4o-mini"),
            "2024-12-01-preview",
            5,
        )
        .unwrap()
    }

    fn request(prompt: &str) -> InferenceRequest {
        InferenceRequest {
            model: ModelId::new("gpt-4o-mini"),
            prompt: prompt.to_string(),
            max_tokens: 400,
            temperature: Some(0.1),
        }
    }

    #[tokio::test]
    async fn posts_to_deployment_and_returns_reply_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/openai/deployments/gpt-4o-mini/chat/completions"))
            .and(query_param("api-version", "2024-12-01-preview"))
            .and(header("api-key", "test-key"))
            .and(body_partial_json(json!({
                "messages": [{ "role": "user", "content": "hello" }],
                "max_tokens": 400
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{
                    "message": { "role": "assistant", "content": "{\"ok\":true}" },
                    "finish_reason": "stop"
                }],
                "usage": { "prompt_tokens": 12, "completion_tokens": 5 }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let resp = provider_for(&server).infer(&request("hello")).await.unwrap();
        assert_eq!(resp.text, "{\"ok\":true}");
        assert_eq!(resp.stop_reason, "stop");
        assert_eq!(resp.usage.input_tokens, 12);
        assert_eq!(resp.usage.output_tokens, 5);
    }

    #[tokio::test]
    async fn non_success_status_is_an_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("access denied"))
            .mount(&server)
            .await;

        let err = provider_for(&server).infer(&request("hi")).await.unwrap_err();
        match err {
            ProviderError::ApiError(msg) => assert!(msg.contains("access denied")),
            other => panic!("expected ApiError, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_choices_is_invalid_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
            .mount(&server)
            .await;

        let err = provider_for(&server).infer(&request("hi")).await.unwrap_err();
        assert!(matches!(err, ProviderError::InvalidResponse(_)));
    }

    #[test]
    fn from_config_requires_key() {
        let cfg = LlmConfig {
            endpoint: "https://x.openai.azure.com/".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            AzureOpenAIProvider::from_config(&cfg),
            Err(ProviderError::MissingApiKey(_))
        ));
    }

    #[test]
    fn completions_url_tolerates_trailing_slash() {
        let provider = AzureOpenAIProvider::new(
            "https://x.cognitiveservices.azure.com/",
            "k",
            ModelId::new("gpt-4o-mini"),
            "v",
            5,
        )
        .unwrap();
        assert_eq!(
            provider.completions_url(provider.model()),
            "https://x.cognitiveservices.azure.com/openai/deployments/gpt-4o-mini/chat/completions"
        );
    }
}
