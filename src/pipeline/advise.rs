use std::sync::Arc;

use crate::config::{DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE};
use crate::errors::PipelineError;
use crate::providers::{InferenceRequest, LlmProvider};
use crate::types::{CostObservation, OptimizationResult, PipelineState};

pub fn build_prompt(cost: &CostObservation, question: &str) -> String {
    format!(
        "You are an Azure cost optimization assistant.

Cost data:
{cost}

User question:
{question}

STRICTLY return a single valid JSON object with the keys:
- resource
- recommended_change
- estimated_monthly_savings
- risk_level
"
    )
}

/// Asks the model for an optimization. Reply parse failures fall back to raw
/// text; provider failures propagate.
pub struct OptimizationAdvisor {
    provider: Arc<dyn LlmProvider>,
    temperature: f32,
    max_tokens: u32,
}

impl OptimizationAdvisor {
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self {
            provider,
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    pub fn with_sampling(mut self, temperature: f32, max_tokens: u32) -> Self {
        self.temperature = temperature;
        self.max_tokens = max_tokens;
        self
    }

    pub async fn advise(&self, mut state: PipelineState) -> Result<PipelineState, PipelineError> {
        let cost = state
            .cost_data
            .as_ref()
            .ok_or(PipelineError::MissingField("cost_data"))?;

        let req = InferenceRequest {
            model: self.provider.model().clone(),
            prompt: build_prompt(cost, &state.user_question),
            max_tokens: self.max_tokens,
            temperature: Some(self.temperature),
        };

        let resp = self.provider.infer(&req).await?;
        log::info!(
            "raw model output ({}/{}, stop: {}, tokens in/out: {}/{}): {}",
            self.provider.name(),
            self.provider.model(),
            resp.stop_reason,
            resp.usage.input_tokens,
            resp.usage.output_tokens,
            resp.text
        );
        if resp.stop_reason == "length" {
            log::warn!(
                "model reply hit the {} token cap and may be truncated",
                self.max_tokens
            );
        }

        state.optimizations = Some(OptimizationResult::from_reply(&resp.text));
        Ok(state)
    }
}
