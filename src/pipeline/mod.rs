//! The fixed four-stage chain: fetch cost → detect anomaly → advise → build report.
//!
//! Every run owns its own [`PipelineState`]; only the immutable collaborators
//! (cost source, provider, optional event log) are shared between runs.

use serde_json::json;
use std::sync::Arc;

pub mod advise;
pub mod detect;
pub mod fetch;
pub mod logging;
pub mod report;

pub use advise::{OptimizationAdvisor, build_prompt};
pub use detect::AnomalyDetector;
pub use fetch::{CostFetcher, CostSource, StubCostSource};
pub use logging::PipelineLogger;

use crate::app_config::AppConfig;
use crate::config::{
    DEFAULT_ANOMALY_THRESHOLD, DEFAULT_MAX_TOKENS, DEFAULT_QUESTION, DEFAULT_TEMPERATURE,
};
use crate::errors::PipelineError;
use crate::providers::LlmProvider;
use crate::types::{PipelineState, Report};

#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub anomaly_threshold: f64,
    pub temperature: f32,
    pub max_tokens: u32,
    pub default_question: String,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            anomaly_threshold: DEFAULT_ANOMALY_THRESHOLD,
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            default_question: DEFAULT_QUESTION.to_string(),
        }
    }
}

impl From<&AppConfig> for PipelineSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            anomaly_threshold: config.pipeline.anomaly_threshold,
            temperature: config.llm.temperature,
            max_tokens: config.llm.max_tokens,
            default_question: config.pipeline.default_question.clone(),
        }
    }
}

pub struct Pipeline {
    fetcher: CostFetcher,
    detector: AnomalyDetector,
    advisor: OptimizationAdvisor,
    default_question: String,
    logger: Option<PipelineLogger>,
}

impl Pipeline {
    pub fn new(
        cost_source: Arc<dyn CostSource>,
        provider: Arc<dyn LlmProvider>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            fetcher: CostFetcher::new(cost_source),
            detector: AnomalyDetector::new(settings.anomaly_threshold),
            advisor: OptimizationAdvisor::new(provider)
                .with_sampling(settings.temperature, settings.max_tokens),
            default_question: settings.default_question,
            logger: None,
        }
    }

    pub fn with_logger(mut self, logger: PipelineLogger) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Attach a JSONL event log when `pipeline.log_dir` is configured.
    pub fn with_configured_logger(self, config: &AppConfig) -> std::io::Result<Self> {
        match &config.pipeline.log_dir {
            Some(dir) => Ok(self.with_logger(PipelineLogger::new(dir)?)),
            None => Ok(self),
        }
    }

    /// Run all four stages in order. The first failing stage aborts the run.
    ///
    /// A blank `question` (e.g. `?question=`) is treated like a missing one.
    pub async fn run(&self, question: Option<String>) -> Result<Report, PipelineError> {
        let run_id = uuid::Uuid::new_v4().to_string();
        let state = PipelineState::with_fallback(question, &self.default_question);
        log::debug!("run {run_id}: question {:?}", state.user_question);

        let state = self.fetcher.fetch(state);
        self.log_step(&run_id, "fetch_cost", json!({ "cost_data": state.cost_data }));

        let state = self.detector.detect(state)?;
        self.log_step(
            &run_id,
            "detect_anomaly",
            json!({ "anomaly_detected": state.anomaly_detected }),
        );

        let state = match self.advisor.advise(state).await {
            Ok(state) => state,
            Err(err) => {
                self.log_step(&run_id, "optimize", json!({ "error": err.to_string() }));
                return Err(err);
            }
        };
        self.log_step(
            &run_id,
            "optimize",
            json!({ "optimizations": state.optimizations }),
        );

        let report = report::build(&state);
        self.log_step(&run_id, "report", json!({ "timestamp": report.timestamp }));
        Ok(report)
    }

    fn log_step(&self, run_id: &str, step: &str, data: serde_json::Value) {
        if let Some(logger) = &self.logger {
            if let Err(err) = logger.log_event(run_id, step, data) {
                log::warn!("failed to write pipeline event for {step}: {err}");
            }
        }
    }
}
