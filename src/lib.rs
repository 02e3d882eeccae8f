pub mod app_config;
pub mod config;
pub mod errors;
pub mod handler;
mod observability;
pub mod pipeline;
pub mod providers;
pub mod storage;
pub mod types;

pub use crate::app_config::AppConfig;
pub use crate::errors::{ConfigError, PipelineError, ProviderError, StorageError};
pub use crate::handler::{RequestHandler, router};
pub use crate::observability::init_logging;
pub use crate::pipeline::{Pipeline, PipelineSettings};
pub use crate::providers::{InferenceRequest, InferenceResponse, LlmProvider, Usage};
pub use crate::storage::ReportStore;
pub use crate::types::{
    CostObservation, ModelId, Optimization, OptimizationResult, PipelineState, Report,
};
