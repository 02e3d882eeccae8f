//! Inbound surface: runs the pipeline for one request and persists the report.

use axum::Router;
use axum::extract::{Query, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use serde::Deserialize;
use std::sync::Arc;

use crate::app_config::AppConfig;
use crate::errors::PipelineError;
use crate::pipeline::{Pipeline, PipelineSettings, StubCostSource};
use crate::providers::create_provider;
use crate::storage::{ReportStore, create_store};
use crate::types::Report;

pub const RUN_ROUTE: &str = "/api/run_cost_agent";

pub struct RequestHandler {
    pipeline: Pipeline,
    store: Arc<dyn ReportStore>,
}

impl RequestHandler {
    pub fn new(pipeline: Pipeline, store: Arc<dyn ReportStore>) -> Self {
        Self { pipeline, store }
    }

    /// Wire the stub cost source, the configured provider and the configured store.
    pub fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        let provider = create_provider(&config.llm)?;
        let store = create_store(&config.storage)?;
        let pipeline = Pipeline::new(
            Arc::new(StubCostSource),
            provider,
            PipelineSettings::from(config),
        )
        .with_configured_logger(config)?;
        log::info!(
            "handler ready: model {} via {}, storage {}",
            config.llm.deployment,
            config.llm.endpoint,
            store.name()
        );
        Ok(Self::new(pipeline, store))
    }

    /// Run the pipeline and persist the result. A storage failure fails the
    /// whole request even though the report was computed.
    pub async fn handle(&self, question: Option<String>) -> Result<Report, PipelineError> {
        let report = self.pipeline.run(question).await?;
        let name = self.store.persist(&report).await?;
        log::info!("report persisted as {name} via {}", self.store.name());
        Ok(report)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct RunParams {
    /// `?question=` with an empty value gets the default question, like no parameter at all.
    pub question: Option<String>,
}

pub fn router(handler: Arc<RequestHandler>) -> Router {
    Router::new()
        .route(RUN_ROUTE, get(run_cost_agent).post(run_cost_agent))
        .route("/health", get(health))
        .with_state(handler)
}

async fn run_cost_agent(
    State(handler): State<Arc<RequestHandler>>,
    Query(params): Query<RunParams>,
) -> Response {
    log::info!("cost agent invoked (question: {:?})", params.question);
    match handler.handle(params.question).await {
        Ok(report) => report_response(&report),
        Err(err) => err.into_response(),
    }
}

async fn health() -> &'static str {
    "ok"
}

fn report_response(report: &Report) -> Response {
    match serde_json::to_string_pretty(report) {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/json")],
            body,
        )
            .into_response(),
        Err(err) => error_response(&format!("failed to serialize report: {err}")),
    }
}

fn error_response(message: &str) -> Response {
    let body = serde_json::json!({ "error": message }).to_string();
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        [(header::CONTENT_TYPE, "application/json")],
        body,
    )
        .into_response()
}

impl IntoResponse for PipelineError {
    fn into_response(self) -> Response {
        log::error!("cost agent run failed: {self}");
        error_response(&self.to_string())
    }
}
