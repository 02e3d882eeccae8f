use chrono::{DateTime, SecondsFormat, Utc};

use crate::types::{PipelineState, Report};

/// RFC 3339 / ISO-8601 UTC with microseconds, e.g. `2026-10-19T08:30:00.123456Z`.
pub fn format_timestamp(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn build(state: &PipelineState) -> Report {
    build_at(state, Utc::now())
}

/// Stages that did not run leave their report field as `None`.
pub fn build_at(state: &PipelineState, instant: DateTime<Utc>) -> Report {
    Report {
        timestamp: format_timestamp(instant),
        cost_data: state.cost_data.clone(),
        anomaly_detected: state.anomaly_detected,
        optimizations: state.optimizations.clone(),
    }
}
