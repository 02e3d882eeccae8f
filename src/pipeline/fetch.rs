use std::sync::Arc;

use crate::types::{CostObservation, PipelineState};

/// Where cost readings come from.
pub trait CostSource: Send + Sync {
    fn observe(&self) -> CostObservation;
}

/// Fixed reading used until a live cost-management query is wired in.
#[derive(Debug, Clone, Copy, Default)]
pub struct StubCostSource;

impl CostSource for StubCostSource {
    fn observe(&self) -> CostObservation {
        CostObservation {
            resource: "Azure Storage Account".to_string(),
            monthly_cost_usd: 2.35,
            currency: "USD".to_string(),
        }
    }
}

pub struct CostFetcher {
    source: Arc<dyn CostSource>,
}

impl CostFetcher {
    pub fn new(source: Arc<dyn CostSource>) -> Self {
        Self { source }
    }

    pub fn fetch(&self, mut state: PipelineState) -> PipelineState {
        state.cost_data = Some(self.source.observe());
        state
    }
}

impl Default for CostFetcher {
    fn default() -> Self {
        Self::new(Arc::new(StubCostSource))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stub_fetch_is_deterministic() {
        let fetcher = CostFetcher::default();
        let first = fetcher.fetch(PipelineState::default());
        let second = fetcher.fetch(PipelineState::default());

        let expected = CostObservation {
            resource: "Azure Storage Account".to_string(),
            monthly_cost_usd: 2.35,
            currency: "USD".to_string(),
        };
        assert_eq!(first.cost_data, Some(expected.clone()));
        assert_eq!(second.cost_data, Some(expected));
    }

    #[test]
    fn fetch_only_writes_cost_data() {
        let state = PipelineState::new(Some("What about egress?".to_string()));
        let out = CostFetcher::default().fetch(state);
        assert_eq!(out.user_question, "What about egress?");
        assert!(out.anomaly_detected.is_none());
        assert!(out.optimizations.is_none());
    }
}
