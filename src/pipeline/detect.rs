use crate::config::DEFAULT_ANOMALY_THRESHOLD;
use crate::errors::PipelineError;
use crate::types::PipelineState;

/// Flags a cost as anomalous when it is strictly above `threshold`.
#[derive(Debug, Clone, Copy)]
pub struct AnomalyDetector {
    threshold: f64,
}

impl AnomalyDetector {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn detect(&self, mut state: PipelineState) -> Result<PipelineState, PipelineError> {
        let cost = state
            .cost_data
            .as_ref()
            .ok_or(PipelineError::MissingField("cost_data"))?;
        let anomalous = cost.monthly_cost_usd > self.threshold;
        if anomalous {
            log::warn!(
                "cost anomaly: {} at {} {} exceeds {}",
                cost.resource,
                cost.monthly_cost_usd,
                cost.currency,
                self.threshold
            );
        }
        state.anomaly_detected = Some(anomalous);
        Ok(state)
    }
}

impl Default for AnomalyDetector {
    fn default() -> Self {
        Self::new(DEFAULT_ANOMALY_THRESHOLD)
    }
}
