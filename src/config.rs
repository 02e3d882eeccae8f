pub const DEFAULT_QUESTION: &str = "Explore my Azure costs";

/// Costs strictly above this many currency units are flagged.
pub const DEFAULT_ANOMALY_THRESHOLD: f64 = 5.0;

pub const DEFAULT_TEMPERATURE: f32 = 0.1;
pub const DEFAULT_MAX_TOKENS: u32 = 400;
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

pub const DEFAULT_DEPLOYMENT: &str = "gpt-4o-mini";
pub const DEFAULT_API_VERSION: &str = "2024-12-01-preview";
pub const DEFAULT_CONTAINER: &str = "agent-state";
pub const DEFAULT_BIND: &str = "0.0.0.0:7071";

pub const REPORT_PREFIX: &str = "agent-report-";

/// Object name a report is stored under.
pub fn report_object_name(timestamp: &str) -> String {
    format!("{REPORT_PREFIX}{timestamp}.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_name_embeds_timestamp() {
        assert_eq!(
            report_object_name("2026-10-19T08:30:00.123456Z"),
            "agent-report-2026-10-19T08:30:00.123456Z.json"
        );
    }
}
