use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::DEFAULT_QUESTION;

/// Deployment name of the chat model (Azure OpenAI routes by deployment, not model).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelId(String);

impl ModelId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single resource's cost reading for a billing period.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CostObservation {
    pub resource: String,
    pub monthly_cost_usd: f64,
    pub currency: String,
}

impl fmt::Display for CostObservation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string(self) {
            Ok(json) => f.write_str(&json),
            Err(_) => write!(
                f,
                "{} {} {}",
                self.resource, self.monthly_cost_usd, self.currency
            ),
        }
    }
}

/// The structured advice the model is asked to produce.
///
/// Models often leave out a key or add their own, so every field is optional
/// and unknown keys are kept in `extra`. Serializing gives back the object the
/// model sent.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Optimization {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommended_change: Option<String>,
    /// Models answer with numbers (`1.2`) as often as strings (`"$1.20"`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_monthly_savings: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_level: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Optimization {
    /// True when all four requested keys are present.
    pub fn is_complete(&self) -> bool {
        self.resource.is_some()
            && self.recommended_change.is_some()
            && self.estimated_monthly_savings.is_some()
            && self.risk_level.is_some()
    }
}

/// Model advice: parsed when the reply is a JSON object, raw text otherwise.
///
/// `Raw` is listed first so a stored `{"raw_output": ...}` reads back as `Raw`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptimizationResult {
    Raw { raw_output: String },
    Structured(Optimization),
}

impl OptimizationResult {
    /// Best-effort parse of a model reply. Never fails.
    ///
    /// Any JSON object is kept, including partial ones. Other JSON values, or
    /// an object whose known keys have the wrong type, fall back to `Raw`.
    pub fn from_reply(reply: &str) -> Self {
        let parsed = serde_json::from_str::<serde_json::Value>(reply)
            .map_err(|e| e.to_string())
            .and_then(|value| match value {
                serde_json::Value::Object(_) => {
                    serde_json::from_value::<Optimization>(value).map_err(|e| e.to_string())
                }
                other => Err(format!("expected a JSON object, got {other}")),
            });
        match parsed {
            Ok(optimization) => {
                if !optimization.is_complete() {
                    log::debug!("model reply is missing some optimization keys");
                }
                Self::Structured(optimization)
            }
            Err(err) => {
                log::debug!("model reply is not a structured optimization: {err}");
                Self::Raw {
                    raw_output: reply.to_string(),
                }
            }
        }
    }

    pub fn is_structured(&self) -> bool {
        matches!(self, Self::Structured(_))
    }
}

/// Per-request state threaded through fetch, detect and advise.
///
/// Each field is `None` until the stage that owns it has run.
#[derive(Clone, Debug, PartialEq)]
pub struct PipelineState {
    pub user_question: String,
    pub cost_data: Option<CostObservation>,
    pub anomaly_detected: Option<bool>,
    pub optimizations: Option<OptimizationResult>,
}

impl PipelineState {
    pub fn new(user_question: Option<String>) -> Self {
        Self::with_fallback(user_question, DEFAULT_QUESTION)
    }

    /// Blank questions count as absent.
    pub fn with_fallback(user_question: Option<String>, fallback: &str) -> Self {
        let user_question = user_question
            .filter(|q| !q.trim().is_empty())
            .unwrap_or_else(|| fallback.to_string());
        Self {
            user_question,
            cost_data: None,
            anomaly_detected: None,
            optimizations: None,
        }
    }
}

impl Default for PipelineState {
    fn default() -> Self {
        Self::new(None)
    }
}

/// The artifact persisted to storage and returned to the caller.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub timestamp: String,
    pub cost_data: Option<CostObservation>,
    pub anomaly_detected: Option<bool>,
    pub optimizations: Option<OptimizationResult>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn structured_reply_parses() {
        let reply = r#"{"resource":"X","recommended_change":"Y","estimated_monthly_savings":1.2,"risk_level":"low"}"#;
        let result = OptimizationResult::from_reply(reply);
        assert_eq!(
            result,
            OptimizationResult::Structured(Optimization {
                resource: Some("X".to_string()),
                recommended_change: Some("Y".to_string()),
                estimated_monthly_savings: Some(json!(1.2)),
                risk_level: Some("low".to_string()),
                extra: serde_json::Map::new(),
            })
        );
    }

    #[test]
    fn non_json_reply_falls_back_to_raw() {
        let result = OptimizationResult::from_reply("I cannot help");
        assert_eq!(
            result,
            OptimizationResult::Raw {
                raw_output: "I cannot help".to_string()
            }
        );
    }

    #[test]
    fn extra_keys_survive_serialization() {
        let reply = r#"{"resource":"X","recommended_change":"Y","estimated_monthly_savings":1.2,"risk_level":"low","rationale":"tier is oversized"}"#;
        let result = OptimizationResult::from_reply(reply);
        let parsed: serde_json::Value = serde_json::from_str(reply).unwrap();
        assert_eq!(serde_json::to_value(&result).unwrap(), parsed);
        match result {
            OptimizationResult::Structured(opt) => {
                assert!(opt.is_complete());
                assert_eq!(opt.extra["rationale"], "tier is oversized");
            }
            other => panic!("expected structured reply, got {other:?}"),
        }
    }

    #[test]
    fn partial_object_is_kept_as_structured() {
        let reply = r#"{"resource":"X","recommended_change":"Y"}"#;
        let result = OptimizationResult::from_reply(reply);
        match &result {
            OptimizationResult::Structured(opt) => {
                assert!(!opt.is_complete());
                assert_eq!(opt.resource.as_deref(), Some("X"));
                assert!(opt.risk_level.is_none());
            }
            other => panic!("expected structured reply, got {other:?}"),
        }
        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({"resource": "X", "recommended_change": "Y"})
        );
    }

    #[test]
    fn json_that_is_not_an_object_falls_back_to_raw() {
        for reply in ["[1, 2]", "\"just text\"", "42"] {
            assert!(!OptimizationResult::from_reply(reply).is_structured(), "{reply}");
        }
    }

    #[test]
    fn mistyped_known_key_falls_back_to_raw() {
        let reply = r#"{"resource":["X"],"risk_level":"low"}"#;
        assert!(!OptimizationResult::from_reply(reply).is_structured());
    }

    #[test]
    fn stored_raw_output_reads_back_as_raw() {
        let stored: OptimizationResult =
            serde_json::from_value(json!({"raw_output": "nope"})).unwrap();
        assert_eq!(
            stored,
            OptimizationResult::Raw {
                raw_output: "nope".to_string()
            }
        );
    }

    #[test]
    fn fenced_json_is_kept_verbatim() {
        let reply = "```json\n{\"resource\":\"X\"}\n```";
        match OptimizationResult::from_reply(reply) {
            OptimizationResult::Raw { raw_output } => assert_eq!(raw_output, reply),
            other => panic!("expected raw fallback, got {other:?}"),
        }
    }

    #[test]
    fn raw_variant_serializes_as_single_key_object() {
        let raw = OptimizationResult::Raw {
            raw_output: "nope".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&raw).unwrap(),
            json!({"raw_output": "nope"})
        );
    }

    #[test]
    fn state_defaults_question_when_absent_or_blank() {
        assert_eq!(PipelineState::new(None).user_question, DEFAULT_QUESTION);
        assert_eq!(
            PipelineState::new(Some("  ".to_string())).user_question,
            DEFAULT_QUESTION
        );
        assert_eq!(
            PipelineState::new(Some("Why so high?".to_string())).user_question,
            "Why so high?"
        );
    }

    #[test]
    fn report_serializes_absent_fields_as_null() {
        let report = Report {
            timestamp: "2026-01-01T00:00:00.000000Z".to_string(),
            cost_data: None,
            anomaly_detected: None,
            optimizations: None,
        };
        let value = serde_json::to_value(&report).unwrap();
        assert!(value["cost_data"].is_null());
        assert!(value["anomaly_detected"].is_null());
        assert!(value["optimizations"].is_null());
    }
}
