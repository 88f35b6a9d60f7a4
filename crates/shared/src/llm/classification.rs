use jsonschema::JSONSchema;
use schemars::{JsonSchema, schema_for};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::LazyLock;
use thiserror::Error;

use crate::models::Intent;

pub const INTENT_CLASSIFICATION_VERSION_V1: &str = "2026-06-20";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ClassifiedIntent {
    SingleMeeting,
    MultiMeeting,
    ProductKnowledge,
    ExternalResearch,
    DocumentSearch,
    GeneralHelp,
    Clarify,
    Refuse,
}

impl From<ClassifiedIntent> for Intent {
    fn from(value: ClassifiedIntent) -> Self {
        match value {
            ClassifiedIntent::SingleMeeting => Intent::SingleMeeting,
            ClassifiedIntent::MultiMeeting => Intent::MultiMeeting,
            ClassifiedIntent::ProductKnowledge => Intent::ProductKnowledge,
            ClassifiedIntent::ExternalResearch => Intent::ExternalResearch,
            ClassifiedIntent::DocumentSearch => Intent::DocumentSearch,
            ClassifiedIntent::GeneralHelp => Intent::GeneralHelp,
            ClassifiedIntent::Clarify => Intent::Clarify,
            ClassifiedIntent::Refuse => Intent::Refuse,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct IntentClassificationContract {
    pub version: String,
    pub output: IntentClassificationOutput,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct IntentClassificationOutput {
    pub intent: ClassifiedIntent,
    pub confidence: f64,
    #[serde(default)]
    pub requires_semantic: bool,
    pub meeting_relevance: f64,
    pub research_relevance: f64,
    #[serde(default)]
    pub suggested_clarification: Option<String>,
}

#[derive(Debug, Error)]
pub enum ClassificationError {
    #[error("classifier output is not valid json: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("classifier schema failed to compile: {0}")]
    SchemaCompile(String),
    #[error("classifier output failed schema validation: {errors:?}")]
    SchemaViolation { errors: Vec<String> },
    #[error("classifier contract version mismatch: expected={expected}, actual={actual}")]
    VersionMismatch { expected: String, actual: String },
    #[error("classifier confidence must be a finite number between 0.0 and 1.0")]
    InvalidConfidence,
}

pub fn classification_schema() -> Value {
    serde_json::to_value(schema_for!(IntentClassificationContract))
        .unwrap_or_else(|_| Value::Null)
}

static CLASSIFICATION_VALIDATOR: LazyLock<Result<JSONSchema, String>> = LazyLock::new(|| {
    JSONSchema::compile(&classification_schema()).map_err(|err| err.to_string())
});

pub fn validate_classification(
    raw_json: &str,
) -> Result<IntentClassificationContract, ClassificationError> {
    let payload: Value = serde_json::from_str(raw_json)?;

    let validator = CLASSIFICATION_VALIDATOR
        .as_ref()
        .map_err(|message| ClassificationError::SchemaCompile(message.clone()))?;
    if let Err(validation_errors) = validator.validate(&payload) {
        let errors = validation_errors
            .map(|err| err.to_string())
            .collect::<Vec<_>>();
        return Err(ClassificationError::SchemaViolation { errors });
    }

    let contract: IntentClassificationContract = serde_json::from_value(payload)?;
    if contract.version != INTENT_CLASSIFICATION_VERSION_V1 {
        return Err(ClassificationError::VersionMismatch {
            expected: INTENT_CLASSIFICATION_VERSION_V1.to_string(),
            actual: contract.version,
        });
    }
    if !contract.output.confidence.is_finite()
        || !(0.0..=1.0).contains(&contract.output.confidence)
    {
        return Err(ClassificationError::InvalidConfidence);
    }

    Ok(contract)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{
        ClassificationError, ClassifiedIntent, INTENT_CLASSIFICATION_VERSION_V1,
        validate_classification,
    };

    fn valid_payload() -> serde_json::Value {
        json!({
            "version": INTENT_CLASSIFICATION_VERSION_V1,
            "output": {
                "intent": "single_meeting",
                "confidence": 0.92,
                "requires_semantic": false,
                "meeting_relevance": 0.95,
                "research_relevance": 0.05
            }
        })
    }

    #[test]
    fn valid_classification_passes() {
        let contract = validate_classification(&valid_payload().to_string())
            .expect("valid classification should pass");
        assert_eq!(contract.output.intent, ClassifiedIntent::SingleMeeting);
        assert!(contract.output.suggested_clarification.is_none());
    }

    #[test]
    fn unknown_intent_fails_validation() {
        let mut payload = valid_payload();
        payload["output"]["intent"] = json!("write_my_report");
        let err = validate_classification(&payload.to_string())
            .expect_err("unknown intent must be rejected");
        assert!(
            matches!(err, ClassificationError::SchemaViolation { .. })
                || matches!(err, ClassificationError::InvalidJson(_)),
            "expected schema rejection, got {err:?}"
        );
    }

    #[test]
    fn stale_version_is_rejected() {
        let mut payload = valid_payload();
        payload["version"] = json!("2024-01-01");
        let err = validate_classification(&payload.to_string())
            .expect_err("stale contract version must be rejected");
        assert!(matches!(err, ClassificationError::VersionMismatch { .. }));
    }

    #[test]
    fn out_of_range_confidence_is_rejected() {
        let mut payload = valid_payload();
        payload["output"]["confidence"] = json!(1.7);
        let err = validate_classification(&payload.to_string())
            .expect_err("confidence above 1.0 must be rejected");
        assert!(
            matches!(err, ClassificationError::InvalidConfidence)
                || matches!(err, ClassificationError::SchemaViolation { .. }),
            "expected confidence rejection, got {err:?}"
        );
    }

    #[test]
    fn malformed_json_is_rejected() {
        let err = validate_classification("not json at all")
            .expect_err("malformed json must be rejected");
        assert!(matches!(err, ClassificationError::InvalidJson(_)));
    }
}
