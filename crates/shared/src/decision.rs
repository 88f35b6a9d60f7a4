//! Single source of truth for routing. The classifier's output is schema
//! validated; anything it gets wrong collapses to general help rather than a
//! guessed data-backed intent.

use std::sync::Arc;

use tracing::warn;

use crate::contracts::{AnswerContract, chain_for_intent};
use crate::llm::{
    INTENT_CLASSIFICATION_VERSION_V1, LlmGateway, LlmRequest, ModelRole, classification_schema,
    prompts, validate_classification,
};
use crate::models::Intent;

const LOW_CONFIDENCE_THRESHOLD: f64 = 0.5;
const FALLBACK_CONFIDENCE: f32 = 0.2;

#[derive(Debug, Clone)]
pub struct RoutingDecision {
    pub intent: Intent,
    pub confidence: f32,
    pub requires_semantic: bool,
    pub contract_chain: Vec<AnswerContract>,
    pub clarify_reason: Option<String>,
}

pub struct DecisionLayer {
    gateway: Arc<dyn LlmGateway>,
}

impl DecisionLayer {
    pub fn new(gateway: Arc<dyn LlmGateway>) -> Self {
        Self { gateway }
    }

    pub async fn classify(&self, message: &str, recent_turns: &[String]) -> RoutingDecision {
        let user_prompt = format!(
            "{}\n\nReturn JSON matching this schema, with version \"{}\":\n{}",
            prompts::intent_classifier_user_prompt(message, recent_turns),
            INTENT_CLASSIFICATION_VERSION_V1,
            classification_schema()
        );
        let request = LlmRequest::new(
            ModelRole::Intent,
            prompts::INTENT_CLASSIFIER_SYSTEM_PROMPT,
            user_prompt,
        )
        .with_json_output();

        let completion = match self.gateway.complete(request).await {
            Ok(completion) => completion,
            Err(err) => {
                warn!("intent classifier call failed: {err}");
                return fallback_decision();
            }
        };

        let contract = match validate_classification(&completion.text) {
            Ok(contract) => contract,
            Err(err) => {
                warn!("intent classifier output rejected: {err}");
                return fallback_decision();
            }
        };

        let output = contract.output;
        let mut intent: Intent = output.intent.into();
        let mut clarify_reason = None;
        if output.confidence < LOW_CONFIDENCE_THRESHOLD
            && let Some(suggestion) = output.suggested_clarification
        {
            intent = Intent::Clarify;
            clarify_reason = Some(suggestion);
        }

        RoutingDecision {
            intent,
            confidence: output.confidence as f32,
            requires_semantic: output.requires_semantic,
            contract_chain: chain_for_intent(intent, message),
            clarify_reason,
        }
    }
}

fn fallback_decision() -> RoutingDecision {
    RoutingDecision {
        intent: Intent::GeneralHelp,
        confidence: FALLBACK_CONFIDENCE,
        requires_semantic: false,
        contract_chain: Vec::new(),
        clarify_reason: None,
    }
}
