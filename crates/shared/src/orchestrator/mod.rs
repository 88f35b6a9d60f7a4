//! Single-meeting answer flow. Guards run in a fixed order (pending offer,
//! ambiguity, binary) before the contract handler; a bounded semantic re-read
//! of the transcript is the last resort and never replaces a deterministic
//! artifact answer with a guess.

use std::sync::Arc;

use serde_json::Value;
use tracing::warn;

use crate::config::AppConfig;
use crate::contracts::{AnswerContract, HandlerKind, handler_for_contract};
use crate::detectors::{
    OfferResponse, detect_ambiguity, detect_offer_response, is_binary_question,
};
use crate::llm::{LlmGateway, LlmRequest, ModelRole, prompts};
use crate::models::{DataSource, Meeting, PendingOffer};
use crate::services::ProductKnowledgeService;
use crate::store::ArtifactStore;

mod aggregative;
mod binary;
mod drafting;
mod extractive;
mod summary;

/// Which family of handler produced an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerKind {
    Extractive,
    Aggregative,
    Summary,
    Drafting,
}

#[derive(Debug, Clone)]
pub struct MeetingAnswer {
    pub answer: String,
    pub kind: AnswerKind,
    pub data_source: DataSource,
    pub evidence: Option<String>,
    pub pending_offer: PendingOffer,
    pub semantic_answer_used: bool,
    pub semantic_confidence: Option<f32>,
    pub is_clarification_request: bool,
    pub is_binary_question: bool,
    pub semantic_error: Option<String>,
}

impl MeetingAnswer {
    pub(crate) fn new(kind: AnswerKind, data_source: DataSource, answer: String) -> Self {
        Self {
            answer,
            kind,
            data_source,
            evidence: None,
            pending_offer: PendingOffer::None,
            semantic_answer_used: false,
            semantic_confidence: None,
            is_clarification_request: false,
            is_binary_question: false,
            semantic_error: None,
        }
    }

    pub(crate) fn with_evidence(mut self, evidence: String) -> Self {
        self.evidence = Some(evidence);
        self
    }

    pub fn is_not_found(&self) -> bool {
        self.data_source == DataSource::NotFound
    }
}

pub(crate) const UNCERTAINTY_ANSWER: &str = "I couldn't find anything about that in this \
meeting's notes. Would you like a brief summary of the meeting?";

pub(crate) fn uncertainty_response(kind: AnswerKind) -> MeetingAnswer {
    MeetingAnswer::new(kind, DataSource::NotFound, UNCERTAINTY_ANSWER.to_string())
}

pub struct SingleMeetingOrchestrator {
    store: Arc<dyn ArtifactStore>,
    gateway: Arc<dyn LlmGateway>,
    knowledge: Option<Arc<dyn ProductKnowledgeService>>,
    config: AppConfig,
}

impl SingleMeetingOrchestrator {
    pub fn new(
        store: Arc<dyn ArtifactStore>,
        gateway: Arc<dyn LlmGateway>,
        knowledge: Option<Arc<dyn ProductKnowledgeService>>,
        config: AppConfig,
    ) -> Self {
        Self {
            store,
            gateway,
            knowledge,
            config,
        }
    }

    pub async fn answer(
        &self,
        meeting: &Meeting,
        question: &str,
        has_pending_offer: bool,
        contract: Option<AnswerContract>,
        requires_semantic: bool,
    ) -> MeetingAnswer {
        if has_pending_offer {
            match detect_offer_response(question) {
                Some(OfferResponse::Accepted) => {
                    return summary::run(self, meeting).await;
                }
                Some(OfferResponse::Declined) => {
                    let mut answer = MeetingAnswer::new(
                        AnswerKind::Extractive,
                        DataSource::NotFound,
                        "No problem. Ask me anything else about this meeting whenever you're \
ready."
                            .to_string(),
                    );
                    answer.pending_offer = PendingOffer::None;
                    return answer;
                }
                None => {}
            }
        }

        if let Some(prompt) = detect_ambiguity(question) {
            let mut answer = MeetingAnswer::new(
                AnswerKind::Extractive,
                DataSource::Clarification,
                prompt.to_string(),
            );
            answer.is_clarification_request = true;
            return answer;
        }

        if is_binary_question(question)
            && let Some(mut answer) = binary::handle(self, meeting, question).await
        {
            answer.is_binary_question = true;
            return answer;
        }

        let handler = handler_for_contract(contract.unwrap_or(AnswerContract::ExtractiveFact));
        let mut result = match handler {
            HandlerKind::Extractive => extractive::run(self, meeting, question, contract).await,
            HandlerKind::Aggregative => aggregative::run(self, meeting, question).await,
            HandlerKind::Summary => summary::run(self, meeting).await,
            HandlerKind::Drafting => drafting::run(self, meeting, question).await,
        };

        if requires_semantic
            && result.is_not_found()
            && matches!(result.kind, AnswerKind::Extractive | AnswerKind::Aggregative)
        {
            result = self.semantic_fallback(meeting, question, result).await;
        }

        if result.is_not_found() && result.kind != AnswerKind::Summary {
            result.pending_offer = PendingOffer::Summary;
        }

        result
    }

    /// Bounded LLM re-read of the transcript window. A failure keeps the
    /// deterministic result and only annotates it.
    async fn semantic_fallback(
        &self,
        meeting: &Meeting,
        question: &str,
        deterministic: MeetingAnswer,
    ) -> MeetingAnswer {
        let window = match self.transcript_window(meeting).await {
            Some(window) => window,
            None => return deterministic,
        };

        let request = LlmRequest::new(
            ModelRole::SingleMeetingResponse,
            prompts::SEMANTIC_ANSWER_SYSTEM_PROMPT,
            prompts::semantic_answer_user_prompt(question, &window),
        )
        .with_json_output();

        match self.gateway.complete(request).await {
            Ok(completion) => match parse_semantic_payload(&completion.text) {
                Some((answer, confidence)) => {
                    let mut result = MeetingAnswer::new(
                        deterministic.kind,
                        DataSource::Semantic,
                        answer,
                    );
                    result.semantic_answer_used = true;
                    result.semantic_confidence = Some(confidence);
                    result
                }
                None => {
                    let mut result = deterministic;
                    result.semantic_error = Some("semantic_payload_invalid".to_string());
                    result
                }
            },
            Err(err) => {
                warn!(meeting_id = %meeting.id, "semantic fallback failed: {err}");
                let mut result = deterministic;
                result.semantic_error = Some(err.to_string());
                result
            }
        }
    }

    /// First chunks of the meeting rendered as `[speaker]: text`, capped at
    /// the summary character budget.
    pub(crate) async fn transcript_window(&self, meeting: &Meeting) -> Option<String> {
        let chunks = self
            .store
            .get_chunks_for_transcript(meeting.id, self.config.summary_chunk_limit)
            .await
            .unwrap_or_default();
        if chunks.is_empty() {
            return None;
        }

        let mut window = String::new();
        for chunk in &chunks {
            let speaker = chunk.speaker.as_deref().unwrap_or("Unknown");
            let line = format!("[{speaker}]: {}\n", chunk.content);
            if window.len() + line.len() > self.config.summary_char_budget {
                break;
            }
            window.push_str(&line);
        }
        if window.is_empty() { None } else { Some(window) }
    }

    pub(crate) fn store(&self) -> &dyn ArtifactStore {
        self.store.as_ref()
    }

    pub(crate) fn gateway(&self) -> &dyn LlmGateway {
        self.gateway.as_ref()
    }

    pub(crate) fn knowledge(&self) -> Option<&dyn ProductKnowledgeService> {
        self.knowledge.as_deref()
    }

    pub(crate) fn config(&self) -> &AppConfig {
        &self.config
    }
}

fn parse_semantic_payload(raw: &str) -> Option<(String, f32)> {
    let payload: Value = serde_json::from_str(raw).ok()?;
    let answer = payload.get("answer")?.as_str()?.trim().to_string();
    if answer.is_empty() {
        return None;
    }
    let confidence = payload.get("confidence")?.as_f64()? as f32;
    if !(0.0..=1.0).contains(&confidence) {
        return None;
    }
    Some((answer, confidence))
}
