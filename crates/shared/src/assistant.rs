//! Thin per-turn entry point: load thread state, route, dispatch, log.

use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::contracts::AnswerContract;
use crate::decision::DecisionLayer;
use crate::detectors::detect_offer_response;
use crate::executor::ContractExecutor;
use crate::models::{
    ChatTurnRequest, ChatTurnResponse, DataSource, InteractionRecord, Intent, Meeting,
    PendingOffer, TurnMetadata,
};
use crate::orchestrator::{MeetingAnswer, SingleMeetingOrchestrator};
use crate::resolver::MeetingResolver;
use crate::store::{ArtifactStore, StoreError};

pub const HELP_TEXT: &str = "I answer questions about recorded customer meetings. You can ask \
me things like:\n\u{2022} \"Who attended the Acme call?\"\n\u{2022} \"What are the next steps \
from the Initech meeting?\"\n\u{2022} \"What questions came up about pricing across recent \
calls?\"\n\u{2022} \"Summarize the latest Globex meeting.\"\nName a company or contact so I \
know which meetings to look at.";

pub const REFUSAL_TEXT: &str = "That's outside what I can help with. I only answer questions \
grounded in our recorded customer meetings, verified product documentation, or cited research.";

const DEFAULT_CLARIFICATION: &str = "I'm not sure which meetings you mean. Could you name the \
company, a contact, or the topic you're interested in?";

#[derive(Debug, Error)]
pub enum AssistantError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

pub struct AssistantHandler {
    store: Arc<dyn ArtifactStore>,
    decision: DecisionLayer,
    resolver: Arc<MeetingResolver>,
    orchestrator: Arc<SingleMeetingOrchestrator>,
    executor: ContractExecutor,
}

impl AssistantHandler {
    pub fn new(
        store: Arc<dyn ArtifactStore>,
        decision: DecisionLayer,
        resolver: Arc<MeetingResolver>,
        orchestrator: Arc<SingleMeetingOrchestrator>,
        executor: ContractExecutor,
    ) -> Self {
        Self {
            store,
            decision,
            resolver,
            orchestrator,
            executor,
        }
    }

    pub async fn handle_turn(
        &self,
        request: &ChatTurnRequest,
    ) -> Result<ChatTurnResponse, AssistantError> {
        let last = self.store.last_interaction(&request.thread_id).await?;
        let has_pending_offer = last
            .as_ref()
            .is_some_and(|record| record.pending_offer == PendingOffer::Summary);
        let offer_meeting_id = last.as_ref().and_then(|record| record.meeting_id);

        let response = self
            .route_turn(request, has_pending_offer, offer_meeting_id)
            .await?;

        self.store
            .append_interaction(InteractionRecord {
                thread_id: request.thread_id.clone(),
                created_at: Utc::now(),
                intent: response.metadata.intent.as_str().to_string(),
                data_source: response.metadata.data_source,
                last_answer: response.answer.clone(),
                pending_offer: response.metadata.pending_offer,
                meeting_id: response.meeting_id,
            })
            .await?;

        info!(
            thread_id = %request.thread_id,
            intent = response.metadata.intent.as_str(),
            data_source = response.metadata.data_source.as_str(),
            "turn answered"
        );

        Ok(ChatTurnResponse {
            answer: response.answer,
            metadata: response.metadata,
        })
    }

    async fn route_turn(
        &self,
        request: &ChatTurnRequest,
        has_pending_offer: bool,
        offer_meeting_id: Option<Uuid>,
    ) -> Result<RoutedResponse, AssistantError> {
        // A thread the chat surface already bound to one meeting skips
        // classification entirely.
        if let Some(meeting_id) = request.resolved_meeting_id {
            return self
                .meeting_scoped_turn(request, meeting_id, has_pending_offer)
                .await;
        }

        // An open-scope accept/decline on a pending offer bypasses the
        // classifier; the offer names the meeting it was made about.
        if has_pending_offer
            && detect_offer_response(&request.message_text).is_some()
            && let Some(meeting_id) = offer_meeting_id
        {
            return self
                .pending_offer_turn(request, meeting_id, has_pending_offer)
                .await;
        }

        let decision = self
            .decision
            .classify(&request.message_text, &request.thread_messages)
            .await;

        match decision.intent {
            Intent::Clarify => Ok(RoutedResponse::terminal(
                decision
                    .clarify_reason
                    .unwrap_or_else(|| DEFAULT_CLARIFICATION.to_string()),
                Intent::Clarify,
                DataSource::Clarification,
            )),
            Intent::Refuse => Ok(RoutedResponse::terminal(
                REFUSAL_TEXT.to_string(),
                Intent::Refuse,
                DataSource::Refusal,
            )),
            Intent::GeneralHelp => Ok(RoutedResponse::terminal(
                HELP_TEXT.to_string(),
                Intent::GeneralHelp,
                DataSource::Help,
            )),
            Intent::ProductKnowledge | Intent::ExternalResearch => {
                let execution = self
                    .executor
                    .execute(&decision.contract_chain, &request.message_text, &[], None)
                    .await;
                Ok(RoutedResponse {
                    answer: execution.final_output,
                    metadata: TurnMetadata {
                        intent: decision.intent,
                        contract_chain: decision.contract_chain,
                        data_source: execution.data_source,
                        citations: execution.citations,
                        decision_log: execution.decision_log,
                        pending_offer: PendingOffer::None,
                    },
                    meeting_id: None,
                })
            }
            Intent::SingleMeeting | Intent::MultiMeeting | Intent::DocumentSearch => {
                self.meeting_intent_turn(request, decision).await
            }
        }
    }

    async fn meeting_scoped_turn(
        &self,
        request: &ChatTurnRequest,
        meeting_id: Uuid,
        has_pending_offer: bool,
    ) -> Result<RoutedResponse, AssistantError> {
        let Some(meeting) = self.load_meeting(meeting_id).await? else {
            return Ok(RoutedResponse::terminal(
                "I couldn't find that meeting's transcript anymore.".to_string(),
                Intent::SingleMeeting,
                DataSource::NotFound,
            ));
        };

        let contract = request
            .contract_override
            .unwrap_or(AnswerContract::ExtractiveFact);
        let answer = self
            .orchestrator
            .answer(
                &meeting,
                &request.message_text,
                has_pending_offer,
                Some(contract),
                false,
            )
            .await;

        Ok(RoutedResponse::from_meeting_answer(
            answer,
            Intent::SingleMeeting,
            vec![contract],
            Some(meeting.id),
        ))
    }

    async fn pending_offer_turn(
        &self,
        request: &ChatTurnRequest,
        meeting_id: Uuid,
        has_pending_offer: bool,
    ) -> Result<RoutedResponse, AssistantError> {
        let Some(meeting) = self.load_meeting(meeting_id).await? else {
            return Ok(RoutedResponse::terminal(
                "I couldn't find that meeting's transcript anymore.".to_string(),
                Intent::SingleMeeting,
                DataSource::NotFound,
            ));
        };

        let answer = self
            .orchestrator
            .answer(&meeting, &request.message_text, has_pending_offer, None, false)
            .await;

        Ok(RoutedResponse::from_meeting_answer(
            answer,
            Intent::SingleMeeting,
            Vec::new(),
            Some(meeting.id),
        ))
    }

    async fn meeting_intent_turn(
        &self,
        request: &ChatTurnRequest,
        decision: crate::decision::RoutingDecision,
    ) -> Result<RoutedResponse, AssistantError> {
        let resolved = self.resolver.resolve(&request.message_text).await;
        if resolved.meetings.is_empty() {
            return Ok(RoutedResponse::terminal(
                format!(
                    "I couldn't find any meetings matching '{}'. Could you name the company or \
contact differently?",
                    resolved.searched_for
                ),
                decision.intent,
                DataSource::Clarification,
            ));
        }

        // A single-meeting turn with exactly one match goes straight to the
        // orchestrator so its guards and fast paths apply.
        if decision.intent == Intent::SingleMeeting && resolved.meetings.len() == 1 {
            let meeting_id = resolved.meetings[0].meeting_id;
            let Some(meeting) = self.load_meeting(meeting_id).await? else {
                return Ok(RoutedResponse::terminal(
                    "I couldn't find that meeting's transcript anymore.".to_string(),
                    Intent::SingleMeeting,
                    DataSource::NotFound,
                ));
            };
            let contract = decision
                .contract_chain
                .first()
                .copied()
                .unwrap_or(AnswerContract::ExtractiveFact);
            let answer = self
                .orchestrator
                .answer(
                    &meeting,
                    &request.message_text,
                    false,
                    Some(contract),
                    decision.requires_semantic,
                )
                .await;
            return Ok(RoutedResponse::from_meeting_answer(
                answer,
                Intent::SingleMeeting,
                vec![contract],
                Some(meeting_id),
            ));
        }

        let execution = self
            .executor
            .execute(
                &decision.contract_chain,
                &request.message_text,
                &resolved.meetings,
                resolved.topic.as_deref(),
            )
            .await;

        Ok(RoutedResponse {
            answer: execution.final_output,
            metadata: TurnMetadata {
                intent: decision.intent,
                contract_chain: decision.contract_chain,
                data_source: execution.data_source,
                citations: execution.citations,
                decision_log: execution.decision_log,
                pending_offer: PendingOffer::None,
            },
            meeting_id: None,
        })
    }

    async fn load_meeting(&self, meeting_id: Uuid) -> Result<Option<Meeting>, AssistantError> {
        Ok(self.store.get_transcript_by_id(meeting_id).await?)
    }
}

struct RoutedResponse {
    answer: String,
    metadata: TurnMetadata,
    meeting_id: Option<Uuid>,
}

impl RoutedResponse {
    fn terminal(answer: String, intent: Intent, data_source: DataSource) -> Self {
        Self {
            answer,
            metadata: TurnMetadata {
                intent,
                contract_chain: Vec::new(),
                data_source,
                citations: Vec::new(),
                decision_log: Vec::new(),
                pending_offer: PendingOffer::None,
            },
            meeting_id: None,
        }
    }

    fn from_meeting_answer(
        answer: MeetingAnswer,
        intent: Intent,
        contract_chain: Vec<AnswerContract>,
        meeting_id: Option<Uuid>,
    ) -> Self {
        Self {
            metadata: TurnMetadata {
                intent,
                contract_chain,
                data_source: answer.data_source,
                citations: Vec::new(),
                decision_log: Vec::new(),
                pending_offer: answer.pending_offer,
            },
            answer: answer.answer,
            meeting_id,
        }
    }
}
