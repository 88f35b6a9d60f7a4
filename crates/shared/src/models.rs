use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::contracts::AnswerContract;
use crate::store::StoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpeakerRole {
    Internal,
    Customer,
    Unknown,
}

impl SpeakerRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Internal => "internal",
            Self::Customer => "customer",
            Self::Unknown => "unknown",
        }
    }

    pub fn from_db(value: &str) -> Self {
        match value {
            "internal" => Self::Internal,
            "customer" => Self::Customer,
            _ => Self::Unknown,
        }
    }
}

/// One recorded customer meeting. Attendee fields hold the comma-separated
/// strings materialized by the ingestion pipeline.
#[derive(Debug, Clone)]
pub struct Meeting {
    pub id: Uuid,
    pub company_id: Uuid,
    pub company_name: String,
    pub meeting_date: Option<NaiveDate>,
    pub team_attendees: String,
    pub customer_attendees: String,
    pub created_at: DateTime<Utc>,
}

impl Meeting {
    pub fn context(&self) -> MeetingContext {
        MeetingContext {
            meeting_id: self.id,
            company_id: self.company_id,
            company_name: self.company_name.clone(),
            meeting_date: self.meeting_date,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Chunk {
    pub transcript_id: Uuid,
    pub chunk_index: i32,
    pub speaker: Option<String>,
    pub speaker_role: SpeakerRole,
    pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QaStatus {
    Open,
    Answered,
    Deferred,
}

impl QaStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "OPEN",
            Self::Answered => "ANSWERED",
            Self::Deferred => "DEFERRED",
        }
    }

    pub fn from_db(value: &str) -> Result<Self, StoreError> {
        match value {
            "OPEN" => Ok(Self::Open),
            "ANSWERED" => Ok(Self::Answered),
            "DEFERRED" => Ok(Self::Deferred),
            _ => Err(StoreError::InvalidData(format!(
                "unknown qa pair status persisted: {value}"
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct QaPair {
    pub transcript_id: Uuid,
    pub question: String,
    pub asker: Option<String>,
    pub status: QaStatus,
    pub answer: Option<String>,
    pub answered_by: Option<String>,
    pub question_turn: i32,
    pub resolution_turn: Option<i32>,
}

/// Extracted commitment from a meeting. Rows with `confidence == 0` are
/// backfill sentinels and must never reach a user-facing answer.
#[derive(Debug, Clone)]
pub struct ActionItem {
    pub transcript_id: Uuid,
    pub action: String,
    pub owner: String,
    pub item_type: String,
    pub deadline: String,
    pub evidence: String,
    pub confidence: f32,
    pub is_primary: bool,
}

pub const DEADLINE_NOT_SPECIFIED: &str = "Not specified";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeetingContext {
    pub meeting_id: Uuid,
    pub company_id: Uuid,
    pub company_name: String,
    pub meeting_date: Option<NaiveDate>,
}

#[derive(Debug, Clone)]
pub struct CompanyRecord {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct ContactRecord {
    pub id: Uuid,
    pub name: String,
    pub company_id: Uuid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PendingOffer {
    #[default]
    None,
    Summary,
}

impl PendingOffer {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Summary => "summary",
        }
    }

    pub fn from_db(value: &str) -> Result<Self, StoreError> {
        match value {
            "none" => Ok(Self::None),
            "summary" => Ok(Self::Summary),
            _ => Err(StoreError::InvalidData(format!(
                "unknown pending offer persisted: {value}"
            ))),
        }
    }
}

/// Per-thread append-only log entry. The core reads only the most recent
/// entry per thread, at the start of a turn. `meeting_id` is the meeting a
/// pending offer refers to, when the turn was bound to one.
#[derive(Debug, Clone)]
pub struct InteractionRecord {
    pub thread_id: String,
    pub created_at: DateTime<Utc>,
    pub intent: String,
    pub data_source: DataSource,
    pub last_answer: String,
    pub pending_offer: PendingOffer,
    pub meeting_id: Option<Uuid>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    SingleMeeting,
    MultiMeeting,
    ProductKnowledge,
    ExternalResearch,
    DocumentSearch,
    GeneralHelp,
    Clarify,
    Refuse,
}

impl Intent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SingleMeeting => "single_meeting",
            Self::MultiMeeting => "multi_meeting",
            Self::ProductKnowledge => "product_knowledge",
            Self::ExternalResearch => "external_research",
            Self::DocumentSearch => "document_search",
            Self::GeneralHelp => "general_help",
            Self::Clarify => "clarify",
            Self::Refuse => "refuse",
        }
    }
}

/// Identifies the retriever (or terminal state) an answer was produced from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    Attendees,
    QaPairs,
    ActionItems,
    Transcript,
    Summary,
    Semantic,
    BinaryAnswer,
    Drafting,
    MultiMeeting,
    ProductKnowledge,
    Research,
    Clarification,
    NotFound,
    Refusal,
    Help,
}

impl DataSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Attendees => "attendees",
            Self::QaPairs => "qa_pairs",
            Self::ActionItems => "action_items",
            Self::Transcript => "transcript",
            Self::Summary => "summary",
            Self::Semantic => "semantic",
            Self::BinaryAnswer => "binary_answer",
            Self::Drafting => "drafting",
            Self::MultiMeeting => "multi_meeting",
            Self::ProductKnowledge => "product_knowledge",
            Self::Research => "research",
            Self::Clarification => "clarification",
            Self::NotFound => "not_found",
            Self::Refusal => "refusal",
            Self::Help => "help",
        }
    }

    pub fn from_db(value: &str) -> Result<Self, StoreError> {
        let parsed = match value {
            "attendees" => Self::Attendees,
            "qa_pairs" => Self::QaPairs,
            "action_items" => Self::ActionItems,
            "transcript" => Self::Transcript,
            "summary" => Self::Summary,
            "semantic" => Self::Semantic,
            "binary_answer" => Self::BinaryAnswer,
            "drafting" => Self::Drafting,
            "multi_meeting" => Self::MultiMeeting,
            "product_knowledge" => Self::ProductKnowledge,
            "research" => Self::Research,
            "clarification" => Self::Clarification,
            "not_found" => Self::NotFound,
            "refusal" => Self::Refusal,
            "help" => Self::Help,
            _ => {
                return Err(StoreError::InvalidData(format!(
                    "unknown data source persisted: {value}"
                )));
            }
        };
        Ok(parsed)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChatTurnRequest {
    pub thread_id: String,
    pub message_text: String,
    #[serde(default)]
    pub thread_messages: Vec<String>,
    /// Set when the chat surface already bound this thread to one meeting.
    #[serde(default)]
    pub resolved_meeting_id: Option<Uuid>,
    #[serde(default)]
    pub contract_override: Option<AnswerContract>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Citation {
    pub source: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractOutcome {
    Executed,
    ShortCircuitClarify,
    ShortCircuitRefuse,
    EvidenceThresholdNotMet,
    EmptyEvidence,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractDecision {
    pub contract: AnswerContract,
    pub authority: String,
    pub authority_validated: bool,
    pub evidence_count: usize,
    pub outcome: ContractOutcome,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnMetadata {
    pub intent: Intent,
    pub contract_chain: Vec<AnswerContract>,
    pub data_source: DataSource,
    #[serde(default)]
    pub citations: Vec<Citation>,
    #[serde(default)]
    pub decision_log: Vec<ContractDecision>,
    pub pending_offer: PendingOffer,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurnResponse {
    pub answer: String,
    pub metadata: TurnMetadata,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}
