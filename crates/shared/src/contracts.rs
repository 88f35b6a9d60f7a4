use serde::{Deserialize, Serialize};

use crate::models::Intent;

/// The shape of a requested answer. Closed set; the decision layer maps every
/// turn into a chain of these and nothing else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerContract {
    ExtractiveFact,
    Attendees,
    CustomerQuestions,
    NextSteps,
    AggregativeList,
    MeetingSummary,
    DraftFollowUp,
    PatternAnalysis,
    TrendSummary,
    Comparison,
    CrossMeetingQuestions,
    DocumentLookup,
    ProductFacts,
    ResearchBrief,
}

impl AnswerContract {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ExtractiveFact => "extractive_fact",
            Self::Attendees => "attendees",
            Self::CustomerQuestions => "customer_questions",
            Self::NextSteps => "next_steps",
            Self::AggregativeList => "aggregative_list",
            Self::MeetingSummary => "meeting_summary",
            Self::DraftFollowUp => "draft_follow_up",
            Self::PatternAnalysis => "pattern_analysis",
            Self::TrendSummary => "trend_summary",
            Self::Comparison => "comparison",
            Self::CrossMeetingQuestions => "cross_meeting_questions",
            Self::DocumentLookup => "document_lookup",
            Self::ProductFacts => "product_facts",
            Self::ResearchBrief => "research_brief",
        }
    }

    pub fn constraints(&self) -> ContractConstraints {
        match self {
            Self::ExtractiveFact => ContractConstraints {
                ssot_mode: SsotMode::Tier1Artifacts,
                response_format: ResponseFormat::Narrative,
                requires_citation: false,
                min_evidence_threshold: None,
                empty_result_behavior: None,
            },
            Self::Attendees | Self::CustomerQuestions | Self::NextSteps | Self::AggregativeList => {
                ContractConstraints {
                    ssot_mode: SsotMode::Tier1Artifacts,
                    response_format: ResponseFormat::Bullets,
                    requires_citation: false,
                    min_evidence_threshold: None,
                    empty_result_behavior: None,
                }
            }
            Self::MeetingSummary | Self::DraftFollowUp => ContractConstraints {
                ssot_mode: SsotMode::Tier1Artifacts,
                response_format: ResponseFormat::Narrative,
                requires_citation: false,
                min_evidence_threshold: None,
                empty_result_behavior: None,
            },
            Self::PatternAnalysis => ContractConstraints {
                ssot_mode: SsotMode::Tier1Artifacts,
                response_format: ResponseFormat::Narrative,
                requires_citation: false,
                min_evidence_threshold: Some(2),
                empty_result_behavior: Some(EmptyResultBehavior::Clarify),
            },
            Self::TrendSummary => ContractConstraints {
                ssot_mode: SsotMode::Tier1Artifacts,
                response_format: ResponseFormat::Narrative,
                requires_citation: false,
                min_evidence_threshold: Some(3),
                empty_result_behavior: Some(EmptyResultBehavior::Clarify),
            },
            Self::Comparison => ContractConstraints {
                ssot_mode: SsotMode::Tier1Artifacts,
                response_format: ResponseFormat::Narrative,
                requires_citation: false,
                min_evidence_threshold: Some(2),
                empty_result_behavior: Some(EmptyResultBehavior::Clarify),
            },
            Self::CrossMeetingQuestions => ContractConstraints {
                ssot_mode: SsotMode::Tier1Artifacts,
                response_format: ResponseFormat::Bullets,
                requires_citation: false,
                min_evidence_threshold: Some(1),
                empty_result_behavior: Some(EmptyResultBehavior::Refuse),
            },
            Self::DocumentLookup => ContractConstraints {
                ssot_mode: SsotMode::Tier1Artifacts,
                response_format: ResponseFormat::Bullets,
                requires_citation: false,
                min_evidence_threshold: None,
                empty_result_behavior: Some(EmptyResultBehavior::Clarify),
            },
            Self::ProductFacts => ContractConstraints {
                ssot_mode: SsotMode::Authoritative,
                response_format: ResponseFormat::Narrative,
                requires_citation: false,
                min_evidence_threshold: None,
                empty_result_behavior: Some(EmptyResultBehavior::Refuse),
            },
            Self::ResearchBrief => ContractConstraints {
                ssot_mode: SsotMode::External,
                response_format: ResponseFormat::Narrative,
                requires_citation: true,
                min_evidence_threshold: None,
                empty_result_behavior: Some(EmptyResultBehavior::Refuse),
            },
        }
    }
}

/// Which body of truth a contract is allowed to draw on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SsotMode {
    /// Stored ingestion artifacts and transcript chunks only.
    Tier1Artifacts,
    /// Verified product documentation required; no fallback.
    Authoritative,
    /// Fetched external sources with citations.
    External,
}

impl SsotMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tier1Artifacts => "tier1_artifacts",
            Self::Authoritative => "authoritative",
            Self::External => "external",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseFormat {
    Bullets,
    Narrative,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyResultBehavior {
    Refuse,
    Clarify,
    Ignore,
}

#[derive(Debug, Clone)]
pub struct ContractConstraints {
    pub ssot_mode: SsotMode,
    pub response_format: ResponseFormat,
    pub requires_citation: bool,
    pub min_evidence_threshold: Option<usize>,
    pub empty_result_behavior: Option<EmptyResultBehavior>,
}

/// Which single-meeting handler runs a contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerKind {
    Extractive,
    Aggregative,
    Summary,
    Drafting,
}

pub fn handler_for_contract(contract: AnswerContract) -> HandlerKind {
    match contract {
        AnswerContract::AggregativeList => HandlerKind::Aggregative,
        AnswerContract::MeetingSummary => HandlerKind::Summary,
        AnswerContract::DraftFollowUp => HandlerKind::Drafting,
        _ => HandlerKind::Extractive,
    }
}

/// Intent → contract chain. Task-inference keywords refine the chain for
/// multi-meeting turns but never invent intents.
pub fn chain_for_intent(intent: Intent, user_message: &str) -> Vec<AnswerContract> {
    match intent {
        Intent::SingleMeeting => vec![AnswerContract::ExtractiveFact],
        Intent::MultiMeeting => vec![infer_multi_meeting_task(user_message)],
        Intent::ProductKnowledge => vec![AnswerContract::ProductFacts],
        Intent::ExternalResearch => vec![AnswerContract::ResearchBrief],
        Intent::DocumentSearch => vec![AnswerContract::DocumentLookup],
        Intent::GeneralHelp | Intent::Clarify | Intent::Refuse => Vec::new(),
    }
}

fn infer_multi_meeting_task(user_message: &str) -> AnswerContract {
    let normalized = user_message.to_lowercase();
    if normalized.contains("pattern") || normalized.contains("recurring") {
        return AnswerContract::PatternAnalysis;
    }
    if normalized.contains("compare") || normalized.contains("differ") {
        return AnswerContract::Comparison;
    }
    if normalized.contains("trend") || normalized.contains("over time") {
        return AnswerContract::TrendSummary;
    }
    if normalized.contains("question") || normalized.contains("asked") {
        return AnswerContract::CrossMeetingQuestions;
    }
    AnswerContract::PatternAnalysis
}
