use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type LlmGatewayFuture<'a> =
    Pin<Box<dyn Future<Output = Result<LlmCompletion, LlmGatewayError>> + Send + 'a>>;

/// Every bounded LLM call in the core belongs to exactly one role; the
/// gateway resolves each role to a configured model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelRole {
    Intent,
    SingleMeetingResponse,
    ExecutiveSummary,
    MultiMeetingSynthesis,
    KbAssessment,
}

impl ModelRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Intent => "intent",
            Self::SingleMeetingResponse => "single_meeting_response",
            Self::ExecutiveSummary => "executive_summary",
            Self::MultiMeetingSynthesis => "multi_meeting_synthesis",
            Self::KbAssessment => "kb_assessment",
        }
    }
}

#[derive(Debug, Clone)]
pub struct LlmRequest {
    pub role: ModelRole,
    pub system_prompt: String,
    pub user_prompt: String,
    pub json_output: bool,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
}

impl LlmRequest {
    pub fn new(role: ModelRole, system_prompt: impl Into<String>, user_prompt: impl Into<String>) -> Self {
        Self {
            role,
            system_prompt: system_prompt.into(),
            user_prompt: user_prompt.into(),
            json_output: false,
            temperature: 0.0,
            max_tokens: None,
        }
    }

    pub fn with_json_output(mut self) -> Self {
        self.json_output = true;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// Token counts as the provider reported them, normalized to input/output.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LlmUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub total_tokens: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmCompletion {
    pub model: String,
    pub provider_request_id: Option<String>,
    pub text: String,
    pub usage: Option<LlmUsage>,
}

#[derive(Debug, Error)]
pub enum LlmGatewayError {
    #[error("llm call exceeded its deadline")]
    DeadlineExceeded,
    #[error("llm provider error: {0}")]
    Provider(String),
    #[error("llm reply was unusable: {0}")]
    UnusableReply(String),
}

pub trait LlmGateway: Send + Sync {
    fn complete<'a>(&'a self, request: LlmRequest) -> LlmGatewayFuture<'a>;
}
