use std::collections::HashMap;
use std::env;
use std::time::Duration;

use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{Value, json};
use thiserror::Error;
use tokio::time::sleep;
use tracing::debug;

use crate::config::{AppConfig, ModelRoles};

use super::gateway::{
    LlmCompletion, LlmGateway, LlmGatewayError, LlmGatewayFuture, LlmRequest, LlmUsage, ModelRole,
};

const DEFAULT_CHAT_COMPLETIONS_URL: &str = "https://openrouter.ai/api/v1/chat/completions";
const DEFAULT_MAX_RETRIES: u32 = 2;
const DEFAULT_RETRY_BASE_BACKOFF_MS: u64 = 250;
const FALLBACK_MODEL: &str = "openai/gpt-4o-mini";

#[derive(Debug, Error)]
pub enum OpenRouterConfigError {
    #[error("missing required env var {0}")]
    MissingVar(String),
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("failed to build OpenRouter http client: {0}")]
    HttpClient(String),
}

#[derive(Debug, Clone)]
pub struct OpenRouterGatewayConfig {
    pub chat_completions_url: String,
    pub api_key: String,
    pub timeout_ms: u64,
    pub max_retries: u32,
    pub retry_base_backoff_ms: u64,
    /// Primary model per role; a shared fallback model covers provider
    /// outages on any role.
    pub role_models: HashMap<ModelRole, String>,
    pub fallback_model: String,
}

impl OpenRouterGatewayConfig {
    pub fn from_env(app_config: &AppConfig) -> Result<Self, OpenRouterConfigError> {
        let api_key = env::var("OPENROUTER_API_KEY")
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .ok_or_else(|| OpenRouterConfigError::MissingVar("OPENROUTER_API_KEY".to_string()))?;

        let chat_completions_url = env::var("OPENROUTER_CHAT_COMPLETIONS_URL")
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_CHAT_COMPLETIONS_URL.to_string());
        if !chat_completions_url.starts_with("http://")
            && !chat_completions_url.starts_with("https://")
        {
            return Err(OpenRouterConfigError::InvalidConfiguration(
                "OPENROUTER_CHAT_COMPLETIONS_URL must start with http:// or https://".to_string(),
            ));
        }

        Ok(Self {
            chat_completions_url,
            api_key,
            timeout_ms: app_config.llm_timeout_ms,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_base_backoff_ms: DEFAULT_RETRY_BASE_BACKOFF_MS,
            role_models: role_models(&app_config.models),
            fallback_model: FALLBACK_MODEL.to_string(),
        })
    }
}

fn role_models(models: &ModelRoles) -> HashMap<ModelRole, String> {
    HashMap::from([
        (ModelRole::Intent, models.intent.clone()),
        (
            ModelRole::SingleMeetingResponse,
            models.single_meeting_response.clone(),
        ),
        (ModelRole::ExecutiveSummary, models.executive_summary.clone()),
        (
            ModelRole::MultiMeetingSynthesis,
            models.multi_meeting_synthesis.clone(),
        ),
        (ModelRole::KbAssessment, models.kb_assessment.clone()),
    ])
}

/// Why one HTTP attempt failed, and what the caller may still do about it:
/// retry the same model, move on to the fallback model, or give up.
struct AttemptFailure {
    error: LlmGatewayError,
    can_retry: bool,
    can_fall_back: bool,
}

impl AttemptFailure {
    fn transient(error: LlmGatewayError) -> Self {
        Self {
            error,
            can_retry: true,
            can_fall_back: true,
        }
    }

    fn terminal(error: LlmGatewayError) -> Self {
        Self {
            error,
            can_retry: false,
            can_fall_back: true,
        }
    }
}

/// Throttling and transient server trouble are worth retrying; anything else
/// fails the attempt outright.
fn status_allows_retry(status: StatusCode) -> bool {
    status == StatusCode::REQUEST_TIMEOUT
        || status == StatusCode::TOO_MANY_REQUESTS
        || status.is_server_error()
}

fn token_count(value: Option<u64>) -> u32 {
    value.map_or(0, |count| u32::try_from(count).unwrap_or(u32::MAX))
}

#[derive(Clone)]
pub struct OpenRouterGateway {
    client: reqwest::Client,
    config: OpenRouterGatewayConfig,
}

impl OpenRouterGateway {
    pub fn new(config: OpenRouterGatewayConfig) -> Result<Self, OpenRouterConfigError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|err| OpenRouterConfigError::HttpClient(err.to_string()))?;

        Ok(Self { client, config })
    }

    fn candidate_models(&self, role: ModelRole) -> Vec<&str> {
        let mut candidates = Vec::new();
        if let Some(primary) = self.config.role_models.get(&role)
            && !primary.is_empty()
        {
            candidates.push(primary.as_str());
        }
        let fallback = self.config.fallback_model.as_str();
        if !fallback.is_empty() && !candidates.contains(&fallback) {
            candidates.push(fallback);
        }
        candidates
    }

    /// Retries transient failures against one model with doubling backoff,
    /// up to the configured budget.
    async fn complete_with_model(
        &self,
        model: &str,
        request: &LlmRequest,
    ) -> Result<LlmCompletion, AttemptFailure> {
        let mut attempt = 0_u32;
        let mut backoff_ms = self.config.retry_base_backoff_ms;

        loop {
            match self.send_once(model, request).await {
                Ok(completion) => return Ok(completion),
                Err(failure) => {
                    if !failure.can_retry || attempt >= self.config.max_retries {
                        return Err(failure);
                    }
                    sleep(Duration::from_millis(backoff_ms)).await;
                    backoff_ms = backoff_ms.saturating_mul(2);
                    attempt += 1;
                }
            }
        }
    }

    async fn send_once(
        &self,
        model: &str,
        request: &LlmRequest,
    ) -> Result<LlmCompletion, AttemptFailure> {
        let mut request_body = json!({
            "model": model,
            "messages": [
                { "role": "system", "content": request.system_prompt },
                { "role": "user", "content": request.user_prompt }
            ],
            "temperature": request.temperature,
        });
        if request.json_output {
            request_body["response_format"] = json!({ "type": "json_object" });
        }
        if let Some(max_tokens) = request.max_tokens {
            request_body["max_tokens"] = json!(max_tokens);
        }

        debug!(role = request.role.as_str(), model, "dispatching llm request");

        let response = self
            .client
            .post(&self.config.chat_completions_url)
            .bearer_auth(&self.config.api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(|err| {
                if err.is_timeout() {
                    AttemptFailure::transient(LlmGatewayError::DeadlineExceeded)
                } else {
                    AttemptFailure::transient(LlmGatewayError::Provider(
                        "provider unreachable".to_string(),
                    ))
                }
            })?;

        let status = response.status();
        let request_id = response
            .headers()
            .get("x-request-id")
            .and_then(|value| value.to_str().ok())
            .map(ToString::to_string);
        let body = response.text().await.map_err(|_| {
            AttemptFailure::terminal(LlmGatewayError::UnusableReply(
                "response body unreadable".to_string(),
            ))
        })?;

        if !status.is_success() {
            // An auth rejection would hit the fallback model just as hard.
            return Err(AttemptFailure {
                error: LlmGatewayError::Provider(format!(
                    "status={} code={}",
                    status.as_u16(),
                    provider_error_code(&body)
                )),
                can_retry: status_allows_retry(status),
                can_fall_back: status != StatusCode::UNAUTHORIZED
                    && status != StatusCode::FORBIDDEN,
            });
        }

        let parsed: ChatCompletionsResponse = serde_json::from_str(&body).map_err(|_| {
            AttemptFailure::terminal(LlmGatewayError::UnusableReply(
                "malformed completion payload".to_string(),
            ))
        })?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| {
                AttemptFailure::terminal(LlmGatewayError::UnusableReply(
                    "reply carried no choices".to_string(),
                ))
            })?
            .message
            .content;

        let text = match content {
            Value::String(text) => text,
            value @ (Value::Object(_) | Value::Array(_)) => value.to_string(),
            _ => {
                return Err(AttemptFailure::terminal(LlmGatewayError::UnusableReply(
                    "unsupported content shape".to_string(),
                )));
            }
        };

        Ok(LlmCompletion {
            model: parsed.model.unwrap_or_else(|| model.to_string()),
            provider_request_id: request_id.or(parsed.id),
            text,
            usage: parsed.usage.map(|usage| LlmUsage {
                input_tokens: token_count(usage.prompt_tokens),
                output_tokens: token_count(usage.completion_tokens),
                total_tokens: token_count(usage.total_tokens),
            }),
        })
    }
}

impl LlmGateway for OpenRouterGateway {
    fn complete<'a>(&'a self, request: LlmRequest) -> LlmGatewayFuture<'a> {
        Box::pin(async move {
            let candidates = self.candidate_models(request.role);

            for (index, model) in candidates.iter().enumerate() {
                match self.complete_with_model(model, &request).await {
                    Ok(completion) => return Ok(completion),
                    Err(failure) => {
                        let has_fallback_left = index + 1 < candidates.len();
                        if !(has_fallback_left && failure.can_fall_back) {
                            return Err(failure.error);
                        }
                    }
                }
            }

            Err(LlmGatewayError::Provider(
                "no model candidates configured".to_string(),
            ))
        })
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletionsResponse {
    id: Option<String>,
    model: Option<String>,
    choices: Vec<ChatChoice>,
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Value,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    prompt_tokens: Option<u64>,
    completion_tokens: Option<u64>,
    total_tokens: Option<u64>,
}

fn provider_error_code(body: &str) -> String {
    #[derive(Deserialize)]
    struct ErrorEnvelope {
        error: Option<ErrorDetails>,
    }

    #[derive(Deserialize)]
    struct ErrorDetails {
        code: Option<Value>,
    }

    let code = serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .and_then(|envelope| envelope.error)
        .and_then(|details| details.code);

    match code {
        Some(Value::String(code)) => code,
        Some(Value::Number(code)) => code.to_string(),
        _ => "unknown".to_string(),
    }
}
