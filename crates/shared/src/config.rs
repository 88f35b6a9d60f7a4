use thiserror::Error;

use crate::config_env::{optional_trimmed_env, parse_u64_env, parse_usize_env, string_env};

const DEFAULT_MAX_MEETINGS_PER_COMPANY: usize = 25;
const DEFAULT_MAX_TOTAL_TRANSCRIPTS: usize = 50;
const DEFAULT_CROSS_MEETING_FANOUT: usize = 5;
const DEFAULT_SUMMARY_CHUNK_LIMIT: usize = 60;
const DEFAULT_SUMMARY_CHAR_BUDGET: usize = 15_000;
const DEFAULT_SNIPPET_CHAR_BUDGET: usize = 300;
const DEFAULT_LLM_TIMEOUT_MS: u64 = 30_000;
const DEFAULT_RESEARCH_TIMEOUT_MS: u64 = 15_000;
const DEFAULT_STORE_QUERY_TIMEOUT_MS: u64 = 5_000;

const DEFAULT_INTENT_MODEL: &str = "openai/gpt-4o-mini";
const DEFAULT_SINGLE_MEETING_MODEL: &str = "anthropic/claude-3.5-haiku";
const DEFAULT_EXECUTIVE_SUMMARY_MODEL: &str = "anthropic/claude-3.5-sonnet";
const DEFAULT_MULTI_MEETING_MODEL: &str = "anthropic/claude-3.5-sonnet";
const DEFAULT_KB_ASSESSMENT_MODEL: &str = "openai/gpt-4o-mini";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required env var {0}")]
    MissingVar(String),
    #[error("invalid integer in env var {0}")]
    ParseInt(String),
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
}

/// Model identifiers per LLM role. Every bounded LLM call in the core is
/// tagged with exactly one of these roles.
#[derive(Debug, Clone)]
pub struct ModelRoles {
    pub intent: String,
    pub single_meeting_response: String,
    pub executive_summary: String,
    pub multi_meeting_synthesis: String,
    pub kb_assessment: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub max_meetings_per_company: usize,
    pub max_total_transcripts: usize,
    pub cross_meeting_fanout: usize,
    pub summary_chunk_limit: usize,
    pub summary_char_budget: usize,
    pub snippet_char_budget: usize,
    pub llm_timeout_ms: u64,
    pub research_timeout_ms: u64,
    pub store_query_timeout_ms: u64,
    pub models: ModelRoles,
    pub product_knowledge_url: Option<String>,
    pub research_service_url: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = Self {
            max_meetings_per_company: parse_usize_env(
                "MAX_MEETINGS_PER_COMPANY",
                DEFAULT_MAX_MEETINGS_PER_COMPANY,
            )?,
            max_total_transcripts: parse_usize_env(
                "MAX_TOTAL_TRANSCRIPTS",
                DEFAULT_MAX_TOTAL_TRANSCRIPTS,
            )?,
            cross_meeting_fanout: parse_usize_env(
                "CROSS_MEETING_FANOUT",
                DEFAULT_CROSS_MEETING_FANOUT,
            )?,
            summary_chunk_limit: parse_usize_env(
                "SUMMARY_CHUNK_LIMIT",
                DEFAULT_SUMMARY_CHUNK_LIMIT,
            )?,
            summary_char_budget: parse_usize_env(
                "SUMMARY_CHAR_BUDGET",
                DEFAULT_SUMMARY_CHAR_BUDGET,
            )?,
            snippet_char_budget: parse_usize_env(
                "TRANSCRIPT_SNIPPET_CHAR_BUDGET",
                DEFAULT_SNIPPET_CHAR_BUDGET,
            )?,
            llm_timeout_ms: parse_u64_env("LLM_TIMEOUT_MS", DEFAULT_LLM_TIMEOUT_MS)?,
            research_timeout_ms: parse_u64_env("RESEARCH_TIMEOUT_MS", DEFAULT_RESEARCH_TIMEOUT_MS)?,
            store_query_timeout_ms: parse_u64_env(
                "STORE_QUERY_TIMEOUT_MS",
                DEFAULT_STORE_QUERY_TIMEOUT_MS,
            )?,
            models: ModelRoles {
                intent: string_env("LLM_MODEL_INTENT", DEFAULT_INTENT_MODEL),
                single_meeting_response: string_env(
                    "LLM_MODEL_SINGLE_MEETING_RESPONSE",
                    DEFAULT_SINGLE_MEETING_MODEL,
                ),
                executive_summary: string_env(
                    "LLM_MODEL_EXECUTIVE_SUMMARY",
                    DEFAULT_EXECUTIVE_SUMMARY_MODEL,
                ),
                multi_meeting_synthesis: string_env(
                    "LLM_MODEL_MULTI_MEETING_SYNTHESIS",
                    DEFAULT_MULTI_MEETING_MODEL,
                ),
                kb_assessment: string_env("LLM_MODEL_KB_ASSESSMENT", DEFAULT_KB_ASSESSMENT_MODEL),
            },
            product_knowledge_url: optional_trimmed_env("PRODUCT_KNOWLEDGE_URL"),
            research_service_url: optional_trimmed_env("RESEARCH_SERVICE_URL"),
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_meetings_per_company == 0 {
            return Err(ConfigError::InvalidConfiguration(
                "MAX_MEETINGS_PER_COMPANY must be > 0".to_string(),
            ));
        }
        if self.max_total_transcripts == 0 {
            return Err(ConfigError::InvalidConfiguration(
                "MAX_TOTAL_TRANSCRIPTS must be > 0".to_string(),
            ));
        }
        if self.cross_meeting_fanout == 0 {
            return Err(ConfigError::InvalidConfiguration(
                "CROSS_MEETING_FANOUT must be > 0".to_string(),
            ));
        }
        for (key, url) in [
            ("PRODUCT_KNOWLEDGE_URL", &self.product_knowledge_url),
            ("RESEARCH_SERVICE_URL", &self.research_service_url),
        ] {
            if let Some(url) = url
                && !url.starts_with("http://")
                && !url.starts_with("https://")
            {
                return Err(ConfigError::InvalidConfiguration(format!(
                    "{key} must start with http:// or https://"
                )));
            }
        }
        Ok(())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            max_meetings_per_company: DEFAULT_MAX_MEETINGS_PER_COMPANY,
            max_total_transcripts: DEFAULT_MAX_TOTAL_TRANSCRIPTS,
            cross_meeting_fanout: DEFAULT_CROSS_MEETING_FANOUT,
            summary_chunk_limit: DEFAULT_SUMMARY_CHUNK_LIMIT,
            summary_char_budget: DEFAULT_SUMMARY_CHAR_BUDGET,
            snippet_char_budget: DEFAULT_SNIPPET_CHAR_BUDGET,
            llm_timeout_ms: DEFAULT_LLM_TIMEOUT_MS,
            research_timeout_ms: DEFAULT_RESEARCH_TIMEOUT_MS,
            store_query_timeout_ms: DEFAULT_STORE_QUERY_TIMEOUT_MS,
            models: ModelRoles {
                intent: DEFAULT_INTENT_MODEL.to_string(),
                single_meeting_response: DEFAULT_SINGLE_MEETING_MODEL.to_string(),
                executive_summary: DEFAULT_EXECUTIVE_SUMMARY_MODEL.to_string(),
                multi_meeting_synthesis: DEFAULT_MULTI_MEETING_MODEL.to_string(),
                kb_assessment: DEFAULT_KB_ASSESSMENT_MODEL.to_string(),
            },
            product_knowledge_url: None,
            research_service_url: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub database_url: Option<String>,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self {
            bind_addr: string_env("BIND_ADDR", "127.0.0.1:8080"),
            database_url: optional_trimmed_env("DATABASE_URL"),
        }
    }
}
