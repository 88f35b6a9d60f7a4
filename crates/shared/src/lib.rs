pub mod assistant;
pub mod config;
mod config_env;
pub mod contracts;
pub mod decision;
pub mod detectors;
pub mod executor;
pub mod llm;
pub mod markup;
pub mod models;
pub mod orchestrator;
pub mod resolver;
pub mod retrieval;
pub mod services;
pub mod store;

pub use assistant::{AssistantError, AssistantHandler, HELP_TEXT, REFUSAL_TEXT};
pub use config::{AppConfig, ConfigError, ModelRoles, ServerConfig};
pub use contracts::{
    AnswerContract, ContractConstraints, EmptyResultBehavior, HandlerKind, ResponseFormat,
    SsotMode, chain_for_intent, handler_for_contract,
};
pub use decision::{DecisionLayer, RoutingDecision};
pub use executor::{AUTHORITY_REFUSAL, ChainExecution, ContractExecutor};
pub use orchestrator::{AnswerKind, MeetingAnswer, SingleMeetingOrchestrator};
pub use resolver::{MeetingExcerptGroup, MeetingResolver, ResolvedMeetings};
