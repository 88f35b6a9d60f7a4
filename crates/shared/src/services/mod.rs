use thiserror::Error;

pub mod product_knowledge;
pub mod research;

pub use product_knowledge::{
    HttpProductKnowledgeService, ProductKnowledge, ProductKnowledgeSection,
    ProductKnowledgeService,
};
pub use research::{HttpResearchService, ResearchAnswer, ResearchService};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("service request timed out")]
    Timeout,
    #[error("service request failed: {0}")]
    RequestFailed(String),
    #[error("service returned an invalid payload: {0}")]
    InvalidPayload(String),
}

impl From<reqwest::Error> for ServiceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::RequestFailed(err.to_string())
        }
    }
}
