use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::ServiceError;

/// Structured snapshot of verified product facts. Only contracts with an
/// authoritative SSOT mode may treat this as authority; everywhere else it
/// is prompt framing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductKnowledge {
    pub sections: Vec<ProductKnowledgeSection>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductKnowledgeSection {
    pub title: String,
    pub body: String,
}

impl ProductKnowledge {
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn render(&self) -> String {
        self.sections
            .iter()
            .map(|section| format!("## {}\n{}", section.title, section.body))
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

#[async_trait]
pub trait ProductKnowledgeService: Send + Sync {
    /// `Ok(None)` means the service is reachable but has no verified data;
    /// authoritative contracts must fail closed on it.
    async fn fetch(&self) -> Result<Option<ProductKnowledge>, ServiceError>;
}

pub struct HttpProductKnowledgeService {
    client: reqwest::Client,
    url: String,
}

impl HttpProductKnowledgeService {
    pub fn new(url: String, timeout_ms: u64) -> Result<Self, ServiceError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()
            .map_err(|err| ServiceError::RequestFailed(err.to_string()))?;
        Ok(Self { client, url })
    }
}

#[async_trait]
impl ProductKnowledgeService for HttpProductKnowledgeService {
    async fn fetch(&self) -> Result<Option<ProductKnowledge>, ServiceError> {
        let response = self.client.get(&self.url).send().await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(ServiceError::RequestFailed(format!(
                "status={}",
                response.status().as_u16()
            )));
        }

        let knowledge: ProductKnowledge = response
            .json()
            .await
            .map_err(|err| ServiceError::InvalidPayload(err.to_string()))?;
        if knowledge.is_empty() {
            return Ok(None);
        }
        Ok(Some(knowledge))
    }
}
