use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::models::Citation;

use super::ServiceError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchAnswer {
    pub answer: String,
    pub citations: Vec<Citation>,
    pub confidence: f32,
}

#[async_trait]
pub trait ResearchService: Send + Sync {
    async fn research(
        &self,
        query: &str,
        company_hint: Option<&str>,
        topic_hint: Option<&str>,
    ) -> Result<ResearchAnswer, ServiceError>;
}

pub struct HttpResearchService {
    client: reqwest::Client,
    url: String,
}

impl HttpResearchService {
    pub fn new(url: String, timeout_ms: u64) -> Result<Self, ServiceError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()
            .map_err(|err| ServiceError::RequestFailed(err.to_string()))?;
        Ok(Self { client, url })
    }
}

#[async_trait]
impl ResearchService for HttpResearchService {
    async fn research(
        &self,
        query: &str,
        company_hint: Option<&str>,
        topic_hint: Option<&str>,
    ) -> Result<ResearchAnswer, ServiceError> {
        let response = self
            .client
            .post(&self.url)
            .json(&json!({
                "query": query,
                "company_hint": company_hint,
                "topic_hint": topic_hint,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ServiceError::RequestFailed(format!(
                "status={}",
                response.status().as_u16()
            )));
        }

        response
            .json()
            .await
            .map_err(|err| ServiceError::InvalidPayload(err.to_string()))
    }
}
