#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use async_trait::async_trait;

use shared::assistant::AssistantHandler;
use shared::config::AppConfig;
use shared::decision::DecisionLayer;
use shared::executor::ContractExecutor;
use shared::llm::{LlmCompletion, LlmGateway, LlmGatewayError, LlmGatewayFuture, LlmRequest};
use shared::models::{ActionItem, Chunk, CompanyRecord, Meeting, QaPair, QaStatus, SpeakerRole};
use shared::orchestrator::SingleMeetingOrchestrator;
use shared::resolver::MeetingResolver;
use shared::services::{
    ProductKnowledge, ProductKnowledgeSection, ProductKnowledgeService, ServiceError,
};
use shared::store::InMemoryArtifactStore;

/// LLM gateway that replays scripted replies in order and records every
/// request it saw. An empty script fails the call, which exercises the
/// degraded paths.
pub struct ScriptedGateway {
    replies: Mutex<VecDeque<String>>,
    requests: Mutex<Vec<LlmRequest>>,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn push_reply(&self, text: impl Into<String>) {
        self.replies
            .lock()
            .expect("scripted replies lock")
            .push_back(text.into());
    }

    pub fn recorded_requests(&self) -> Vec<LlmRequest> {
        self.requests.lock().expect("recorded requests lock").clone()
    }
}

impl LlmGateway for ScriptedGateway {
    fn complete<'a>(&'a self, request: LlmRequest) -> LlmGatewayFuture<'a> {
        self.requests
            .lock()
            .expect("recorded requests lock")
            .push(request);
        let reply = self
            .replies
            .lock()
            .expect("scripted replies lock")
            .pop_front();
        Box::pin(async move {
            match reply {
                Some(text) => Ok(LlmCompletion {
                    model: "scripted".to_string(),
                    provider_request_id: None,
                    text,
                    usage: None,
                }),
                None => Err(LlmGatewayError::Provider("no scripted reply".to_string())),
            }
        })
    }
}

pub fn company(name: &str) -> CompanyRecord {
    CompanyRecord {
        id: Uuid::new_v4(),
        name: name.to_string(),
    }
}

pub fn meeting(company: &CompanyRecord, date: Option<NaiveDate>) -> Meeting {
    Meeting {
        id: Uuid::new_v4(),
        company_id: company.id,
        company_name: company.name.clone(),
        meeting_date: date,
        team_attendees: String::new(),
        customer_attendees: String::new(),
        created_at: Utc::now(),
    }
}

pub fn chunk(meeting: &Meeting, index: i32, speaker: &str, content: &str) -> Chunk {
    Chunk {
        transcript_id: meeting.id,
        chunk_index: index,
        speaker: Some(speaker.to_string()),
        speaker_role: SpeakerRole::Customer,
        content: content.to_string(),
    }
}

pub fn qa_pair(meeting: &Meeting, question: &str, answer: Option<&str>, turn: i32) -> QaPair {
    QaPair {
        transcript_id: meeting.id,
        question: question.to_string(),
        asker: Some("Dana".to_string()),
        status: if answer.is_some() {
            QaStatus::Answered
        } else {
            QaStatus::Open
        },
        answer: answer.map(ToString::to_string),
        answered_by: answer.map(|_| "Alice".to_string()),
        question_turn: turn,
        resolution_turn: None,
    }
}

pub fn action_item(
    meeting: &Meeting,
    action: &str,
    owner: &str,
    deadline: &str,
    evidence: &str,
    confidence: f32,
) -> ActionItem {
    ActionItem {
        transcript_id: meeting.id,
        action: action.to_string(),
        owner: owner.to_string(),
        item_type: "follow_up".to_string(),
        deadline: deadline.to_string(),
        evidence: evidence.to_string(),
        confidence,
        is_primary: true,
    }
}

/// Product knowledge service with a fixed snapshot.
pub struct StubKnowledge {
    sections: Vec<ProductKnowledgeSection>,
}

impl StubKnowledge {
    pub fn with_section(title: &str, body: &str) -> Self {
        Self {
            sections: vec![ProductKnowledgeSection {
                title: title.to_string(),
                body: body.to_string(),
            }],
        }
    }
}

#[async_trait]
impl ProductKnowledgeService for StubKnowledge {
    async fn fetch(&self) -> Result<Option<ProductKnowledge>, ServiceError> {
        Ok(Some(ProductKnowledge {
            sections: self.sections.clone(),
        }))
    }
}

pub struct Harness {
    pub store: Arc<InMemoryArtifactStore>,
    pub gateway: Arc<ScriptedGateway>,
    pub orchestrator: Arc<SingleMeetingOrchestrator>,
}

impl Harness {
    pub fn new() -> Self {
        Self::build(None)
    }

    pub fn with_knowledge(knowledge: StubKnowledge) -> Self {
        Self::build(Some(Arc::new(knowledge) as Arc<dyn ProductKnowledgeService>))
    }

    fn build(knowledge: Option<Arc<dyn ProductKnowledgeService>>) -> Self {
        let store = Arc::new(InMemoryArtifactStore::new());
        let gateway = Arc::new(ScriptedGateway::new());
        let orchestrator = Arc::new(SingleMeetingOrchestrator::new(
            store.clone(),
            gateway.clone(),
            knowledge,
            AppConfig::default(),
        ));
        Self {
            store,
            gateway,
            orchestrator,
        }
    }

    pub fn resolver(&self) -> Arc<MeetingResolver> {
        Arc::new(MeetingResolver::new(
            self.store.clone(),
            AppConfig::default(),
        ))
    }

    pub fn executor(&self) -> ContractExecutor {
        ContractExecutor::new(
            self.store.clone(),
            self.resolver(),
            self.orchestrator.clone(),
            self.gateway.clone(),
            None,
            None,
        )
    }

    pub fn handler(&self) -> AssistantHandler {
        AssistantHandler::new(
            self.store.clone(),
            DecisionLayer::new(self.gateway.clone()),
            self.resolver(),
            self.orchestrator.clone(),
            self.executor(),
        )
    }
}
