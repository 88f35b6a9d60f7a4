#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use axum::Router;
use chrono::Utc;
use uuid::Uuid;

use api_server::http::{AppState, build_router};
use shared::assistant::AssistantHandler;
use shared::config::AppConfig;
use shared::decision::DecisionLayer;
use shared::executor::ContractExecutor;
use shared::llm::{LlmCompletion, LlmGateway, LlmGatewayError, LlmGatewayFuture, LlmRequest};
use shared::models::{Chunk, CompanyRecord, Meeting, SpeakerRole};
use shared::orchestrator::SingleMeetingOrchestrator;
use shared::resolver::MeetingResolver;
use shared::store::InMemoryArtifactStore;

pub struct ScriptedGateway {
    replies: Mutex<VecDeque<String>>,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
        }
    }

    pub fn push_reply(&self, text: impl Into<String>) {
        self.replies
            .lock()
            .expect("scripted replies lock")
            .push_back(text.into());
    }
}

impl LlmGateway for ScriptedGateway {
    fn complete<'a>(&'a self, _request: LlmRequest) -> LlmGatewayFuture<'a> {
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

pub struct TestApp {
    pub router: Router,
    pub store: Arc<InMemoryArtifactStore>,
    pub gateway: Arc<ScriptedGateway>,
}

pub fn build_test_app() -> TestApp {
    let store = Arc::new(InMemoryArtifactStore::new());
    let gateway = Arc::new(ScriptedGateway::new());
    let config = AppConfig::default();

    let resolver = Arc::new(MeetingResolver::new(store.clone(), config.clone()));
    let orchestrator = Arc::new(SingleMeetingOrchestrator::new(
        store.clone(),
        gateway.clone(),
        None,
        config,
    ));
    let executor = ContractExecutor::new(
        store.clone(),
        resolver.clone(),
        orchestrator.clone(),
        gateway.clone(),
        None,
        None,
    );
    let handler = AssistantHandler::new(
        store.clone(),
        DecisionLayer::new(gateway.clone()),
        resolver,
        orchestrator,
        executor,
    );

    let router = build_router(AppState {
        handler: Arc::new(handler),
    });

    TestApp {
        router,
        store,
        gateway,
    }
}

pub fn company(name: &str) -> CompanyRecord {
    CompanyRecord {
        id: Uuid::new_v4(),
        name: name.to_string(),
    }
}

pub fn meeting(company: &CompanyRecord, team: &str, customers: &str) -> Meeting {
    Meeting {
        id: Uuid::new_v4(),
        company_id: company.id,
        company_name: company.name.clone(),
        meeting_date: None,
        team_attendees: team.to_string(),
        customer_attendees: customers.to_string(),
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
