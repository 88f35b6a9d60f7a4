use std::net::SocketAddr;
use std::sync::Arc;

use api_server::http::{AppState, build_router};
use shared::assistant::AssistantHandler;
use shared::config::{AppConfig, ServerConfig};
use shared::decision::DecisionLayer;
use shared::executor::ContractExecutor;
use shared::llm::{LlmGateway, OpenRouterGateway, OpenRouterGatewayConfig};
use shared::orchestrator::SingleMeetingOrchestrator;
use shared::resolver::MeetingResolver;
use shared::services::{
    HttpProductKnowledgeService, HttpResearchService, ProductKnowledgeService, ResearchService,
};
use shared::store::{ArtifactStore, InMemoryArtifactStore, PostgresStore};
use tracing::{info, warn};

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "api_server=debug,shared=debug,axum=info".to_string()),
        )
        .init();

    let server_config = ServerConfig::from_env();
    let app_config = AppConfig::from_env().expect("app config should load");

    let store: Arc<dyn ArtifactStore> = match &server_config.database_url {
        Some(database_url) => {
            let store = PostgresStore::connect(database_url, app_config.store_query_timeout_ms)
                .await
                .expect("postgres store should connect");
            Arc::new(store)
        }
        None => {
            warn!("DATABASE_URL not set; using the in-memory artifact store");
            Arc::new(InMemoryArtifactStore::new())
        }
    };

    let gateway_config =
        OpenRouterGatewayConfig::from_env(&app_config).expect("llm gateway config should load");
    let gateway: Arc<dyn LlmGateway> =
        Arc::new(OpenRouterGateway::new(gateway_config).expect("llm gateway should build"));

    let knowledge: Option<Arc<dyn ProductKnowledgeService>> = app_config
        .product_knowledge_url
        .clone()
        .map(|url| {
            HttpProductKnowledgeService::new(url, app_config.research_timeout_ms)
                .expect("product knowledge client should build")
        })
        .map(|service| Arc::new(service) as Arc<dyn ProductKnowledgeService>);
    let research: Option<Arc<dyn ResearchService>> = app_config
        .research_service_url
        .clone()
        .map(|url| {
            HttpResearchService::new(url, app_config.research_timeout_ms)
                .expect("research client should build")
        })
        .map(|service| Arc::new(service) as Arc<dyn ResearchService>);

    let resolver = Arc::new(MeetingResolver::new(store.clone(), app_config.clone()));
    let orchestrator = Arc::new(SingleMeetingOrchestrator::new(
        store.clone(),
        gateway.clone(),
        knowledge.clone(),
        app_config.clone(),
    ));
    let executor = ContractExecutor::new(
        store.clone(),
        resolver.clone(),
        orchestrator.clone(),
        gateway.clone(),
        knowledge,
        research,
    );
    let handler = AssistantHandler::new(
        store,
        DecisionLayer::new(gateway),
        resolver,
        orchestrator,
        executor,
    );

    let app = build_router(AppState {
        handler: Arc::new(handler),
    });

    let addr: SocketAddr = server_config
        .bind_addr
        .parse()
        .unwrap_or_else(|_| "127.0.0.1:8080".parse().expect("valid default bind addr"));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("bind should succeed");

    info!(
        "api server listening on {}",
        listener.local_addr().unwrap_or(addr)
    );
    axum::serve(listener, app).await.expect("server should run");
}
