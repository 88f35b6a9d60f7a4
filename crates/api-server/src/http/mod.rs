use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use shared::assistant::AssistantHandler;

mod chat;
mod errors;
mod health;

#[derive(Clone)]
pub struct AppState {
    pub handler: Arc<AssistantHandler>,
}

pub fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(health::healthz))
        .route("/readyz", get(health::readyz))
        .route("/v1/chat/turn", post(chat::chat_turn))
        .with_state(app_state)
}
