use axum::Json;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use shared::models::ChatTurnRequest;

use super::AppState;
use super::errors::{assistant_error_response, bad_request_response};

pub(super) async fn chat_turn(
    State(state): State<AppState>,
    Json(request): Json<ChatTurnRequest>,
) -> Response {
    if request.thread_id.trim().is_empty() {
        return bad_request_response("invalid_thread", "thread_id must not be empty");
    }
    if request.message_text.trim().is_empty() {
        return bad_request_response("invalid_message", "message_text must not be empty");
    }

    match state.handler.handle_turn(&request).await {
        Ok(response) => Json(response).into_response(),
        Err(err) => assistant_error_response(err),
    }
}
