use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use shared::assistant::AssistantError;
use shared::models::{ErrorBody, ErrorResponse};
use tracing::error;

pub(super) fn bad_request_response(code: &str, message: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: ErrorBody {
                code: code.to_string(),
                message: message.to_string(),
            },
        }),
    )
        .into_response()
}

pub(super) fn assistant_error_response(err: AssistantError) -> Response {
    error!("turn failed: {err}");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: ErrorBody {
                code: "internal_error".to_string(),
                message: "Something went wrong handling this message".to_string(),
            },
        }),
    )
        .into_response()
}
