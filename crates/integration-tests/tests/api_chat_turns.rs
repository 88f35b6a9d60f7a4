mod support;

use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use serde_json::{Value, json};
use tower::util::ServiceExt;

use shared::llm::INTENT_CLASSIFICATION_VERSION_V1;

use support::{TestApp, build_test_app, chunk, company, meeting};

fn chat_request(payload: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/v1/chat/turn")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(payload.to_string()))
        .expect("request should build")
}

async fn response_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body should read");
    serde_json::from_slice(&bytes).expect("body should be json")
}

fn classifier_reply(intent: &str, confidence: f64) -> String {
    json!({
        "version": INTENT_CLASSIFICATION_VERSION_V1,
        "output": {
            "intent": intent,
            "confidence": confidence,
            "requires_semantic": false,
            "meeting_relevance": 0.9,
            "research_relevance": 0.1
        }
    })
    .to_string()
}

#[tokio::test]
async fn health_probes_respond() {
    let app = build_test_app();

    let response = app
        .router
        .oneshot(
            Request::builder()
                .uri("/healthz")
                .body(Body::empty())
                .expect("request should build"),
        )
        .await
        .expect("router should respond");

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn meeting_scoped_attendee_turn_round_trips() {
    let app = build_test_app();
    let acme = company("Acme");
    let m = meeting(&acme, "Alice,Bob", "Dana");
    app.store.insert_meeting(m.clone()).await;

    let response = app
        .router
        .oneshot(chat_request(json!({
            "thread_id": "thread-1",
            "message_text": "Who attended the call?",
            "resolved_meeting_id": m.id,
        })))
        .await
        .expect("router should respond");

    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["metadata"]["data_source"], "attendees");
    let answer = body["answer"].as_str().expect("answer should be a string");
    assert!(answer.contains("Alice, Bob"));
    assert!(answer.contains("Dana"));
}

#[tokio::test]
async fn blank_message_is_rejected() {
    let app = build_test_app();

    let response = app
        .router
        .oneshot(chat_request(json!({
            "thread_id": "thread-1",
            "message_text": "   ",
        })))
        .await
        .expect("router should respond");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response_json(response).await;
    assert_eq!(body["error"]["code"], "invalid_message");
}

#[tokio::test]
async fn summary_offer_survives_across_http_turns() {
    let TestApp {
        router,
        store,
        gateway,
    } = build_test_app();
    let walmart = company("Walmart");
    let m = meeting(&walmart, "Alice", "Sam");
    store.insert_meeting(m.clone()).await;
    store
        .insert_chunk(chunk(&m, 0, "Sam", "We walked through the store rollout plan."))
        .await;
    store
        .insert_summary(m.id, "Purpose: rollout planning.".to_string())
        .await;

    gateway.push_reply(classifier_reply("single_meeting", 0.9));
    let first = router
        .clone()
        .oneshot(chat_request(json!({
            "thread_id": "thread-offer",
            "message_text": "Was Walmart discussed?",
        })))
        .await
        .expect("router should respond");
    assert_eq!(first.status(), StatusCode::OK);
    let first_body = response_json(first).await;
    assert_eq!(first_body["metadata"]["pending_offer"], "summary");

    let second = router
        .oneshot(chat_request(json!({
            "thread_id": "thread-offer",
            "message_text": "yes please",
        })))
        .await
        .expect("router should respond");
    assert_eq!(second.status(), StatusCode::OK);
    let second_body = response_json(second).await;
    assert_eq!(second_body["metadata"]["data_source"], "summary");
    assert_eq!(second_body["metadata"]["pending_offer"], "none");
    assert!(
        second_body["answer"]
            .as_str()
            .expect("answer should be a string")
            .contains("rollout planning")
    );
}

#[tokio::test]
async fn classifier_outage_degrades_to_help_text() {
    let app = build_test_app();

    let response = app
        .router
        .oneshot(chat_request(json!({
            "thread_id": "thread-help",
            "message_text": "what can you do?",
        })))
        .await
        .expect("router should respond");

    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["metadata"]["intent"], "general_help");
    assert_eq!(body["metadata"]["data_source"], "help");
}
