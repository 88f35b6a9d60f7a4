mod support;

use serde_json::json;

use shared::assistant::{HELP_TEXT, REFUSAL_TEXT};
use shared::llm::INTENT_CLASSIFICATION_VERSION_V1;
use shared::models::{ChatTurnRequest, DataSource, Intent, PendingOffer};
use shared::store::ArtifactStore;

use support::{Harness, chunk, company, meeting};

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

fn turn(thread_id: &str, message: &str) -> ChatTurnRequest {
    ChatTurnRequest {
        thread_id: thread_id.to_string(),
        message_text: message.to_string(),
        thread_messages: Vec::new(),
        resolved_meeting_id: None,
        contract_override: None,
    }
}

#[tokio::test]
async fn pending_summary_offer_is_honored_and_cleared() {
    let harness = Harness::new();
    let walmart = company("Walmart");
    let m = meeting(&walmart, None);
    harness.store.insert_meeting(m.clone()).await;
    harness
        .store
        .insert_chunk(chunk(&m, 0, "Dana", "We went over the store rollout schedule."))
        .await;
    harness
        .store
        .insert_summary(m.id, "Purpose: rollout planning for store locations.".to_string())
        .await;

    let handler = harness.handler();

    harness
        .gateway
        .push_reply(classifier_reply("single_meeting", 0.9));
    let first = handler
        .handle_turn(&turn("thread-1", "Was Walmart discussed?"))
        .await
        .expect("first turn should succeed");

    assert_eq!(first.metadata.data_source, DataSource::BinaryAnswer);
    assert_eq!(first.metadata.pending_offer, PendingOffer::Summary);

    // The acceptance bypasses classification entirely; no reply is scripted.
    let second = handler
        .handle_turn(&turn("thread-1", "yes please"))
        .await
        .expect("acceptance turn should succeed");

    assert_eq!(second.metadata.data_source, DataSource::Summary);
    assert!(second.answer.contains("rollout planning"));
    assert_eq!(second.metadata.pending_offer, PendingOffer::None);

    let last = harness
        .store
        .last_interaction("thread-1")
        .await
        .expect("interaction log readable")
        .expect("interaction log entry present");
    assert_eq!(last.pending_offer, PendingOffer::None);
}

#[tokio::test]
async fn declined_offer_clears_without_reoffering() {
    let harness = Harness::new();
    let walmart = company("Walmart");
    let m = meeting(&walmart, None);
    harness.store.insert_meeting(m.clone()).await;

    let handler = harness.handler();

    harness
        .gateway
        .push_reply(classifier_reply("single_meeting", 0.9));
    handler
        .handle_turn(&turn("thread-2", "Was Walmart discussed?"))
        .await
        .expect("first turn should succeed");

    let second = handler
        .handle_turn(&turn("thread-2", "no thanks"))
        .await
        .expect("decline turn should succeed");

    assert_eq!(second.metadata.pending_offer, PendingOffer::None);
    assert!(second.answer.contains("No problem"));
}

#[tokio::test]
async fn classifier_failure_falls_back_to_help() {
    let harness = Harness::new();
    let handler = harness.handler();

    // No scripted reply: the classifier call fails outright.
    let response = handler
        .handle_turn(&turn("thread-3", "hello?"))
        .await
        .expect("turn should still succeed");

    assert_eq!(response.metadata.intent, Intent::GeneralHelp);
    assert_eq!(response.answer, HELP_TEXT);
    assert_eq!(response.metadata.data_source, DataSource::Help);
}

#[tokio::test]
async fn refuse_intent_emits_fixed_refusal() {
    let harness = Harness::new();
    let handler = harness.handler();

    harness.gateway.push_reply(classifier_reply("refuse", 0.95));
    let response = handler
        .handle_turn(&turn("thread-4", "write my performance review"))
        .await
        .expect("turn should succeed");

    assert_eq!(response.metadata.intent, Intent::Refuse);
    assert_eq!(response.answer, REFUSAL_TEXT);
}

#[tokio::test]
async fn meeting_scoped_thread_skips_classification() {
    let harness = Harness::new();
    let acme = company("Acme");
    let mut m = meeting(&acme, None);
    m.team_attendees = "Alice,Bob".to_string();
    m.customer_attendees = "Dana".to_string();
    harness.store.insert_meeting(m.clone()).await;

    let handler = harness.handler();

    let mut request = turn("thread-5", "Who attended the call?");
    request.resolved_meeting_id = Some(m.id);
    let response = handler
        .handle_turn(&request)
        .await
        .expect("turn should succeed");

    assert_eq!(response.metadata.data_source, DataSource::Attendees);
    assert!(response.answer.contains("Alice, Bob"));
    // No classifier call was made.
    assert!(harness.gateway.recorded_requests().is_empty());
}

#[tokio::test]
async fn unresolvable_company_asks_for_clarification() {
    let harness = Harness::new();
    let handler = harness.handler();

    harness
        .gateway
        .push_reply(classifier_reply("single_meeting", 0.9));
    let response = handler
        .handle_turn(&turn("thread-6", "What did Initech say about pricing?"))
        .await
        .expect("turn should succeed");

    assert_eq!(response.metadata.data_source, DataSource::Clarification);
    assert!(response.answer.contains("Initech"));
}
