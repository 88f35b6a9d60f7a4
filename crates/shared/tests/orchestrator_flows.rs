mod support;

use serde_json::json;

use shared::contracts::AnswerContract;
use shared::models::{DataSource, PendingOffer};

use support::{Harness, StubKnowledge, action_item, chunk, company, meeting, qa_pair};

#[tokio::test]
async fn attendee_fast_path_lists_both_sides() {
    let harness = Harness::new();
    let acme = company("Acme");
    let mut m = meeting(&acme, None);
    m.team_attendees = "Alice,Bob".to_string();
    m.customer_attendees = "Dana".to_string();
    harness.store.insert_meeting(m.clone()).await;

    let answer = harness
        .orchestrator
        .answer(&m, "Who attended the call?", false, None, false)
        .await;

    assert_eq!(answer.data_source, DataSource::Attendees);
    assert!(answer.answer.contains("Alice, Bob"));
    assert!(answer.answer.contains("Dana"));
}

#[tokio::test]
async fn next_steps_fast_path_lists_owner_deadline_and_evidence() {
    let harness = Harness::new();
    let acme = company("Acme");
    let m = meeting(&acme, None);
    harness.store.insert_meeting(m.clone()).await;
    harness
        .store
        .insert_action_item(action_item(
            &m,
            "Send pricing sheet",
            "Alice",
            "Friday",
            "We'll send the pricing sheet by Friday.",
            0.9,
        ))
        .await;

    let answer = harness
        .orchestrator
        .answer(&m, "What are the next steps?", false, None, false)
        .await;

    assert_eq!(answer.data_source, DataSource::ActionItems);
    assert!(answer.answer.contains("Send pricing sheet — Alice (Friday)"));
    assert!(answer.answer.contains("_\"We'll send the pricing sheet by Friday.\"_"));
}

#[tokio::test]
async fn binary_question_with_absent_subject_answers_no_and_offers_summary() {
    let harness = Harness::new();
    let acme = company("Acme");
    let m = meeting(&acme, None);
    harness.store.insert_meeting(m.clone()).await;
    harness
        .store
        .insert_chunk(chunk(&m, 0, "Dana", "Let's talk about the deployment timeline."))
        .await;

    let answer = harness
        .orchestrator
        .answer(&m, "Was Walmart discussed?", false, None, false)
        .await;

    assert_eq!(answer.data_source, DataSource::BinaryAnswer);
    assert!(answer.is_binary_question);
    assert_eq!(answer.pending_offer, PendingOffer::Summary);
    assert!(
        answer.answer.starts_with("No") || answer.answer.starts_with("I don't see"),
        "binary-first rule violated: {}",
        answer.answer
    );
}

#[tokio::test]
async fn binary_question_with_present_subject_answers_yes_with_quote() {
    let harness = Harness::new();
    let acme = company("Acme");
    let m = meeting(&acme, None);
    harness.store.insert_meeting(m.clone()).await;
    harness
        .store
        .insert_chunk(chunk(&m, 0, "Dana", "Budget approval is still pending on our side."))
        .await;

    let answer = harness
        .orchestrator
        .answer(&m, "Did they mention budget approval?", false, None, false)
        .await;

    assert_eq!(answer.data_source, DataSource::BinaryAnswer);
    assert!(answer.answer.starts_with("Yes"));
    assert_eq!(
        answer.evidence.as_deref(),
        Some("Budget approval is still pending on our side.")
    );
}

#[tokio::test]
async fn entity_only_transcript_matches_are_suppressed() {
    let harness = Harness::new();
    let tire = company("Canadian Tire");
    let m = meeting(&tire, None);
    harness.store.insert_meeting(m.clone()).await;
    for index in 0..5 {
        harness
            .store
            .insert_chunk(chunk(
                &m,
                index,
                "Sam",
                "Canadian Tire wants a rollout plan for the new stores.",
            ))
            .await;
    }

    let answer = harness
        .orchestrator
        .answer(&m, "What did Canadian Tire say about pricing?", false, None, false)
        .await;

    assert_eq!(answer.data_source, DataSource::NotFound);
    assert_eq!(answer.pending_offer, PendingOffer::Summary);
    assert!(!answer.answer.contains("rollout plan"));
}

#[tokio::test]
async fn keyword_matched_transcript_snippet_is_quoted() {
    let harness = Harness::new();
    let acme = company("Acme");
    let m = meeting(&acme, None);
    harness.store.insert_meeting(m.clone()).await;
    harness
        .store
        .insert_chunk(chunk(&m, 0, "Dana", "Our pricing concern is the per-device fee."))
        .await;

    let answer = harness
        .orchestrator
        .answer(&m, "what pricing objections came up", false, None, false)
        .await;

    assert_eq!(answer.data_source, DataSource::Transcript);
    assert!(answer.answer.contains("per-device fee"));
    assert_eq!(
        answer.evidence.as_deref(),
        Some("Our pricing concern is the per-device fee.")
    );
}

#[tokio::test]
async fn action_items_win_ties_over_qa_pairs() {
    let harness = Harness::new();
    let acme = company("Acme");
    let m = meeting(&acme, None);
    harness.store.insert_meeting(m.clone()).await;
    harness
        .store
        .insert_qa_pair(qa_pair(&m, "Can you share the onboarding checklist?", None, 1))
        .await;
    harness
        .store
        .insert_action_item(action_item(
            &m,
            "Share the onboarding checklist",
            "Bob",
            "Tuesday",
            "Bob will share the onboarding checklist.",
            0.8,
        ))
        .await;

    let answer = harness
        .orchestrator
        .answer(&m, "who owns the onboarding checklist", false, None, false)
        .await;

    assert_eq!(answer.data_source, DataSource::ActionItems);
}

#[tokio::test]
async fn aggregative_questions_list_caps_with_overflow_tail() {
    let harness = Harness::new();
    let acme = company("Acme");
    let m = meeting(&acme, None);
    harness.store.insert_meeting(m.clone()).await;
    for turn in 0..12 {
        harness
            .store
            .insert_qa_pair(qa_pair(&m, &format!("Question number {turn}?"), None, turn))
            .await;
    }

    let answer = harness
        .orchestrator
        .answer(
            &m,
            "what questions did they ask?",
            false,
            Some(AnswerContract::AggregativeList),
            false,
        )
        .await;

    assert_eq!(answer.data_source, DataSource::QaPairs);
    assert!(answer.answer.contains("…and 2 more"));
}

#[tokio::test]
async fn aggregative_concerns_filter_on_concern_vocabulary() {
    let harness = Harness::new();
    let acme = company("Acme");
    let m = meeting(&acme, None);
    harness.store.insert_meeting(m.clone()).await;
    harness
        .store
        .insert_qa_pair(qa_pair(&m, "Our main concern is data residency.", None, 1))
        .await;
    harness
        .store
        .insert_qa_pair(qa_pair(&m, "Could we get a demo next week?", None, 2))
        .await;

    let answer = harness
        .orchestrator
        .answer(
            &m,
            "any concerns or blockers on their side?",
            false,
            Some(AnswerContract::AggregativeList),
            false,
        )
        .await;

    assert_eq!(answer.data_source, DataSource::QaPairs);
    assert!(answer.answer.contains("data residency"));
    assert!(!answer.answer.contains("demo next week"));
}

#[tokio::test]
async fn offer_acceptance_runs_summary_and_clears_offer() {
    let harness = Harness::new();
    let acme = company("Acme");
    let m = meeting(&acme, None);
    harness.store.insert_meeting(m.clone()).await;
    harness
        .store
        .insert_summary(m.id, "Purpose: quarterly pricing review.".to_string())
        .await;

    let answer = harness
        .orchestrator
        .answer(&m, "yes please", true, None, false)
        .await;

    assert_eq!(answer.data_source, DataSource::Summary);
    assert!(answer.answer.contains("quarterly pricing review"));
    assert_eq!(answer.pending_offer, PendingOffer::None);
}

#[tokio::test]
async fn offer_decline_acknowledges_without_reoffering() {
    let harness = Harness::new();
    let acme = company("Acme");
    let m = meeting(&acme, None);
    harness.store.insert_meeting(m.clone()).await;

    let answer = harness
        .orchestrator
        .answer(&m, "no thanks", true, None, false)
        .await;

    assert_eq!(answer.pending_offer, PendingOffer::None);
    assert!(answer.answer.contains("No problem"));
}

#[tokio::test]
async fn preparation_phrasing_returns_clarification() {
    let harness = Harness::new();
    let acme = company("Acme");
    let m = meeting(&acme, None);
    harness.store.insert_meeting(m.clone()).await;

    let answer = harness
        .orchestrator
        .answer(&m, "help me prepare for the next call", false, None, false)
        .await;

    assert_eq!(answer.data_source, DataSource::Clarification);
    assert!(answer.is_clarification_request);
}

#[tokio::test]
async fn explicit_verification_request_runs_kb_assessment() {
    let harness = Harness::with_knowledge(StubKnowledge::with_section(
        "Pricing",
        "Billing is per device per month; no per-seat pricing exists.",
    ));
    let acme = company("Acme");
    let m = meeting(&acme, None);
    harness.store.insert_meeting(m.clone()).await;
    harness
        .store
        .insert_qa_pair(qa_pair(
            &m,
            "Is pricing per seat?",
            Some("Yes, it's per seat."),
            1,
        ))
        .await;
    harness
        .gateway
        .push_reply("\u{274c} \"Is pricing per seat?\": the recorded answer contradicts the \
documentation; billing is per device per month.");

    let answer = harness
        .orchestrator
        .answer(&m, "Can you check the answers we gave them?", false, None, false)
        .await;

    assert_eq!(answer.data_source, DataSource::ProductKnowledge);
    assert!(answer.answer.contains("per device per month"));

    // The assessment prompt is restricted to the fetched documentation.
    let requests = harness.gateway.recorded_requests();
    assert!(requests.iter().any(|request| {
        request.user_prompt.contains("Billing is per device per month")
            && request.user_prompt.contains("Is pricing per seat?")
    }));
}

#[tokio::test]
async fn drafting_contract_labels_product_background_as_framing() {
    let harness = Harness::with_knowledge(StubKnowledge::with_section(
        "Platform",
        "The platform ingests camera feeds and flags anomalies.",
    ));
    let acme = company("Acme");
    let m = meeting(&acme, None);
    harness.store.insert_meeting(m.clone()).await;
    harness
        .store
        .insert_chunk(chunk(&m, 0, "Dana", "We'd like a recap of the pilot scope."))
        .await;
    harness
        .gateway
        .push_reply("Hi Dana, thanks for the conversation about the pilot scope.");

    let answer = harness
        .orchestrator
        .answer(
            &m,
            "draft a follow-up email about the pilot",
            false,
            Some(AnswerContract::DraftFollowUp),
            false,
        )
        .await;

    assert_eq!(answer.data_source, DataSource::Drafting);

    let requests = harness.gateway.recorded_requests();
    assert!(requests.iter().any(|request| {
        request.user_prompt.contains("framing only, never cite")
            && request.user_prompt.contains("camera feeds")
    }));
}

#[tokio::test]
async fn semantic_fallback_failure_keeps_deterministic_result() {
    let harness = Harness::new();
    let acme = company("Acme");
    let m = meeting(&acme, None);
    harness.store.insert_meeting(m.clone()).await;
    harness
        .store
        .insert_chunk(chunk(&m, 0, "Dana", "General discussion with no artifacts."))
        .await;

    // No scripted gateway reply: the semantic call fails.
    let answer = harness
        .orchestrator
        .answer(&m, "what happened with the renewal terms", false, None, true)
        .await;

    assert_eq!(answer.data_source, DataSource::NotFound);
    assert!(answer.semantic_error.is_some());
    assert_eq!(answer.pending_offer, PendingOffer::Summary);
}

#[tokio::test]
async fn semantic_fallback_success_is_marked_and_bounded() {
    let harness = Harness::new();
    let acme = company("Acme");
    let m = meeting(&acme, None);
    harness.store.insert_meeting(m.clone()).await;
    harness
        .store
        .insert_chunk(chunk(&m, 0, "Dana", "We pushed that conversation out to next quarter."))
        .await;
    harness.gateway.push_reply(
        json!({"answer": "They moved the renewal conversation to Q3.", "confidence": 0.8})
            .to_string(),
    );

    let answer = harness
        .orchestrator
        .answer(&m, "what happened with the renewal terms", false, None, true)
        .await;

    assert_eq!(answer.data_source, DataSource::Semantic);
    assert!(answer.semantic_answer_used);
    assert_eq!(answer.semantic_confidence, Some(0.8));
}
