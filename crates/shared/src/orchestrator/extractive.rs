use tokio::join;
use tracing::warn;

use crate::contracts::AnswerContract;
use crate::detectors::{
    is_action_item_question, is_attendee_question, wants_answer_verification, wants_questions,
};
use crate::llm::{LlmRequest, ModelRole, prompts};
use crate::markup::{bold, bullet, italic_quote, truncate_with_ellipsis};
use crate::models::{ActionItem, DataSource, Meeting, QaPair, QaStatus};
use crate::retrieval::{
    MatchType, QueryTerms, attendee_lists, extract_query_terms, min_relevance_score,
    score_candidate, transcript_snippets,
};

use super::{AnswerKind, MeetingAnswer, SingleMeetingOrchestrator, uncertainty_response};

const SNIPPET_LIMIT: usize = 3;

pub(super) async fn run(
    orchestrator: &SingleMeetingOrchestrator,
    meeting: &Meeting,
    question: &str,
    contract: Option<AnswerContract>,
) -> MeetingAnswer {
    if contract == Some(AnswerContract::Attendees) || is_attendee_question(question) {
        return attendees(meeting);
    }

    if contract == Some(AnswerContract::CustomerQuestions)
        || wants_questions(question)
        || wants_answer_verification(question)
    {
        return customer_questions(orchestrator, meeting, question).await;
    }

    if contract == Some(AnswerContract::NextSteps) || is_action_item_question(question) {
        return next_steps(orchestrator, meeting).await;
    }

    general(orchestrator, meeting, question).await
}

fn attendees(meeting: &Meeting) -> MeetingAnswer {
    let lists = attendee_lists(meeting);
    if lists.internal.is_empty() && lists.customer.is_empty() {
        return uncertainty_response(AnswerKind::Extractive);
    }

    let mut answer = bold("Attendees");
    answer.push('\n');
    if !lists.internal.is_empty() {
        answer.push_str(&format!("Our team: {}\n", lists.internal.join(", ")));
    }
    if !lists.customer.is_empty() {
        answer.push_str(&format!("Customer: {}\n", lists.customer.join(", ")));
    }

    MeetingAnswer::new(AnswerKind::Extractive, DataSource::Attendees, answer)
}

async fn next_steps(
    orchestrator: &SingleMeetingOrchestrator,
    meeting: &Meeting,
) -> MeetingAnswer {
    let items = crate::retrieval::relevant_action_items(orchestrator.store(), meeting.id, None).await;
    if items.is_empty() {
        return uncertainty_response(AnswerKind::Extractive);
    }

    let mut answer = bold("Next steps");
    answer.push('\n');
    for item in &items {
        answer.push_str(&format!("{}\n", bullet(&action_item_line(item))));
        answer.push_str(&format!("   {}\n", italic_quote(&item.evidence)));
    }

    MeetingAnswer::new(AnswerKind::Extractive, DataSource::ActionItems, answer)
}

fn action_item_line(item: &ActionItem) -> String {
    format!("{} — {} ({})", item.action, item.owner, item.deadline)
}

async fn customer_questions(
    orchestrator: &SingleMeetingOrchestrator,
    meeting: &Meeting,
    question: &str,
) -> MeetingAnswer {
    let pairs = crate::retrieval::relevant_qa_pairs(orchestrator.store(), meeting.id, None).await;
    if pairs.is_empty() {
        return uncertainty_response(AnswerKind::Extractive);
    }

    if wants_answer_verification(question) {
        if let Some(assessed) = kb_assessment(orchestrator, &pairs).await {
            return assessed;
        }
    }

    let mut answer = bold("Customer questions");
    answer.push('\n');
    for pair in &pairs {
        answer.push_str(&format!("{}\n", bullet(&qa_pair_line(pair))));
        if let Some(resolved) = pair.answer.as_deref() {
            let answered_by = pair.answered_by.as_deref().unwrap_or("our team");
            answer.push_str(&format!("   {answered_by}: {}\n", italic_quote(resolved)));
        }
    }

    MeetingAnswer::new(AnswerKind::Extractive, DataSource::QaPairs, answer)
}

fn qa_pair_line(pair: &QaPair) -> String {
    let asker = pair
        .asker
        .as_deref()
        .map(|name| format!(" ({name})"))
        .unwrap_or_default();
    format!(
        "{}{asker} [{}]",
        italic_quote(&pair.question),
        pair.status.as_str()
    )
}

/// Checks recorded answers against the product knowledge service. Only runs
/// when the user explicitly asked for verification; the prompt restricts the
/// model to the fetched documentation.
async fn kb_assessment(
    orchestrator: &SingleMeetingOrchestrator,
    pairs: &[QaPair],
) -> Option<MeetingAnswer> {
    let service = orchestrator.knowledge()?;
    let knowledge = match service.fetch().await {
        Ok(Some(knowledge)) => knowledge,
        Ok(None) => return None,
        Err(err) => {
            warn!("product knowledge fetch failed: {err}");
            return None;
        }
    };

    let qa_section = pairs
        .iter()
        .map(|pair| {
            let status = pair.status.as_str();
            let answer = match (pair.status, pair.answer.as_deref()) {
                (QaStatus::Open, _) | (_, None) => "(no recorded answer)".to_string(),
                (_, Some(answer)) => answer.to_string(),
            };
            format!("Q: {}\nStatus: {status}\nRecorded answer: {answer}", pair.question)
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    let request = LlmRequest::new(
        ModelRole::KbAssessment,
        prompts::KB_ASSESSMENT_SYSTEM_PROMPT,
        prompts::kb_assessment_user_prompt(&knowledge.render(), &qa_section),
    );

    match orchestrator.gateway().complete(request).await {
        Ok(completion) => Some(MeetingAnswer::new(
            AnswerKind::Extractive,
            DataSource::ProductKnowledge,
            completion.text,
        )),
        Err(err) => {
            warn!("kb assessment failed: {err}");
            None
        }
    }
}

/// General extractive path: score Q&A pairs and action items against the
/// query, action items winning ties. Transcript snippets are a last resort
/// and an entity-only match there is treated as not found.
async fn general(
    orchestrator: &SingleMeetingOrchestrator,
    meeting: &Meeting,
    question: &str,
) -> MeetingAnswer {
    let terms = extract_query_terms(question);
    if terms.is_empty() {
        return uncertainty_response(AnswerKind::Extractive);
    }

    let store = orchestrator.store();
    let (qa_pairs, action_items) = join!(
        store.get_qa_pairs_by_transcript(meeting.id),
        store.get_meeting_action_items_by_transcript(meeting.id),
    );
    let qa_pairs = qa_pairs.unwrap_or_else(|err| {
        warn!(meeting_id = %meeting.id, "qa pair fetch failed: {err}");
        Vec::new()
    });
    let action_items: Vec<ActionItem> = action_items
        .unwrap_or_else(|err| {
            warn!(meeting_id = %meeting.id, "action item fetch failed: {err}");
            Vec::new()
        })
        .into_iter()
        .filter(|item| item.confidence > 0.0)
        .collect();

    let minimum = min_relevance_score(&terms);

    let best_item = best_by_score(&action_items, &terms, |item| {
        format!("{} {} {}", item.action, item.evidence, item.owner)
    });
    let best_pair = best_by_score(&qa_pairs, &terms, |pair| match &pair.answer {
        Some(answer) => format!("{} {}", pair.question, answer),
        None => pair.question.clone(),
    });

    // Action items carry cleaner nouns than free-form questions, so they win
    // ties for term lookups.
    match (best_item, best_pair) {
        (Some((item, item_score)), Some((_, pair_score)))
            if item_score >= pair_score && item_score >= minimum =>
        {
            answer_from_action_item(item)
        }
        (Some((item, item_score)), None) if item_score >= minimum => answer_from_action_item(item),
        (_, Some((pair, pair_score))) if pair_score >= minimum => answer_from_qa_pair(pair),
        _ => transcript_fallback(orchestrator, meeting, &terms).await,
    }
}

fn best_by_score<'a, T>(
    candidates: &'a [T],
    terms: &QueryTerms,
    text_of: impl Fn(&T) -> String,
) -> Option<(&'a T, i32)> {
    candidates
        .iter()
        .filter_map(|candidate| {
            let score = score_candidate(&text_of(candidate), terms);
            if score < 0 { None } else { Some((candidate, score)) }
        })
        .max_by_key(|(_, score)| *score)
}

fn answer_from_action_item(item: &ActionItem) -> MeetingAnswer {
    let mut answer = "From this meeting's action items:\n".to_string();
    answer.push_str(&format!("{}\n", bullet(&action_item_line(item))));
    answer.push_str(&format!("   {}\n", italic_quote(&item.evidence)));

    MeetingAnswer::new(AnswerKind::Extractive, DataSource::ActionItems, answer)
        .with_evidence(item.evidence.clone())
}

fn answer_from_qa_pair(pair: &QaPair) -> MeetingAnswer {
    let mut answer = "This came up in the meeting:\n".to_string();
    answer.push_str(&format!("{}\n", bullet(&qa_pair_line(pair))));
    if let Some(resolved) = pair.answer.as_deref() {
        let answered_by = pair.answered_by.as_deref().unwrap_or("our team");
        answer.push_str(&format!("   {answered_by}: {}\n", italic_quote(resolved)));
    }

    MeetingAnswer::new(AnswerKind::Extractive, DataSource::QaPairs, answer)
        .with_evidence(pair.question.clone())
}

async fn transcript_fallback(
    orchestrator: &SingleMeetingOrchestrator,
    meeting: &Meeting,
    terms: &QueryTerms,
) -> MeetingAnswer {
    let snippets =
        transcript_snippets(orchestrator.store(), meeting.id, terms, SNIPPET_LIMIT).await;

    let Some(first) = snippets.first() else {
        return uncertainty_response(AnswerKind::Extractive);
    };
    // An entity-only hit means the company or person matched but the topic
    // did not; quoting it would look confident and be wrong.
    if first.match_type == MatchType::ProperNoun {
        return uncertainty_response(AnswerKind::Extractive);
    }

    let excerpt = truncate_with_ellipsis(
        &first.chunk.content,
        orchestrator.config().snippet_char_budget,
    );
    let speaker = first.chunk.speaker.as_deref().unwrap_or("Unknown");
    let answer = format!("From the transcript:\n{} — {speaker}", italic_quote(&excerpt));

    MeetingAnswer::new(AnswerKind::Extractive, DataSource::Transcript, answer)
        .with_evidence(first.chunk.content.clone())
}
