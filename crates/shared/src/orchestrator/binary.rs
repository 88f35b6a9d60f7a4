use tokio::join;

use crate::detectors::{extract_binary_subject, is_meeting_existence_question};
use crate::markup::{italic_quote, truncate_with_ellipsis};
use crate::models::{DataSource, Meeting, PendingOffer};

use super::{AnswerKind, MeetingAnswer, SingleMeetingOrchestrator};

const BINARY_EVIDENCE_CHARS: usize = 200;
const BINARY_CHUNK_SCAN_LIMIT: usize = 500;

/// Binary yes/no questions get a literal Yes/No first sentence, backed by one
/// short quoted excerpt when the subject was found. Returns `None` when no
/// subject could be extracted, letting the turn fall through to the handlers.
pub(super) async fn handle(
    orchestrator: &SingleMeetingOrchestrator,
    meeting: &Meeting,
    question: &str,
) -> Option<MeetingAnswer> {
    if is_meeting_existence_question(question) {
        let date_clause = meeting
            .meeting_date
            .map(|date| format!(" on {date}"))
            .unwrap_or_default();
        let mut answer = MeetingAnswer::new(
            AnswerKind::Extractive,
            DataSource::BinaryAnswer,
            format!(
                "Yes — there's a recorded meeting with {}{date_clause}. Would you like a brief \
summary?",
                meeting.company_name
            ),
        );
        answer.pending_offer = PendingOffer::Summary;
        return Some(answer);
    }

    let subject = extract_binary_subject(question)?;
    let needle = subject.to_lowercase();

    let store = orchestrator.store();
    let (qa_pairs, action_items, chunks) = join!(
        store.get_qa_pairs_by_transcript(meeting.id),
        store.get_meeting_action_items_by_transcript(meeting.id),
        store.get_chunks_for_transcript(meeting.id, BINARY_CHUNK_SCAN_LIMIT),
    );

    let qa_hit = qa_pairs.unwrap_or_default().into_iter().find(|pair| {
        pair.question.to_lowercase().contains(&needle)
            || pair
                .answer
                .as_deref()
                .is_some_and(|answer| answer.to_lowercase().contains(&needle))
    });
    if let Some(pair) = qa_hit {
        return Some(affirmative(&subject, pair.question));
    }

    let item_hit = action_items
        .unwrap_or_default()
        .into_iter()
        .filter(|item| item.confidence > 0.0)
        .find(|item| {
            item.action.to_lowercase().contains(&needle)
                || item.evidence.to_lowercase().contains(&needle)
                || item.owner.to_lowercase().contains(&needle)
        });
    if let Some(item) = item_hit {
        return Some(affirmative(&subject, item.evidence));
    }

    let chunk_hit = chunks
        .unwrap_or_default()
        .into_iter()
        .find(|chunk| chunk.content.to_lowercase().contains(&needle));
    if let Some(chunk) = chunk_hit {
        return Some(affirmative(&subject, chunk.content));
    }

    let mut answer = MeetingAnswer::new(
        AnswerKind::Extractive,
        DataSource::BinaryAnswer,
        format!(
            "No, I don't see any mention of {subject} in this meeting. Would you like a brief \
summary?"
        ),
    );
    answer.pending_offer = PendingOffer::Summary;
    Some(answer)
}

fn affirmative(subject: &str, evidence: String) -> MeetingAnswer {
    let excerpt = truncate_with_ellipsis(&evidence, BINARY_EVIDENCE_CHARS);
    MeetingAnswer::new(
        AnswerKind::Extractive,
        DataSource::BinaryAnswer,
        format!("Yes — {subject} came up: {}", italic_quote(&excerpt)),
    )
    .with_evidence(evidence)
}
