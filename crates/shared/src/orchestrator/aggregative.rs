use crate::detectors::{matches_concern, wants_concerns, wants_questions};
use crate::markup::{bold, bullet, italic_quote};
use crate::models::{DataSource, Meeting};
use crate::retrieval::{relevant_action_items, relevant_qa_pairs};

use super::{AnswerKind, MeetingAnswer, SingleMeetingOrchestrator, uncertainty_response};

const QUESTION_LIST_CAP: usize = 10;

pub(super) async fn run(
    orchestrator: &SingleMeetingOrchestrator,
    meeting: &Meeting,
    question: &str,
) -> MeetingAnswer {
    if wants_questions(question) {
        return all_questions(orchestrator, meeting).await;
    }
    if wants_concerns(question) {
        return concerns(orchestrator, meeting).await;
    }
    all_action_items(orchestrator, meeting).await
}

async fn all_questions(
    orchestrator: &SingleMeetingOrchestrator,
    meeting: &Meeting,
) -> MeetingAnswer {
    let pairs = relevant_qa_pairs(orchestrator.store(), meeting.id, None).await;
    if pairs.is_empty() {
        return uncertainty_response(AnswerKind::Aggregative);
    }

    let total = pairs.len();
    let mut answer = bold(&format!("Questions from this meeting ({total})"));
    answer.push('\n');
    for pair in pairs.iter().take(QUESTION_LIST_CAP) {
        answer.push_str(&format!("{}\n", bullet(&italic_quote(&pair.question))));
        if let Some(resolved) = pair.answer.as_deref() {
            let answered_by = pair.answered_by.as_deref().unwrap_or("our team");
            answer.push_str(&format!("   {answered_by}: {resolved}\n"));
        }
    }
    if total > QUESTION_LIST_CAP {
        answer.push_str(&format!("…and {} more\n", total - QUESTION_LIST_CAP));
    }

    MeetingAnswer::new(AnswerKind::Aggregative, DataSource::QaPairs, answer)
}

async fn concerns(
    orchestrator: &SingleMeetingOrchestrator,
    meeting: &Meeting,
) -> MeetingAnswer {
    let pairs = relevant_qa_pairs(orchestrator.store(), meeting.id, None).await;
    let concerning: Vec<_> = pairs
        .iter()
        .filter(|pair| {
            matches_concern(&pair.question)
                || pair.answer.as_deref().is_some_and(matches_concern)
        })
        .collect();
    if concerning.is_empty() {
        return uncertainty_response(AnswerKind::Aggregative);
    }

    let mut answer = bold("Concerns raised");
    answer.push('\n');
    for pair in concerning {
        answer.push_str(&format!("{}\n", bullet(&italic_quote(&pair.question))));
    }

    MeetingAnswer::new(AnswerKind::Aggregative, DataSource::QaPairs, answer)
}

async fn all_action_items(
    orchestrator: &SingleMeetingOrchestrator,
    meeting: &Meeting,
) -> MeetingAnswer {
    let items = relevant_action_items(orchestrator.store(), meeting.id, None).await;
    if items.is_empty() {
        return uncertainty_response(AnswerKind::Aggregative);
    }

    let mut answer = bold("Action items");
    answer.push('\n');
    for item in &items {
        answer.push_str(&format!(
            "{}\n",
            bullet(&format!("{} — {} ({})", item.action, item.owner, item.deadline))
        ));
    }

    MeetingAnswer::new(AnswerKind::Aggregative, DataSource::ActionItems, answer)
}
