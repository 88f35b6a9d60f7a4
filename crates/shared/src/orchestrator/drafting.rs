use tokio::join;
use tracing::warn;

use crate::llm::{LlmRequest, ModelRole, prompts};
use crate::models::{DataSource, Meeting};
use crate::retrieval::{relevant_action_items, relevant_qa_pairs};

use super::{AnswerKind, MeetingAnswer, SingleMeetingOrchestrator};

/// Drafts a follow-up from everything the meeting produced. Product
/// knowledge rides along as framing; the prompt forbids citing it.
pub(super) async fn run(
    orchestrator: &SingleMeetingOrchestrator,
    meeting: &Meeting,
    request_text: &str,
) -> MeetingAnswer {
    let (qa_pairs, action_items, window, background) = join!(
        relevant_qa_pairs(orchestrator.store(), meeting.id, None),
        relevant_action_items(orchestrator.store(), meeting.id, None),
        orchestrator.transcript_window(meeting),
        fetch_background(orchestrator),
    );

    let qa_section = if qa_pairs.is_empty() {
        "(none recorded)".to_string()
    } else {
        qa_pairs
            .iter()
            .map(|pair| match pair.answer.as_deref() {
                Some(answer) => format!("Q: {} / A: {answer}", pair.question),
                None => format!("Q: {} (unanswered)", pair.question),
            })
            .collect::<Vec<_>>()
            .join("\n")
    };

    let action_section = if action_items.is_empty() {
        "(none recorded)".to_string()
    } else {
        action_items
            .iter()
            .map(|item| format!("{} — {} ({})", item.action, item.owner, item.deadline))
            .collect::<Vec<_>>()
            .join("\n")
    };

    let transcript_window = window.unwrap_or_else(|| "(no transcript available)".to_string());

    let request = LlmRequest::new(
        ModelRole::SingleMeetingResponse,
        prompts::DRAFTING_SYSTEM_PROMPT,
        prompts::drafting_user_prompt(
            request_text,
            &qa_section,
            &action_section,
            &transcript_window,
            background.as_deref(),
        ),
    );

    match orchestrator.gateway().complete(request).await {
        Ok(completion) => {
            MeetingAnswer::new(AnswerKind::Drafting, DataSource::Drafting, completion.text)
        }
        Err(err) => {
            warn!(meeting_id = %meeting.id, "drafting failed: {err}");
            let mut answer = MeetingAnswer::new(
                AnswerKind::Drafting,
                DataSource::NotFound,
                "I couldn't put the draft together just now. Please try again in a moment."
                    .to_string(),
            );
            answer.semantic_error = Some(err.to_string());
            answer
        }
    }
}

async fn fetch_background(orchestrator: &SingleMeetingOrchestrator) -> Option<String> {
    let service = orchestrator.knowledge()?;
    match service.fetch().await {
        Ok(Some(knowledge)) => Some(knowledge.render()),
        Ok(None) => None,
        Err(err) => {
            warn!("product knowledge fetch failed: {err}");
            None
        }
    }
}
