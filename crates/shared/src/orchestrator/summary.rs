use tracing::warn;

use crate::llm::{LlmRequest, ModelRole, prompts};
use crate::models::{DataSource, Meeting};

use super::{AnswerKind, MeetingAnswer, SingleMeetingOrchestrator};

/// Executive summary of one meeting. A summary stored by the ingestion
/// pipeline wins over generating a fresh one.
pub(super) async fn run(
    orchestrator: &SingleMeetingOrchestrator,
    meeting: &Meeting,
) -> MeetingAnswer {
    match orchestrator.store().get_meeting_summary(meeting.id).await {
        Ok(Some(narrative)) => {
            return MeetingAnswer::new(AnswerKind::Summary, DataSource::Summary, narrative);
        }
        Ok(None) => {}
        Err(err) => {
            warn!(meeting_id = %meeting.id, "stored summary lookup failed: {err}");
        }
    }

    let Some(window) = orchestrator.transcript_window(meeting).await else {
        return MeetingAnswer::new(
            AnswerKind::Summary,
            DataSource::NotFound,
            "I don't have a transcript for this meeting yet, so I can't summarize it.".to_string(),
        );
    };

    let request = LlmRequest::new(
        ModelRole::ExecutiveSummary,
        prompts::EXECUTIVE_SUMMARY_SYSTEM_PROMPT,
        prompts::executive_summary_user_prompt(&meeting.company_name, &window),
    );

    match orchestrator.gateway().complete(request).await {
        Ok(completion) => {
            MeetingAnswer::new(AnswerKind::Summary, DataSource::Summary, completion.text)
        }
        Err(err) => {
            warn!(meeting_id = %meeting.id, "summary generation failed: {err}");
            let mut answer = MeetingAnswer::new(
                AnswerKind::Summary,
                DataSource::NotFound,
                "I couldn't generate the summary just now. Please try again in a moment."
                    .to_string(),
            );
            answer.semantic_error = Some(err.to_string());
            answer
        }
    }
}
