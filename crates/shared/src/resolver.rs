//! Maps free text onto a bounded set of meetings. Every multi-meeting path
//! is hard-capped here, at resolution time; downstream components never see
//! an unbounded meeting set.

use std::collections::HashSet;
use std::sync::Arc;

use futures_util::future::join_all;
use tracing::warn;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::detectors::{extract_search_terms, extract_topic, wants_all_customers};
use crate::markup::truncate_with_ellipsis;
use crate::models::{Meeting, MeetingContext};
use crate::orchestrator::SingleMeetingOrchestrator;
use crate::store::ArtifactStore;

const SIGNIFICANT_WORD_LIMIT: usize = 5;
const TRANSCRIPTS_PER_SIGNIFICANT_WORD: usize = 2;
const FAST_PATH_ROW_LIMIT: usize = 48;
const EXCERPTS_PER_MEETING: usize = 3;

const SIGNIFICANT_WORD_STOPWORDS: [&str; 24] = [
    "the", "and", "for", "with", "what", "who", "when", "where", "why", "how", "did", "does",
    "about", "from", "our", "their", "have", "has", "was", "were", "any", "all", "you", "are",
];

#[derive(Debug, Clone)]
pub struct ResolvedMeetings {
    pub meetings: Vec<MeetingContext>,
    pub searched_for: String,
    pub topic: Option<String>,
}

#[derive(Debug, Clone)]
pub struct MeetingExcerptGroup {
    pub meeting: MeetingContext,
    pub excerpts: Vec<String>,
}

pub struct MeetingResolver {
    store: Arc<dyn ArtifactStore>,
    config: AppConfig,
}

impl MeetingResolver {
    pub fn new(store: Arc<dyn ArtifactStore>, config: AppConfig) -> Self {
        Self { store, config }
    }

    /// Free text to 0..N meetings. Returns an empty set rather than failing;
    /// the caller decides between clarification and refusal.
    pub async fn resolve(&self, user_message: &str) -> ResolvedMeetings {
        let topic = extract_topic(user_message);

        if wants_all_customers(user_message) {
            let meetings = self
                .store
                .recent_transcripts(self.config.max_total_transcripts)
                .await
                .unwrap_or_else(|err| {
                    warn!("global transcript fetch failed: {err}");
                    Vec::new()
                });
            return ResolvedMeetings {
                meetings: contexts(meetings),
                searched_for: "all customers".to_string(),
                topic,
            };
        }

        let search_terms = extract_search_terms(user_message);
        if search_terms.is_empty() {
            return ResolvedMeetings {
                meetings: self.significant_word_fallback(user_message).await,
                searched_for: "recent meetings".to_string(),
                topic,
            };
        }

        let mut meetings = self.meetings_for_companies(&search_terms).await;
        if meetings.is_empty() {
            meetings = self.meetings_for_contacts(&search_terms).await;
        }

        ResolvedMeetings {
            meetings,
            searched_for: search_terms.join(", "),
            topic,
        }
    }

    async fn meetings_for_companies(&self, search_terms: &[String]) -> Vec<MeetingContext> {
        let mut seen_companies: HashSet<Uuid> = HashSet::new();
        let mut meetings: Vec<MeetingContext> = Vec::new();

        for term in search_terms {
            let companies = self
                .store
                .search_companies_by_name(term)
                .await
                .unwrap_or_else(|err| {
                    warn!(%term, "company search failed: {err}");
                    Vec::new()
                });
            for company in companies {
                if !seen_companies.insert(company.id) {
                    continue;
                }
                let recent = self
                    .store
                    .recent_transcripts_for_company(
                        company.id,
                        self.config.max_meetings_per_company,
                    )
                    .await
                    .unwrap_or_else(|err| {
                        warn!(company = %company.name, "transcript fetch failed: {err}");
                        Vec::new()
                    });
                meetings.extend(contexts(recent));
                if meetings.len() >= self.config.max_total_transcripts {
                    meetings.truncate(self.config.max_total_transcripts);
                    return meetings;
                }
            }
        }

        meetings
    }

    async fn meetings_for_contacts(&self, search_terms: &[String]) -> Vec<MeetingContext> {
        let mut seen_companies: HashSet<Uuid> = HashSet::new();
        let mut meetings: Vec<MeetingContext> = Vec::new();

        for term in search_terms {
            let contacts = self
                .store
                .search_contacts_by_name(term)
                .await
                .unwrap_or_else(|err| {
                    warn!(%term, "contact search failed: {err}");
                    Vec::new()
                });
            for contact in contacts {
                if !seen_companies.insert(contact.company_id) {
                    continue;
                }
                let recent = self
                    .store
                    .recent_transcripts_for_company(
                        contact.company_id,
                        self.config.max_meetings_per_company,
                    )
                    .await
                    .unwrap_or_default();
                meetings.extend(contexts(recent));
                if meetings.len() >= self.config.max_total_transcripts {
                    meetings.truncate(self.config.max_total_transcripts);
                    return meetings;
                }
            }
        }

        meetings
    }

    /// No entity in the message: try the first few significant words as
    /// company matches, a couple of transcripts each, deduped by company.
    async fn significant_word_fallback(&self, user_message: &str) -> Vec<MeetingContext> {
        let words: Vec<String> = user_message
            .split_whitespace()
            .map(|token| {
                token
                    .chars()
                    .filter(|c| c.is_ascii_alphanumeric())
                    .collect::<String>()
                    .to_lowercase()
            })
            .filter(|word| {
                word.len() >= 3 && !SIGNIFICANT_WORD_STOPWORDS.contains(&word.as_str())
            })
            .take(SIGNIFICANT_WORD_LIMIT)
            .collect();

        let mut seen_companies: HashSet<Uuid> = HashSet::new();
        let mut meetings: Vec<MeetingContext> = Vec::new();
        for word in &words {
            let companies = self
                .store
                .search_companies_by_name(word)
                .await
                .unwrap_or_default();
            let Some(company) = companies.first() else {
                continue;
            };
            if !seen_companies.insert(company.id) {
                continue;
            }
            let recent = self
                .store
                .recent_transcripts_for_company(company.id, TRANSCRIPTS_PER_SIGNIFICANT_WORD)
                .await
                .unwrap_or_default();
            meetings.extend(contexts(recent));
        }

        meetings
    }

    /// Evidence collection across a bounded meeting set. With a topic, a
    /// keyword scan over chunks; without one, the orchestrator re-reads the
    /// first few meetings in parallel and only non-empty answers survive.
    pub async fn search_across_meetings(
        &self,
        orchestrator: &SingleMeetingOrchestrator,
        meetings: &[MeetingContext],
        topic: Option<&str>,
        raw_message: &str,
    ) -> Vec<MeetingExcerptGroup> {
        if meetings.is_empty() {
            return Vec::new();
        }

        match topic {
            Some(topic) => self.keyword_fast_path(meetings, topic).await,
            None => self.orchestrated_slow_path(orchestrator, meetings, raw_message).await,
        }
    }

    async fn keyword_fast_path(
        &self,
        meetings: &[MeetingContext],
        topic: &str,
    ) -> Vec<MeetingExcerptGroup> {
        let ids: Vec<Uuid> = meetings.iter().map(|m| m.meeting_id).collect();
        let rows = self
            .store
            .search_chunks_keyword(&ids, topic, FAST_PATH_ROW_LIMIT)
            .await
            .unwrap_or_else(|err| {
                warn!(topic, "chunk keyword search failed: {err}");
                Vec::new()
            });

        let mut groups: Vec<MeetingExcerptGroup> = Vec::new();
        for meeting in meetings {
            let excerpts: Vec<String> = rows
                .iter()
                .filter(|row| row.transcript_id == meeting.meeting_id)
                .take(EXCERPTS_PER_MEETING)
                .map(|row| {
                    let speaker = row.speaker.as_deref().unwrap_or("Unknown");
                    format!(
                        "[{speaker}] {}",
                        truncate_with_ellipsis(&row.content, self.config.snippet_char_budget)
                    )
                })
                .collect();
            if !excerpts.is_empty() {
                groups.push(MeetingExcerptGroup {
                    meeting: meeting.clone(),
                    excerpts,
                });
            }
        }
        groups
    }

    async fn orchestrated_slow_path(
        &self,
        orchestrator: &SingleMeetingOrchestrator,
        meetings: &[MeetingContext],
        raw_message: &str,
    ) -> Vec<MeetingExcerptGroup> {
        let window = &meetings[..meetings.len().min(self.config.cross_meeting_fanout)];

        let answers = join_all(window.iter().map(|context| async {
            let meeting = match self.store.get_transcript_by_id(context.meeting_id).await {
                Ok(Some(meeting)) => meeting,
                Ok(None) => return None,
                Err(err) => {
                    warn!(meeting_id = %context.meeting_id, "transcript load failed: {err}");
                    return None;
                }
            };
            let answer = orchestrator
                .answer(&meeting, raw_message, false, None, false)
                .await;
            if answer.is_not_found() {
                None
            } else {
                Some(MeetingExcerptGroup {
                    meeting: context.clone(),
                    excerpts: vec![answer.answer],
                })
            }
        }))
        .await;

        answers.into_iter().flatten().collect()
    }
}

fn contexts(meetings: Vec<Meeting>) -> Vec<MeetingContext> {
    meetings.iter().map(Meeting::context).collect()
}
