use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::{
    ActionItem, Chunk, CompanyRecord, ContactRecord, InteractionRecord, Meeting, QaPair,
};

use super::{ArtifactStore, ChunkExcerpt, StoreError};

/// In-memory artifact store with the same query semantics as the Postgres
/// implementation. Backs local development (`ARTIFACT_STORE=memory`) and the
/// test suites.
#[derive(Default)]
pub struct InMemoryArtifactStore {
    state: RwLock<State>,
}

#[derive(Default)]
struct State {
    companies: Vec<CompanyRecord>,
    contacts: Vec<ContactRecord>,
    meetings: Vec<Meeting>,
    chunks: Vec<Chunk>,
    qa_pairs: Vec<QaPair>,
    action_items: Vec<ActionItem>,
    summaries: HashMap<Uuid, String>,
    interactions: Vec<InteractionRecord>,
}

impl InMemoryArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_company(&self, company: CompanyRecord) {
        self.state.write().await.companies.push(company);
    }

    pub async fn insert_contact(&self, contact: ContactRecord) {
        self.state.write().await.contacts.push(contact);
    }

    pub async fn insert_meeting(&self, meeting: Meeting) {
        self.state.write().await.meetings.push(meeting);
    }

    pub async fn insert_chunk(&self, chunk: Chunk) {
        self.state.write().await.chunks.push(chunk);
    }

    pub async fn insert_qa_pair(&self, pair: QaPair) {
        self.state.write().await.qa_pairs.push(pair);
    }

    pub async fn insert_action_item(&self, item: ActionItem) {
        self.state.write().await.action_items.push(item);
    }

    pub async fn insert_summary(&self, transcript_id: Uuid, narrative: String) {
        self.state.write().await.summaries.insert(transcript_id, narrative);
    }
}

fn recency_key(meeting: &Meeting) -> DateTime<Utc> {
    meeting
        .meeting_date
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .unwrap_or(meeting.created_at)
}

fn most_recent(mut meetings: Vec<Meeting>, limit: usize) -> Vec<Meeting> {
    meetings.sort_by_key(|meeting| std::cmp::Reverse(recency_key(meeting)));
    meetings.truncate(limit);
    meetings
}

#[async_trait]
impl ArtifactStore for InMemoryArtifactStore {
    async fn get_transcript_by_id(&self, id: Uuid) -> Result<Option<Meeting>, StoreError> {
        let state = self.state.read().await;
        Ok(state.meetings.iter().find(|m| m.id == id).cloned())
    }

    async fn get_chunks_for_transcript(
        &self,
        id: Uuid,
        limit: usize,
    ) -> Result<Vec<Chunk>, StoreError> {
        let state = self.state.read().await;
        let mut chunks: Vec<Chunk> = state
            .chunks
            .iter()
            .filter(|c| c.transcript_id == id)
            .cloned()
            .collect();
        chunks.sort_by_key(|c| c.chunk_index);
        chunks.truncate(limit);
        Ok(chunks)
    }

    async fn get_qa_pairs_by_transcript(&self, id: Uuid) -> Result<Vec<QaPair>, StoreError> {
        let state = self.state.read().await;
        let mut pairs: Vec<QaPair> = state
            .qa_pairs
            .iter()
            .filter(|p| p.transcript_id == id)
            .cloned()
            .collect();
        pairs.sort_by_key(|p| p.question_turn);
        Ok(pairs)
    }

    async fn get_meeting_action_items_by_transcript(
        &self,
        id: Uuid,
    ) -> Result<Vec<ActionItem>, StoreError> {
        let state = self.state.read().await;
        let mut items: Vec<ActionItem> = state
            .action_items
            .iter()
            .filter(|i| i.transcript_id == id)
            .cloned()
            .collect();
        items.sort_by(|a, b| {
            b.is_primary
                .cmp(&a.is_primary)
                .then(b.confidence.total_cmp(&a.confidence))
        });
        Ok(items)
    }

    async fn get_meeting_summary(&self, id: Uuid) -> Result<Option<String>, StoreError> {
        let state = self.state.read().await;
        Ok(state.summaries.get(&id).cloned())
    }

    async fn search_companies_by_name(
        &self,
        term: &str,
    ) -> Result<Vec<CompanyRecord>, StoreError> {
        let needle = term.to_lowercase();
        let state = self.state.read().await;
        let mut matches: Vec<(usize, CompanyRecord)> = state
            .companies
            .iter()
            .filter_map(|company| {
                let name = company.name.to_lowercase();
                if name.starts_with(&needle) {
                    Some((0, company.clone()))
                } else if name.contains(&needle) {
                    Some((1, company.clone()))
                } else {
                    None
                }
            })
            .collect();
        matches.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.name.cmp(&b.1.name)));
        Ok(matches.into_iter().map(|(_, company)| company).collect())
    }

    async fn search_contacts_by_name(&self, term: &str) -> Result<Vec<ContactRecord>, StoreError> {
        let needle = term.to_lowercase();
        let state = self.state.read().await;
        let mut matches: Vec<ContactRecord> = state
            .contacts
            .iter()
            .filter(|contact| contact.name.to_lowercase().contains(&needle))
            .cloned()
            .collect();
        matches.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(matches)
    }

    async fn recent_transcripts_for_company(
        &self,
        company_id: Uuid,
        limit: usize,
    ) -> Result<Vec<Meeting>, StoreError> {
        let state = self.state.read().await;
        let meetings: Vec<Meeting> = state
            .meetings
            .iter()
            .filter(|m| m.company_id == company_id)
            .cloned()
            .collect();
        Ok(most_recent(meetings, limit))
    }

    async fn recent_transcripts(&self, limit: usize) -> Result<Vec<Meeting>, StoreError> {
        let state = self.state.read().await;
        Ok(most_recent(state.meetings.clone(), limit))
    }

    async fn search_chunks_keyword(
        &self,
        meeting_ids: &[Uuid],
        keyword: &str,
        limit: usize,
    ) -> Result<Vec<ChunkExcerpt>, StoreError> {
        let needle = keyword.to_lowercase();
        let state = self.state.read().await;
        let mut hits: Vec<&Chunk> = state
            .chunks
            .iter()
            .filter(|chunk| {
                meeting_ids.contains(&chunk.transcript_id)
                    && chunk.content.to_lowercase().contains(&needle)
            })
            .collect();
        hits.sort_by_key(|chunk| (chunk.transcript_id, chunk.chunk_index));
        Ok(hits
            .into_iter()
            .take(limit)
            .map(|chunk| ChunkExcerpt {
                transcript_id: chunk.transcript_id,
                speaker: chunk.speaker.clone(),
                content: chunk.content.clone(),
            })
            .collect())
    }

    async fn last_interaction(
        &self,
        thread_id: &str,
    ) -> Result<Option<InteractionRecord>, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .interactions
            .iter()
            .filter(|record| record.thread_id == thread_id)
            .max_by_key(|record| record.created_at)
            .cloned())
    }

    async fn append_interaction(&self, record: InteractionRecord) -> Result<(), StoreError> {
        self.state.write().await.interactions.push(record);
        Ok(())
    }
}
