use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    ActionItem, Chunk, CompanyRecord, ContactRecord, InteractionRecord, Meeting, QaPair,
};

mod memory;
mod postgres;

pub use memory::InMemoryArtifactStore;
pub use postgres::PostgresStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("invalid persisted data: {0}")]
    InvalidData(String),
}

/// A keyword hit inside a chunk, attributed to its speaker. Used by the
/// cross-meeting fast path.
#[derive(Debug, Clone)]
pub struct ChunkExcerpt {
    pub transcript_id: Uuid,
    pub speaker: Option<String>,
    pub content: String,
}

/// Read-only surface over the ingestion pipeline's artifacts plus the
/// per-thread interaction log. Every artifact is materialized offline; chat
/// turns never create or mutate artifacts.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    async fn get_transcript_by_id(&self, id: Uuid) -> Result<Option<Meeting>, StoreError>;

    /// Chunks ordered by `chunk_index`, capped at `limit`.
    async fn get_chunks_for_transcript(
        &self,
        id: Uuid,
        limit: usize,
    ) -> Result<Vec<Chunk>, StoreError>;

    async fn get_qa_pairs_by_transcript(&self, id: Uuid) -> Result<Vec<QaPair>, StoreError>;

    /// Raw rows including confidence-zero backfill sentinels; callers filter.
    async fn get_meeting_action_items_by_transcript(
        &self,
        id: Uuid,
    ) -> Result<Vec<ActionItem>, StoreError>;

    async fn get_meeting_summary(&self, id: Uuid) -> Result<Option<String>, StoreError>;

    /// Case-insensitive prefix and substring match on company name, prefix
    /// matches first.
    async fn search_companies_by_name(&self, term: &str)
    -> Result<Vec<CompanyRecord>, StoreError>;

    async fn search_contacts_by_name(&self, term: &str) -> Result<Vec<ContactRecord>, StoreError>;

    /// Most recent transcripts for one company, ordered by
    /// `COALESCE(meeting_date, created_at)` descending.
    async fn recent_transcripts_for_company(
        &self,
        company_id: Uuid,
        limit: usize,
    ) -> Result<Vec<Meeting>, StoreError>;

    /// Most recent transcripts across all companies, same ordering.
    async fn recent_transcripts(&self, limit: usize) -> Result<Vec<Meeting>, StoreError>;

    /// Bounded case-insensitive LIKE over chunk content, restricted to the
    /// given meetings.
    async fn search_chunks_keyword(
        &self,
        meeting_ids: &[Uuid],
        keyword: &str,
        limit: usize,
    ) -> Result<Vec<ChunkExcerpt>, StoreError>;

    async fn last_interaction(
        &self,
        thread_id: &str,
    ) -> Result<Option<InteractionRecord>, StoreError>;

    async fn append_interaction(&self, record: InteractionRecord) -> Result<(), StoreError>;
}
