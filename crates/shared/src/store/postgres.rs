use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;
use uuid::Uuid;

use crate::models::{
    ActionItem, Chunk, CompanyRecord, ContactRecord, DataSource, InteractionRecord, Meeting,
    PendingOffer, QaPair, QaStatus, SpeakerRole,
};

use super::{ArtifactStore, ChunkExcerpt, StoreError};

const MAX_COMPANY_MATCHES: i64 = 10;
const MAX_CONTACT_MATCHES: i64 = 10;

#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str, query_timeout_ms: u64) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_millis(query_timeout_ms))
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }
}

fn meeting_from_row(row: &PgRow) -> Result<Meeting, StoreError> {
    Ok(Meeting {
        id: row.try_get("id")?,
        company_id: row.try_get("company_id")?,
        company_name: row.try_get("company_name")?,
        meeting_date: row.try_get("meeting_date")?,
        team_attendees: row
            .try_get::<Option<String>, _>("team_attendees")?
            .unwrap_or_default(),
        customer_attendees: row
            .try_get::<Option<String>, _>("customer_attendees")?
            .unwrap_or_default(),
        created_at: row.try_get("created_at")?,
    })
}

const MEETING_COLUMNS: &str = "t.id, t.company_id, c.name AS company_name, t.meeting_date,
         t.team_attendees, t.customer_attendees, t.created_at";

#[async_trait]
impl ArtifactStore for PostgresStore {
    async fn get_transcript_by_id(&self, id: Uuid) -> Result<Option<Meeting>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {MEETING_COLUMNS}
             FROM transcripts t
             JOIN companies c ON c.id = t.company_id
             WHERE t.id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| meeting_from_row(&row)).transpose()
    }

    async fn get_chunks_for_transcript(
        &self,
        id: Uuid,
        limit: usize,
    ) -> Result<Vec<Chunk>, StoreError> {
        let rows = sqlx::query(
            "SELECT transcript_id, chunk_index, speaker, speaker_role, content
             FROM transcript_chunks
             WHERE transcript_id = $1
             ORDER BY chunk_index
             LIMIT $2",
        )
        .bind(id)
        .bind(limit_as_i64(limit)?)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                let role_raw: String = row.try_get("speaker_role")?;
                Ok(Chunk {
                    transcript_id: row.try_get("transcript_id")?,
                    chunk_index: row.try_get("chunk_index")?,
                    speaker: row.try_get("speaker")?,
                    speaker_role: SpeakerRole::from_db(&role_raw),
                    content: row.try_get("content")?,
                })
            })
            .collect()
    }

    async fn get_qa_pairs_by_transcript(&self, id: Uuid) -> Result<Vec<QaPair>, StoreError> {
        let rows = sqlx::query(
            "SELECT transcript_id, question, asker, status, answer, answered_by,
                    question_turn, resolution_turn
             FROM qa_pairs
             WHERE transcript_id = $1
             ORDER BY question_turn",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                let status_raw: String = row.try_get("status")?;
                Ok(QaPair {
                    transcript_id: row.try_get("transcript_id")?,
                    question: row.try_get("question")?,
                    asker: row.try_get("asker")?,
                    status: QaStatus::from_db(&status_raw)?,
                    answer: row.try_get("answer")?,
                    answered_by: row.try_get("answered_by")?,
                    question_turn: row.try_get("question_turn")?,
                    resolution_turn: row.try_get("resolution_turn")?,
                })
            })
            .collect()
    }

    async fn get_meeting_action_items_by_transcript(
        &self,
        id: Uuid,
    ) -> Result<Vec<ActionItem>, StoreError> {
        let rows = sqlx::query(
            "SELECT transcript_id, action, owner, item_type, deadline, evidence,
                    confidence, is_primary
             FROM meeting_action_items
             WHERE transcript_id = $1
             ORDER BY is_primary DESC, confidence DESC",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(ActionItem {
                    transcript_id: row.try_get("transcript_id")?,
                    action: row.try_get("action")?,
                    owner: row.try_get("owner")?,
                    item_type: row.try_get("item_type")?,
                    deadline: row.try_get("deadline")?,
                    confidence: row.try_get::<f64, _>("confidence")? as f32,
                    evidence: row.try_get("evidence")?,
                    is_primary: row.try_get("is_primary")?,
                })
            })
            .collect()
    }

    async fn get_meeting_summary(&self, id: Uuid) -> Result<Option<String>, StoreError> {
        let row = sqlx::query(
            "SELECT narrative
             FROM meeting_summaries
             WHERE transcript_id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| row.try_get("narrative").map_err(StoreError::from))
            .transpose()
    }

    async fn search_companies_by_name(
        &self,
        term: &str,
    ) -> Result<Vec<CompanyRecord>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, name
             FROM companies
             WHERE name ILIKE $1 || '%' OR name ILIKE '%' || $1 || '%'
             ORDER BY CASE WHEN name ILIKE $1 || '%' THEN 0 ELSE 1 END, name
             LIMIT $2",
        )
        .bind(term)
        .bind(MAX_COMPANY_MATCHES)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(CompanyRecord {
                    id: row.try_get("id")?,
                    name: row.try_get("name")?,
                })
            })
            .collect()
    }

    async fn search_contacts_by_name(&self, term: &str) -> Result<Vec<ContactRecord>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, name, company_id
             FROM contacts
             WHERE name ILIKE '%' || $1 || '%'
             ORDER BY name
             LIMIT $2",
        )
        .bind(term)
        .bind(MAX_CONTACT_MATCHES)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(ContactRecord {
                    id: row.try_get("id")?,
                    name: row.try_get("name")?,
                    company_id: row.try_get("company_id")?,
                })
            })
            .collect()
    }

    async fn recent_transcripts_for_company(
        &self,
        company_id: Uuid,
        limit: usize,
    ) -> Result<Vec<Meeting>, StoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {MEETING_COLUMNS}
             FROM transcripts t
             JOIN companies c ON c.id = t.company_id
             WHERE t.company_id = $1
             ORDER BY COALESCE(t.meeting_date::timestamptz, t.created_at) DESC
             LIMIT $2"
        ))
        .bind(company_id)
        .bind(limit_as_i64(limit)?)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(meeting_from_row).collect()
    }

    async fn recent_transcripts(&self, limit: usize) -> Result<Vec<Meeting>, StoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {MEETING_COLUMNS}
             FROM transcripts t
             JOIN companies c ON c.id = t.company_id
             ORDER BY COALESCE(t.meeting_date::timestamptz, t.created_at) DESC
             LIMIT $1"
        ))
        .bind(limit_as_i64(limit)?)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(meeting_from_row).collect()
    }

    async fn search_chunks_keyword(
        &self,
        meeting_ids: &[Uuid],
        keyword: &str,
        limit: usize,
    ) -> Result<Vec<ChunkExcerpt>, StoreError> {
        let rows = sqlx::query(
            "SELECT transcript_id, speaker, content
             FROM transcript_chunks
             WHERE transcript_id = ANY($1)
               AND content ILIKE '%' || $2 || '%'
             ORDER BY transcript_id, chunk_index
             LIMIT $3",
        )
        .bind(meeting_ids)
        .bind(keyword)
        .bind(limit_as_i64(limit)?)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(ChunkExcerpt {
                    transcript_id: row.try_get("transcript_id")?,
                    speaker: row.try_get("speaker")?,
                    content: row.try_get("content")?,
                })
            })
            .collect()
    }

    async fn last_interaction(
        &self,
        thread_id: &str,
    ) -> Result<Option<InteractionRecord>, StoreError> {
        let row = sqlx::query(
            "SELECT thread_id, created_at, intent, data_source, last_answer, pending_offer,
                    meeting_id
             FROM interaction_log
             WHERE thread_id = $1
             ORDER BY created_at DESC
             LIMIT 1",
        )
        .bind(thread_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| {
            let data_source_raw: String = row.try_get("data_source")?;
            let pending_offer_raw: String = row.try_get("pending_offer")?;
            Ok(InteractionRecord {
                thread_id: row.try_get("thread_id")?,
                created_at: row.try_get("created_at")?,
                intent: row.try_get("intent")?,
                data_source: DataSource::from_db(&data_source_raw)?,
                last_answer: row.try_get("last_answer")?,
                pending_offer: PendingOffer::from_db(&pending_offer_raw)?,
                meeting_id: row.try_get("meeting_id")?,
            })
        })
        .transpose()
    }

    async fn append_interaction(&self, record: InteractionRecord) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO interaction_log (
                thread_id,
                created_at,
                intent,
                data_source,
                last_answer,
                pending_offer,
                meeting_id
             ) VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(&record.thread_id)
        .bind(record.created_at)
        .bind(&record.intent)
        .bind(record.data_source.as_str())
        .bind(&record.last_answer)
        .bind(record.pending_offer.as_str())
        .bind(record.meeting_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

fn limit_as_i64(limit: usize) -> Result<i64, StoreError> {
    i64::try_from(limit)
        .map_err(|_| StoreError::InvalidData(format!("limit out of range: {limit}")))
}
