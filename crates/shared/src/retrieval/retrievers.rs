use tracing::warn;
use uuid::Uuid;

use crate::models::{ActionItem, Chunk, Meeting, QaPair};
use crate::store::ArtifactStore;

use super::keywords::{MatchType, QueryTerms, match_tier};

/// How many chunks a snippet search will scan before tiering.
const SNIPPET_SCAN_LIMIT: usize = 500;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttendeeLists {
    pub internal: Vec<String>,
    pub customer: Vec<String>,
}

pub fn attendee_lists(meeting: &Meeting) -> AttendeeLists {
    AttendeeLists {
        internal: split_attendees(&meeting.team_attendees),
        customer: split_attendees(&meeting.customer_attendees),
    }
}

fn split_attendees(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// Q&A pairs for the meeting, tier-filtered when query terms are given:
/// noun+keyword matches first, then keyword-only, then name-only. Only the
/// first non-empty tier is returned.
pub async fn relevant_qa_pairs(
    store: &dyn ArtifactStore,
    meeting_id: Uuid,
    terms: Option<&QueryTerms>,
) -> Vec<QaPair> {
    let pairs = match store.get_qa_pairs_by_transcript(meeting_id).await {
        Ok(pairs) => pairs,
        Err(err) => {
            warn!(%meeting_id, "qa pair retrieval failed: {err}");
            return Vec::new();
        }
    };

    match terms {
        Some(terms) if !terms.is_empty() => first_matching_tier(pairs, terms, qa_pair_text),
        _ => pairs,
    }
}

fn qa_pair_text(pair: &QaPair) -> String {
    match &pair.answer {
        Some(answer) => format!("{} {}", pair.question, answer),
        None => pair.question.clone(),
    }
}

/// Action items with `confidence > 0`, tier-filtered over
/// action ⧺ evidence ⧺ owner when query terms are given.
pub async fn relevant_action_items(
    store: &dyn ArtifactStore,
    meeting_id: Uuid,
    terms: Option<&QueryTerms>,
) -> Vec<ActionItem> {
    let items = match store.get_meeting_action_items_by_transcript(meeting_id).await {
        Ok(items) => items,
        Err(err) => {
            warn!(%meeting_id, "action item retrieval failed: {err}");
            return Vec::new();
        }
    };

    let items: Vec<ActionItem> = items
        .into_iter()
        .filter(|item| item.confidence > 0.0)
        .collect();

    match terms {
        Some(terms) if !terms.is_empty() => first_matching_tier(items, terms, action_item_text),
        _ => items,
    }
}

fn action_item_text(item: &ActionItem) -> String {
    format!("{} {} {}", item.action, item.evidence, item.owner)
}

#[derive(Debug, Clone)]
pub struct SnippetMatch {
    pub chunk: Chunk,
    pub match_type: MatchType,
}

/// Up to `limit` chunks from the first non-empty match tier. Every returned
/// snippet carries the tier it matched on so callers can apply the
/// entity-only guardrail.
pub async fn transcript_snippets(
    store: &dyn ArtifactStore,
    meeting_id: Uuid,
    terms: &QueryTerms,
    limit: usize,
) -> Vec<SnippetMatch> {
    if terms.is_empty() {
        return Vec::new();
    }

    let chunks = match store
        .get_chunks_for_transcript(meeting_id, SNIPPET_SCAN_LIMIT)
        .await
    {
        Ok(chunks) => chunks,
        Err(err) => {
            warn!(%meeting_id, "chunk retrieval failed: {err}");
            return Vec::new();
        }
    };

    let mut both = Vec::new();
    let mut keyword = Vec::new();
    let mut proper_noun = Vec::new();
    for chunk in chunks {
        match match_tier(&chunk.content, terms) {
            Some(MatchType::Both) => both.push(chunk),
            Some(MatchType::Keyword) => keyword.push(chunk),
            Some(MatchType::ProperNoun) => proper_noun.push(chunk),
            None => {}
        }
    }

    let (tier, match_type) = if !both.is_empty() {
        (both, MatchType::Both)
    } else if !keyword.is_empty() {
        (keyword, MatchType::Keyword)
    } else {
        (proper_noun, MatchType::ProperNoun)
    };

    tier.into_iter()
        .take(limit)
        .map(|chunk| SnippetMatch { chunk, match_type })
        .collect()
}

fn first_matching_tier<T>(
    candidates: Vec<T>,
    terms: &QueryTerms,
    text_of: impl Fn(&T) -> String,
) -> Vec<T> {
    let mut both = Vec::new();
    let mut keyword = Vec::new();
    let mut proper_noun = Vec::new();
    for candidate in candidates {
        match match_tier(&text_of(&candidate), terms) {
            Some(MatchType::Both) => both.push(candidate),
            Some(MatchType::Keyword) => keyword.push(candidate),
            Some(MatchType::ProperNoun) => proper_noun.push(candidate),
            None => {}
        }
    }

    if !both.is_empty() {
        both
    } else if !keyword.is_empty() {
        keyword
    } else {
        proper_noun
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use crate::models::{ActionItem, Meeting, QaPair, QaStatus};
    use crate::retrieval::keywords::extract_query_terms;
    use crate::store::InMemoryArtifactStore;

    use super::{attendee_lists, relevant_action_items, relevant_qa_pairs};

    fn meeting(team: &str, customers: &str) -> Meeting {
        Meeting {
            id: Uuid::new_v4(),
            company_id: Uuid::new_v4(),
            company_name: "Acme".to_string(),
            meeting_date: None,
            team_attendees: team.to_string(),
            customer_attendees: customers.to_string(),
            created_at: Utc::now(),
        }
    }

    fn qa_pair(transcript_id: Uuid, question: &str, turn: i32) -> QaPair {
        QaPair {
            transcript_id,
            question: question.to_string(),
            asker: None,
            status: QaStatus::Open,
            answer: None,
            answered_by: None,
            question_turn: turn,
            resolution_turn: None,
        }
    }

    fn action_item(transcript_id: Uuid, action: &str, confidence: f32) -> ActionItem {
        ActionItem {
            transcript_id,
            action: action.to_string(),
            owner: "Alice".to_string(),
            item_type: "follow_up".to_string(),
            deadline: "Not specified".to_string(),
            evidence: "quoted evidence".to_string(),
            confidence,
            is_primary: false,
        }
    }

    #[test]
    fn attendee_lists_split_trim_and_drop_empties() {
        let meeting = meeting("Alice, Bob ,", " Dana ");
        let lists = attendee_lists(&meeting);
        assert_eq!(lists.internal, vec!["Alice", "Bob"]);
        assert_eq!(lists.customer, vec!["Dana"]);
    }

    #[tokio::test]
    async fn qa_pairs_return_first_non_empty_tier() {
        let store = InMemoryArtifactStore::new();
        let id = Uuid::new_v4();
        store
            .insert_qa_pair(qa_pair(id, "How does pricing work for Walmart?", 1))
            .await;
        store
            .insert_qa_pair(qa_pair(id, "What is the deployment timeline?", 2))
            .await;
        store.insert_qa_pair(qa_pair(id, "Walmart asked about support", 3)).await;

        let terms = extract_query_terms("What did Walmart ask about pricing?");
        let pairs = relevant_qa_pairs(&store, id, Some(&terms)).await;

        assert_eq!(pairs.len(), 1);
        assert!(pairs[0].question.contains("pricing"));
    }

    #[tokio::test]
    async fn qa_pairs_keep_name_only_tier_when_no_keyword_hits() {
        let store = InMemoryArtifactStore::new();
        let id = Uuid::new_v4();
        store.insert_qa_pair(qa_pair(id, "Walmart asked about support", 1)).await;

        let terms = extract_query_terms("What did Walmart want regarding onboarding?");
        let pairs = relevant_qa_pairs(&store, id, Some(&terms)).await;

        assert_eq!(pairs.len(), 1);
    }

    #[tokio::test]
    async fn confidence_zero_action_items_are_filtered() {
        let store = InMemoryArtifactStore::new();
        let id = Uuid::new_v4();
        store.insert_action_item(action_item(id, "Send pricing sheet", 0.9)).await;
        store.insert_action_item(action_item(id, "backfill sentinel row", 0.0)).await;

        let items = relevant_action_items(&store, id, None).await;

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].action, "Send pricing sheet");
    }
}
