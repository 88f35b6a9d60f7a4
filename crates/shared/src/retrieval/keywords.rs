use std::collections::HashSet;
use std::sync::LazyLock;

/// Frozen stop-word set: generic English stopwords, weekdays, and the
/// temporal words people use to point at a meeting rather than describe it.
static STOP_WORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    HashSet::from([
        "about", "above", "after", "again", "against", "because", "been", "before", "being",
        "below", "between", "both", "could", "did", "does", "doing", "down", "during", "each",
        "few", "from", "further", "have", "having", "here", "how", "into", "just", "more", "most",
        "once", "only", "other", "over", "same", "should", "some", "such", "than", "that", "the",
        "their", "theirs", "them", "then", "there", "these", "they", "this", "those", "through",
        "under", "until", "very", "was", "were", "what", "when", "where", "which", "while", "who",
        "whom", "whose", "why", "will", "with", "would", "your", "yours", "anything", "something",
        "everything", "tell", "know", "want", "need", "give", "said", "says", "talk", "talked",
        "discuss", "discussed", "mention", "mentioned", "monday", "tuesday", "wednesday",
        "thursday", "friday", "saturday", "sunday", "last", "latest", "recent", "recently",
        "previous", "earlier", "today", "yesterday", "meeting", "meetings", "call", "calls",
        "sync", "transcript", "conversation",
    ])
});

const MIN_KEYWORD_LEN: usize = 4;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryTerms {
    /// Lowercased proper nouns found in the query.
    pub proper_nouns: Vec<String>,
    /// Lowercased topic keywords, disjoint from the proper nouns.
    pub keywords: Vec<String>,
}

impl QueryTerms {
    pub fn is_empty(&self) -> bool {
        self.proper_nouns.is_empty() && self.keywords.is_empty()
    }
}

/// How a candidate matched the query, in precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchType {
    Both,
    Keyword,
    ProperNoun,
}

pub fn extract_query_terms(query: &str) -> QueryTerms {
    let raw_tokens: Vec<&str> = query.split_whitespace().collect();

    let mut proper_nouns: Vec<String> = Vec::new();
    for (index, token) in raw_tokens.iter().enumerate() {
        let trimmed = token.trim_matches(|c: char| !c.is_ascii_alphanumeric());
        // The sentence opener is capitalized by convention, not by name.
        if index == 0 || !is_proper_noun(trimmed) {
            continue;
        }
        let lowered = trimmed.to_ascii_lowercase();
        if !proper_nouns.contains(&lowered) {
            proper_nouns.push(lowered);
        }
    }

    let mut keywords: Vec<String> = Vec::new();
    for token in &raw_tokens {
        let cleaned: String = token
            .chars()
            .filter(|c| c.is_ascii_alphabetic())
            .collect::<String>()
            .to_ascii_lowercase();
        if cleaned.len() < MIN_KEYWORD_LEN || STOP_WORDS.contains(cleaned.as_str()) {
            continue;
        }
        if proper_nouns.contains(&cleaned) || keywords.contains(&cleaned) {
            continue;
        }
        keywords.push(cleaned);
    }

    QueryTerms {
        proper_nouns,
        keywords,
    }
}

fn is_proper_noun(token: &str) -> bool {
    let mut chars = token.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    first.is_ascii_uppercase() && chars.clone().count() >= 1 && chars.all(|c| c.is_ascii_lowercase())
}

/// Distinct matched terms, case-insensitive substring. A candidate that
/// misses every proper noun of a name-carrying query scores -1 and is out,
/// however many topic keywords it matched.
pub fn score_candidate(text: &str, terms: &QueryTerms) -> i32 {
    let haystack = text.to_lowercase();

    let matched_proper_nouns = terms
        .proper_nouns
        .iter()
        .filter(|noun| haystack.contains(noun.as_str()))
        .count();
    if !terms.proper_nouns.is_empty() && matched_proper_nouns == 0 {
        return -1;
    }

    let matched_keywords = terms
        .keywords
        .iter()
        .filter(|keyword| haystack.contains(keyword.as_str()))
        .count();

    (matched_proper_nouns + matched_keywords) as i32
}

pub fn min_relevance_score(terms: &QueryTerms) -> i32 {
    if !terms.proper_nouns.is_empty() {
        return 1;
    }
    if terms.keywords.len() <= 2 { 1 } else { 2 }
}

pub fn match_tier(text: &str, terms: &QueryTerms) -> Option<MatchType> {
    let haystack = text.to_lowercase();
    let hit_proper_noun = terms
        .proper_nouns
        .iter()
        .any(|noun| haystack.contains(noun.as_str()));
    let hit_keyword = terms
        .keywords
        .iter()
        .any(|keyword| haystack.contains(keyword.as_str()));

    match (hit_proper_noun, hit_keyword) {
        (true, true) => Some(MatchType::Both),
        (false, true) => Some(MatchType::Keyword),
        (true, false) => Some(MatchType::ProperNoun),
        (false, false) => None,
    }
}
