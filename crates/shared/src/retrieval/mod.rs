pub mod keywords;
pub mod retrievers;

pub use keywords::{
    MatchType, QueryTerms, extract_query_terms, match_tier, min_relevance_score, score_candidate,
};
pub use retrievers::{
    AttendeeLists, SnippetMatch, attendee_lists, relevant_action_items, relevant_qa_pairs,
    transcript_snippets,
};
