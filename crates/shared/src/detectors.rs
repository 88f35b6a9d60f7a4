//! Deterministic question-shape recognizers. These never route intents; the
//! decision layer owns routing. Handlers use them for fast paths, guards,
//! and offer handling on the current turn only.

use std::sync::LazyLock;

use regex::Regex;

fn normalized(query: &str) -> String {
    query.trim().to_lowercase()
}

static ATTENDEE_DIRECT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(attendees?|attendance|participants?)\b").expect("valid regex"));
static ATTENDEE_VERB: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(who|how|anyone|was|were)\b.*\battend(ed|ing|s)?\b").expect("valid regex")
});
static ATTENDEE_PRESENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(who|how|anyone)\b.*\b(on the call|in the meeting|was there|were there|joined|present)\b")
        .expect("valid regex")
});

pub fn is_attendee_question(query: &str) -> bool {
    let query = normalized(query);
    ATTENDEE_DIRECT.is_match(&query)
        || ATTENDEE_VERB.is_match(&query)
        || ATTENDEE_PRESENCE.is_match(&query)
}

static ACTION_ITEM_PHRASES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(next steps?|action items?|to-?dos?|follow[- ]?ups?|commitments?|deliverables?|what did we agree|who'?s responsible|who is responsible|what'?s next)\b",
    )
    .expect("valid regex")
});
static ACTION_ITEM_JUDGMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bshould we (mention|bring|discuss|cover|include|raise)\b").expect("valid regex")
});

pub fn is_action_item_question(query: &str) -> bool {
    let query = normalized(query);
    ACTION_ITEM_PHRASES.is_match(&query) || ACTION_ITEM_JUDGMENT.is_match(&query)
}

static BINARY_OPENER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(is|was|are|were|does|do|did|has|have|had|can|could|will|would)\s+(there|we|they|he|she|it|anyone|anybody|someone)\b",
    )
    .expect("valid regex")
});
static BINARY_PASSIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(is|was|are|were|has|have|did)\b.*\b(discussed|mentioned|covered|addressed|raised)\b")
        .expect("valid regex")
});

pub fn is_binary_question(query: &str) -> bool {
    let query = normalized(query);
    BINARY_OPENER.is_match(&query) || BINARY_PASSIVE.is_match(&query)
}

static MEETING_EXISTENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(is|was) there (a|any) (meeting|call|sync)s?\b").expect("valid regex")
});

pub fn is_meeting_existence_question(query: &str) -> bool {
    MEETING_EXISTENCE.is_match(&normalized(query))
}

static SUBJECT_MEETING_WITH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:meeting|call|sync)s?\s+(?:with|about|for|regarding)\s+(.+)$")
        .expect("valid regex")
});
static SUBJECT_PASSIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|\b)(?:was|were|is|are)\s+(.+?)\s+(?:discussed|mentioned|covered|addressed|raised)\b")
        .expect("valid regex")
});
static SUBJECT_ACTIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"did\s+(?:we|they|anyone|anybody|someone)\s+(?:discuss|mention|cover|address|raise|bring up|talk about)\s+(.+)$",
    )
    .expect("valid regex")
});

/// Subject of a binary question, via three patterns in priority order.
pub fn extract_binary_subject(query: &str) -> Option<String> {
    let query = normalized(query);
    for pattern in [&*SUBJECT_MEETING_WITH, &*SUBJECT_PASSIVE, &*SUBJECT_ACTIVE] {
        if let Some(captures) = pattern.captures(&query) {
            let subject = captures
                .get(1)
                .map(|m| m.as_str().trim_matches(|c: char| c.is_ascii_punctuation() || c.is_whitespace()))
                .unwrap_or_default();
            if !subject.is_empty() {
                return Some(subject.to_string());
            }
        }
    }
    None
}

pub const PREPARATION_CLARIFICATION_PROMPT: &str = "Happy to help you prep. Are you asking what \
was covered in a past meeting, or what you should bring up in an upcoming one? If it's a past \
meeting, tell me which company or topic to pull up.";

static AMBIGUOUS_PREPARATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(preparing for|prepare for|get ready for|brief me (?:for|before|on)|what should i (?:cover|know|remember|say)|before (?:the|our|my|this|tomorrow'?s) (?:meeting|call|sync))\b",
    )
    .expect("valid regex")
});

/// Preparation/briefing phrasings are ambiguous between "recap the last
/// meeting" and "help me plan the next one"; both readings change the data
/// source, so the turn must clarify instead of guessing.
pub fn detect_ambiguity(query: &str) -> Option<&'static str> {
    if AMBIGUOUS_PREPARATION.is_match(&normalized(query)) {
        Some(PREPARATION_CLARIFICATION_PROMPT)
    } else {
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OfferResponse {
    Accepted,
    Declined,
}

const ACCEPT_PHRASES: [&str; 8] = [
    "yes",
    "sure",
    "ok",
    "okay",
    "please",
    "go ahead",
    "yes please",
    "sure thing",
];
const DECLINE_PHRASES: [&str; 6] = ["no", "nope", "nah", "never mind", "no thanks", "cancel"];

/// Exact-phrase accept/decline matching for a pending offer. Anything else
/// falls through to normal handling.
pub fn detect_offer_response(query: &str) -> Option<OfferResponse> {
    let stripped: String = normalized(query)
        .chars()
        .filter(|c| !c.is_ascii_punctuation())
        .collect();
    let stripped = stripped.trim();

    if ACCEPT_PHRASES.contains(&stripped) {
        Some(OfferResponse::Accepted)
    } else if DECLINE_PHRASES.contains(&stripped) {
        Some(OfferResponse::Declined)
    } else {
        None
    }
}

static TOPIC_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(?:about|regarding|related to|concerning|discuss|talk about|mentioned|ask about)\s+(.+?)(?:[?.!]|$)",
    )
    .expect("valid regex")
});

const NON_TOPIC_WORDS: [&str; 23] = [
    "the", "a", "an", "our", "their", "your", "my", "this", "that", "these", "those", "meeting",
    "meetings", "call", "calls", "it", "them", "anything", "across", "recent", "recently", "last",
    "latest",
];

pub fn extract_topic(query: &str) -> Option<String> {
    let query = normalized(query);
    let captures = TOPIC_PATTERN.captures(&query)?;
    let phrase = captures.get(1)?.as_str();

    let filtered: Vec<&str> = phrase
        .split_whitespace()
        .filter(|word| !NON_TOPIC_WORDS.contains(word))
        .collect();
    let topic = filtered.join(" ");
    if topic.len() >= 3 { Some(topic) } else { None }
}

static QUOTED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""([^"]+)""#).expect("valid regex"));
static ACRONYM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z]{2,10}$").expect("valid regex"));
static CAPITALIZED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z][a-z]+$").expect("valid regex"));

const FUNCTION_WORDS: [&str; 20] = [
    "i", "we", "the", "a", "an", "what", "who", "when", "where", "why", "how", "did", "was",
    "were", "is", "are", "do", "does", "can", "any",
];
const AMBIGUOUS_ACRONYMS: [&str; 4] = ["roi", "tv", "api", "it"];

/// Entity candidates for company/contact search: quoted strings, proper-noun
/// runs ("Canadian Tire"), and short all-caps acronyms. Function words and a
/// small list of acronyms that read as ordinary English are rejected.
pub fn extract_search_terms(query: &str) -> Vec<String> {
    let mut terms: Vec<String> = Vec::new();
    let mut push_unique = |candidate: String, terms: &mut Vec<String>| {
        let lowered = candidate.to_lowercase();
        if FUNCTION_WORDS.contains(&lowered.as_str())
            || AMBIGUOUS_ACRONYMS.contains(&lowered.as_str())
        {
            return;
        }
        if !terms.iter().any(|t| t.eq_ignore_ascii_case(&candidate)) {
            terms.push(candidate);
        }
    };

    for captures in QUOTED.captures_iter(query) {
        if let Some(quoted) = captures.get(1) {
            let trimmed = quoted.as_str().trim();
            if !trimmed.is_empty() {
                push_unique(trimmed.to_string(), &mut terms);
            }
        }
    }

    let tokens: Vec<&str> = query.split_whitespace().collect();
    let mut index = 0;
    while index < tokens.len() {
        let cleaned = tokens[index].trim_matches(|c: char| !c.is_ascii_alphanumeric());

        if ACRONYM.is_match(cleaned) {
            push_unique(cleaned.to_string(), &mut terms);
            index += 1;
            continue;
        }

        if CAPITALIZED.is_match(cleaned) {
            // Gather a run of capitalized tokens into one entity.
            let mut run = vec![cleaned];
            let mut end = index + 1;
            while end < tokens.len() {
                let next = tokens[end].trim_matches(|c: char| !c.is_ascii_alphanumeric());
                if CAPITALIZED.is_match(next) {
                    run.push(next);
                    end += 1;
                } else {
                    break;
                }
            }
            // A lone capitalized sentence opener is capitalization, not a name.
            if !(index == 0 && run.len() == 1) {
                push_unique(run.join(" "), &mut terms);
            }
            index = end;
            continue;
        }

        index += 1;
    }

    terms
}

static ALL_CUSTOMERS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(all customers|across (?:all )?customers|every (?:company|customer)|all (?:companies|accounts))\b")
        .expect("valid regex")
});

pub fn wants_all_customers(query: &str) -> bool {
    ALL_CUSTOMERS.is_match(&normalized(query))
}

pub fn wants_questions(query: &str) -> bool {
    let query = normalized(query);
    query.contains("question") || query.contains("asked")
}

static CONCERN_WORDS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(concern|issue|problem|worr|risk|challenge|difficult|block)").expect("valid regex")
});

pub fn wants_concerns(query: &str) -> bool {
    CONCERN_WORDS.is_match(&normalized(query))
}

/// Matches the same alphabet on artifact text when the aggregative handler
/// filters for concerns.
pub fn matches_concern(text: &str) -> bool {
    CONCERN_WORDS.is_match(&text.to_lowercase())
}

static ANSWER_VERIFICATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(check|verify|validate|confirm)\b.*\banswers?\b").expect("valid regex")
});

pub fn wants_answer_verification(query: &str) -> bool {
    ANSWER_VERIFICATION.is_match(&normalized(query))
}

#[cfg(test)]
mod tests {
    use super::{
        OfferResponse, detect_ambiguity, detect_offer_response, extract_binary_subject,
        extract_search_terms, extract_topic, is_action_item_question, is_attendee_question,
        is_binary_question, is_meeting_existence_question, wants_all_customers, wants_concerns,
        wants_questions,
    };

    #[test]
    fn attendee_questions_are_detected() {
        assert!(is_attendee_question("Who attended the call?"));
        assert!(is_attendee_question("What was the attendance?"));
        assert!(is_attendee_question("who was on the call from their side"));
        assert!(!is_attendee_question("What are the next steps?"));
    }

    #[test]
    fn action_item_questions_are_detected() {
        assert!(is_action_item_question("What are the next steps?"));
        assert!(is_action_item_question("any follow-ups from yesterday"));
        assert!(is_action_item_question("who's responsible for the rollout"));
        assert!(is_action_item_question("should we mention pricing next time"));
        assert!(!is_action_item_question("Who attended the call?"));
    }

    #[test]
    fn binary_questions_are_detected() {
        assert!(is_binary_question("Is there a meeting with Walmart?"));
        assert!(is_binary_question("Did they mention budget approval?"));
        assert!(is_binary_question("Was pricing discussed?"));
        assert!(!is_binary_question("What did Walmart say about pricing?"));
    }

    #[test]
    fn meeting_existence_is_separated_from_subject_binary() {
        assert!(is_meeting_existence_question("Is there a meeting with Walmart?"));
        assert!(!is_meeting_existence_question("Was Walmart discussed?"));
    }

    #[test]
    fn binary_subject_extraction_tries_patterns_in_order() {
        assert_eq!(
            extract_binary_subject("Is there a meeting with Walmart?"),
            Some("walmart".to_string())
        );
        assert_eq!(
            extract_binary_subject("Was the camera rollout discussed?"),
            Some("the camera rollout".to_string())
        );
        assert_eq!(
            extract_binary_subject("Did they mention budget approval?"),
            Some("budget approval".to_string())
        );
        assert_eq!(extract_binary_subject("What are the next steps?"), None);
    }

    #[test]
    fn preparation_phrasings_trigger_clarification() {
        assert!(detect_ambiguity("help me prepare for the Acme call").is_some());
        assert!(detect_ambiguity("what should I cover tomorrow?").is_some());
        assert!(detect_ambiguity("brief me for the renewal discussion").is_some());
        assert!(detect_ambiguity("What are the next steps?").is_none());
    }

    #[test]
    fn offer_responses_match_exact_phrases_only() {
        assert_eq!(detect_offer_response("Yes please!"), Some(OfferResponse::Accepted));
        assert_eq!(detect_offer_response("  sure  "), Some(OfferResponse::Accepted));
        assert_eq!(detect_offer_response("no thanks"), Some(OfferResponse::Declined));
        assert_eq!(detect_offer_response("never mind."), Some(OfferResponse::Declined));
        assert_eq!(detect_offer_response("yes, and also the action items"), None);
        assert_eq!(detect_offer_response("what about pricing?"), None);
    }

    #[test]
    fn topic_extraction_filters_non_topic_words() {
        assert_eq!(
            extract_topic("What questions came up about cameras across recent calls?"),
            Some("cameras".to_string())
        );
        assert_eq!(
            extract_topic("what did they say regarding the pricing model?"),
            Some("pricing model".to_string())
        );
        assert_eq!(extract_topic("what are the next steps"), None);
    }

    #[test]
    fn search_terms_pick_entities_and_reject_noise() {
        let terms = extract_search_terms("What did Canadian Tire say about the SSO rollout?");
        assert!(terms.contains(&"Canadian Tire".to_string()));
        assert!(terms.contains(&"SSO".to_string()));
        assert!(!terms.iter().any(|t| t.eq_ignore_ascii_case("what")));

        let quoted = extract_search_terms("any meetings covering \"predictive maintenance\"?");
        assert!(quoted.contains(&"predictive maintenance".to_string()));

        assert!(extract_search_terms("what is the ROI on it?").is_empty());
    }

    #[test]
    fn sentence_opening_capital_alone_is_not_an_entity() {
        let terms = extract_search_terms("Pricing came up again");
        assert!(terms.is_empty());
    }

    #[test]
    fn corpus_fanout_phrasings_are_detected() {
        assert!(wants_all_customers("what do all customers ask about onboarding"));
        assert!(wants_all_customers("trends across customers this quarter"));
        assert!(!wants_all_customers("what did Acme ask about onboarding"));
    }

    #[test]
    fn aggregative_sub_shapes_are_detected() {
        assert!(wants_questions("what questions came up"));
        assert!(wants_concerns("any concerns or blockers?"));
        assert!(!wants_concerns("what are the next steps"));
    }
}
