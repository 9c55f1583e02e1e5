//! Topic resolution
//!
//! A turn either reuses the session's previous topic (the user confirmed a
//! follow-up such as "yes, give me the detail") or asks the classifier.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Substrings that mark a confirmation of the previous topic.
///
/// Matching is substring-based on the lowercased text, so "ok" also
/// matches "book" and "yes" matches "eyes". Accepted as a heuristic.
pub const CONFIRMATION_KEYWORDS: [&str; 8] = [
    "yes",
    "please",
    "comprehensive",
    "detail",
    "sure",
    "ok",
    "okay",
    "yeah",
];

/// Hint appended when a confirmation short-circuits classification
pub const DETAILED_ANSWER_HINT: &str =
    "User has requested the comprehensive detailed analysis. Please provide it now.";

/// The four routable topics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Topic {
    Food,
    Water,
    Transport,
    Energy,
}

impl Topic {
    pub const ALL: [Topic; 4] = [Topic::Food, Topic::Water, Topic::Transport, Topic::Energy];

    pub fn as_str(self) -> &'static str {
        match self {
            Topic::Food => "food",
            Topic::Water => "water",
            Topic::Transport => "transport",
            Topic::Energy => "energy",
        }
    }

    /// Exact match on a normalized label. "transportation" is not "transport".
    pub fn parse(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == label)
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the topic for this turn is obtained
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TopicDecision {
    /// Reuse the previous topic; no classification call
    Reuse(String),
    /// Ask the classifier
    Classify,
}

pub fn is_confirmation(text: &str) -> bool {
    let lowered = text.to_lowercase();
    CONFIRMATION_KEYWORDS
        .iter()
        .any(|keyword| lowered.contains(keyword))
}

pub fn resolve(previous_topic: Option<&str>, text: &str) -> TopicDecision {
    match previous_topic {
        Some(topic) if !topic.is_empty() && is_confirmation(text) => {
            TopicDecision::Reuse(topic.to_string())
        }
        _ => TopicDecision::Classify,
    }
}

/// Lowercase and trim a raw classifier token
pub fn normalize_classification(raw: &str) -> String {
    raw.trim().to_lowercase()
}
