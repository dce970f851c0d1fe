//! Sentiment and priority classification.

use helpdesk_rs_protocol::{Classifier, Priority, Sentiment};
use log::debug;
use std::sync::Arc;

// Entries ending in `*` match any word with that prefix.
const HIGH_PRIORITY: &[&str] = &[
    "urgent",
    "asap",
    "emergency",
    "critical",
    "down",
    "outage*",
    "immediately",
];

const MEDIUM_PRIORITY: &[&str] = &[
    "weird",
    "broken",
    "error*",
    "issue*",
    "problem*",
    "fail*",
    "not working",
    "slow*",
    "crash*",
    "bug*",
];

const POSITIVE: &[&str] = &[
    "thank*",
    "great",
    "helpful",
    "awesome",
    "excellent",
    "appreciat*",
    "love*",
    "perfect",
];

const NEGATIVE: &[&str] = &[
    "not working",
    "frustrat*",
    "angry",
    "terrible",
    "awful",
    "useless",
    "hate*",
    "disappoint*",
    "worst",
    "bad",
];

/// Lexicon classifier over fixed keyword lists.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordClassifier;

impl KeywordClassifier {
    pub fn new() -> Self {
        Self
    }
}

impl Classifier for KeywordClassifier {
    fn predict_sentiment(&self, text: &str) -> Sentiment {
        let words = tokenize(text);
        let mut score = 0i32;
        for (idx, word) in words.iter().enumerate() {
            let negated = idx > 0 && matches!(words[idx - 1].as_str(), "not" | "never" | "no");
            if POSITIVE.iter().any(|keyword| word_matches(word, keyword)) {
                score += if negated { -1 } else { 1 };
            }
        }
        score -= count_hits(&words, NEGATIVE) as i32;
        match score {
            s if s > 0 => Sentiment::Positive,
            s if s < 0 => Sentiment::Negative,
            _ => Sentiment::Neutral,
        }
    }

    fn predict_priority(&self, text: &str) -> Priority {
        let words = tokenize(text);
        if count_hits(&words, HIGH_PRIORITY) > 0 {
            Priority::High
        } else if count_hits(&words, MEDIUM_PRIORITY) > 0 {
            Priority::Medium
        } else {
            Priority::Low
        }
    }
}

/// Lower-cased alphanumeric words.
fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|ch: char| !ch.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(str::to_string)
        .collect()
}

/// Number of keywords present; multi-word keywords match consecutive words.
fn count_hits(words: &[String], keywords: &[&str]) -> usize {
    keywords
        .iter()
        .filter(|keyword| {
            let parts: Vec<&str> = keyword.split(' ').collect();
            words.windows(parts.len()).any(|window| {
                window
                    .iter()
                    .zip(&parts)
                    .all(|(word, part)| word_matches(word, part))
            })
        })
        .count()
}

fn word_matches(word: &str, keyword: &str) -> bool {
    match keyword.strip_suffix('*') {
        Some(prefix) => word.starts_with(prefix),
        None => word == keyword,
    }
}

/// Labels of one user question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Classification {
    pub sentiment: Sentiment,
    pub priority: Priority,
}

/// Wraps a classifier, mapping blank input to neutral/low without consulting it.
#[derive(Clone)]
pub struct ClassificationAdapter {
    classifier: Arc<dyn Classifier>,
}

impl ClassificationAdapter {
    pub fn new(classifier: Arc<dyn Classifier>) -> Self {
        Self { classifier }
    }

    pub fn classify(&self, text: &str) -> Classification {
        if text.trim().is_empty() {
            return Classification::default();
        }
        let classification = Classification {
            sentiment: self.classifier.predict_sentiment(text),
            priority: self.classifier.predict_priority(text),
        };
        debug!(
            "classified input (sentiment={}, priority={})",
            classification.sentiment, classification.priority
        );
        classification
    }
}
