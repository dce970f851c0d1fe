//! Knowledge records and lenient decoding from stored JSON.

use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Question pattern with its canonical answer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct FaqEntry {
    #[serde(default, alias = "q")]
    pub question: String,
    #[serde(default, alias = "a")]
    pub answer: String,
}

impl FaqEntry {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
        }
    }
}

/// Tagged conversational intent.
///
/// Intents loaded through a knowledge base always carry at least one response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct IntentEntry {
    #[serde(default, alias = "intent")]
    pub tag: String,
    #[serde(default)]
    pub patterns: Vec<String>,
    #[serde(default)]
    pub responses: Vec<String>,
}

impl IntentEntry {
    pub fn new<P, R>(tag: impl Into<String>, patterns: P, responses: R) -> Self
    where
        P: IntoIterator,
        P::Item: Into<String>,
        R: IntoIterator,
        R::Item: Into<String>,
    {
        Self {
            tag: tag.into(),
            patterns: patterns.into_iter().map(Into::into).collect(),
            responses: responses.into_iter().map(Into::into).collect(),
        }
    }
}

/// Long-form knowledge article.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct KnowledgeArticle {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
}

impl KnowledgeArticle {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
        }
    }
}

/// Decode FAQ entries from either an array of records or a question-to-answer map.
///
/// Map entries keep their order in the file.
pub(crate) fn faqs_from_value(value: Value, origin: &str) -> Vec<FaqEntry> {
    match value {
        Value::Object(map) => map
            .into_iter()
            .filter_map(|(question, answer)| match answer {
                Value::String(answer) => Some(FaqEntry { question, answer }),
                other => {
                    warn!("skipping faq with non-string answer (origin={origin}, question={question}, answer={other})");
                    None
                }
            })
            .collect(),
        other => records_from_value::<FaqEntry>(other, origin, "faq")
            .into_iter()
            .inspect(|entry| {
                if entry.question.trim().is_empty() || entry.answer.trim().is_empty() {
                    warn!(
                        "faq record missing question or answer (origin={origin}, question={})",
                        entry.question
                    );
                }
            })
            .collect(),
    }
}

/// Decode intents from `{ "intents": [...] }` or a bare array.
///
/// Intents without responses are dropped.
pub(crate) fn intents_from_value(value: Value, origin: &str) -> Vec<IntentEntry> {
    let value = match value {
        Value::Object(mut map) => map.remove("intents").unwrap_or(Value::Array(Vec::new())),
        other => other,
    };
    records_from_value::<IntentEntry>(value, origin, "intent")
        .into_iter()
        .filter(|intent| {
            if intent.patterns.is_empty() {
                warn!(
                    "intent record has no patterns (origin={origin}, tag={})",
                    intent.tag
                );
            }
            if intent.responses.is_empty() {
                warn!(
                    "skipping intent without responses (origin={origin}, tag={})",
                    intent.tag
                );
                return false;
            }
            true
        })
        .collect()
}

/// Decode articles from `{ "articles": [...] }` or a bare array.
pub(crate) fn articles_from_value(value: Value, origin: &str) -> Vec<KnowledgeArticle> {
    let value = match value {
        Value::Object(mut map) => map.remove("articles").unwrap_or(Value::Array(Vec::new())),
        other => other,
    };
    records_from_value::<KnowledgeArticle>(value, origin, "article")
        .into_iter()
        .inspect(|article| {
            if article.title.trim().is_empty() || article.content.trim().is_empty() {
                warn!(
                    "article record missing title or content (origin={origin}, title={})",
                    article.title
                );
            }
        })
        .collect()
}

/// Decode each array element independently, skipping records with the wrong shape.
fn records_from_value<T>(value: Value, origin: &str, kind: &str) -> Vec<T>
where
    T: for<'de> Deserialize<'de>,
{
    let Value::Array(items) = value else {
        warn!("expected array of {kind} records (origin={origin})");
        return Vec::new();
    };
    items
        .into_iter()
        .enumerate()
        .filter_map(|(idx, item)| match serde_json::from_value::<T>(item) {
            Ok(record) => Some(record),
            Err(err) => {
                warn!("skipping malformed {kind} record (origin={origin}, index={idx}, err={err})");
                None
            }
        })
        .collect()
}
