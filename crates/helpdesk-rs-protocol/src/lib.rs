//! Shared labels and capability traits for the helpdesk crates.
//!
//! Everything the core consumes from the outside world (generative models,
//! classifiers, operator notification) is expressed here as a trait so the
//! core, the binary, and the test utilities agree on one contract.

mod classify;
mod generate;
mod notify;

pub use classify::Classifier;
pub use generate::{GenerateError, Generator};
pub use notify::{Notification, NotifyError, Notifier};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Opaque session identifier handed to users as their ticket.
pub type TicketId = String;

/// Error returned when a stored label cannot be parsed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid {kind} label: {value}")]
pub struct LabelParseError {
    /// Label family being parsed.
    pub kind: &'static str,
    /// Raw value that failed to parse.
    pub value: String,
}

/// Sentiment derived from a user question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Sentiment {
    Positive,
    #[default]
    Neutral,
    Negative,
}

impl Sentiment {
    /// Return the label as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Positive => "positive",
            Sentiment::Neutral => "neutral",
            Sentiment::Negative => "negative",
        }
    }
}

impl FromStr for Sentiment {
    type Err = LabelParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "positive" => Ok(Sentiment::Positive),
            "neutral" => Ok(Sentiment::Neutral),
            "negative" => Ok(Sentiment::Negative),
            _ => Err(LabelParseError {
                kind: "sentiment",
                value: value.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for Sentiment {
    type Error = LabelParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Sentiment> for String {
    fn from(value: Sentiment) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ticket priority derived from a user question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Priority {
    #[default]
    Low,
    Medium,
    High,
}

impl Priority {
    /// Return the label as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

impl FromStr for Priority {
    type Err = LabelParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            _ => Err(LabelParseError {
                kind: "priority",
                value: value.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for Priority {
    type Error = LabelParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Priority> for String {
    fn from(value: Priority) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which source produced an answer.
///
/// Serialized as `faq`, `intent:<tag>`, `knowledge`, `ai` or `fallback`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Provenance {
    /// Exact FAQ match.
    Faq,
    /// Fuzzy intent match, carrying the intent tag.
    Intent(String),
    /// Knowledge article match.
    Knowledge,
    /// Generative model answer.
    Ai,
    /// Canned fallback answer.
    #[default]
    Fallback,
}

impl Provenance {
    /// True when the answer came from the canned fallback path.
    pub fn is_fallback(&self) -> bool {
        matches!(self, Provenance::Fallback)
    }
}

impl FromStr for Provenance {
    type Err = LabelParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if let Some(tag) = trimmed.strip_prefix("intent:") {
            return Ok(Provenance::Intent(tag.to_string()));
        }
        match trimmed {
            "faq" => Ok(Provenance::Faq),
            "intent" => Ok(Provenance::Intent(String::new())),
            "knowledge" => Ok(Provenance::Knowledge),
            "ai" => Ok(Provenance::Ai),
            "fallback" => Ok(Provenance::Fallback),
            _ => Err(LabelParseError {
                kind: "provenance",
                value: value.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for Provenance {
    type Error = LabelParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Provenance> for String {
    fn from(value: Provenance) -> Self {
        value.to_string()
    }
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provenance::Faq => f.write_str("faq"),
            Provenance::Intent(tag) => write!(f, "intent:{tag}"),
            Provenance::Knowledge => f.write_str("knowledge"),
            Provenance::Ai => f.write_str("ai"),
            Provenance::Fallback => f.write_str("fallback"),
        }
    }
}
