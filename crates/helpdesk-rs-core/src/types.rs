//! Core data types for users, sessions and messages.

use chrono::{DateTime, Utc};
use helpdesk_rs_protocol::{Priority, Provenance, Sentiment, TicketId};
use log::warn;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

/// Registered support user, keyed by email.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub email: String,
    pub name: String,
    pub first_seen: DateTime<Utc>,
    pub last_active: DateTime<Utc>,
}

/// One question/answer exchange in a session.
///
/// Legacy records are migrated on read: `q`/`a` keys, missing labels and
/// contradictory feedback flags are normalized.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(from = "StoredMessage")]
pub struct Message {
    /// Id of the submission that produced this message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submission_id: Option<Uuid>,
    pub question: String,
    pub answer: String,
    pub timestamp: DateTime<Utc>,
    pub provenance: Provenance,
    pub confidence: f64,
    pub sentiment: Sentiment,
    pub priority: Priority,
    pub thumbs_up: bool,
    pub thumbs_down: bool,
}

impl Message {
    /// Set one feedback flag and clear the other.
    pub fn apply_feedback(&mut self, liked: bool) {
        self.thumbs_up = liked;
        self.thumbs_down = !liked;
    }

    /// Feedback given so far, if any.
    pub fn feedback(&self) -> Option<bool> {
        match (self.thumbs_up, self.thumbs_down) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        }
    }
}

/// Wire shape accepted for messages, including legacy layouts.
#[derive(Deserialize)]
struct StoredMessage {
    #[serde(default)]
    submission_id: Option<Uuid>,
    #[serde(default, alias = "q")]
    question: String,
    #[serde(default, alias = "a")]
    answer: String,
    #[serde(default, alias = "created_at")]
    timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    provenance: Option<String>,
    #[serde(default)]
    confidence: Option<f64>,
    #[serde(default)]
    sentiment: Option<String>,
    #[serde(default)]
    priority: Option<String>,
    #[serde(default)]
    thumbs_up: Option<bool>,
    #[serde(default)]
    thumbs_down: Option<bool>,
}

impl From<StoredMessage> for Message {
    fn from(stored: StoredMessage) -> Self {
        let thumbs_down = stored.thumbs_down.unwrap_or(false);
        let thumbs_up = stored.thumbs_up.unwrap_or(false) && !thumbs_down;
        Self {
            submission_id: stored.submission_id,
            question: stored.question,
            answer: stored.answer,
            timestamp: stored.timestamp.unwrap_or(DateTime::UNIX_EPOCH),
            provenance: parse_label(stored.provenance.as_deref(), "provenance"),
            confidence: stored.confidence.unwrap_or(0.0),
            sentiment: parse_label(stored.sentiment.as_deref(), "sentiment"),
            priority: parse_label(stored.priority.as_deref(), "priority"),
            thumbs_up,
            thumbs_down,
        }
    }
}

fn parse_label<T>(value: Option<&str>, kind: &str) -> T
where
    T: FromStr + Default,
{
    let Some(value) = value else {
        return T::default();
    };
    value.parse().unwrap_or_else(|_| {
        warn!("unrecognized stored label, using default (kind={kind}, value={value})");
        T::default()
    })
}

/// Persisted session with its full history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionRecord {
    pub ticket: TicketId,
    pub email: String,
    #[serde(default)]
    pub request_type: String,
    pub started_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub messages: Vec<Message>,
}

/// Summary view of a session for listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionSummary {
    pub ticket: TicketId,
    pub request_type: String,
    pub started_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub message_count: usize,
    /// First question asked, if any.
    pub preview: Option<String>,
}

impl From<&SessionRecord> for SessionSummary {
    fn from(record: &SessionRecord) -> Self {
        Self {
            ticket: record.ticket.clone(),
            request_type: record.request_type.clone(),
            started_at: record.started_at,
            updated_at: record.updated_at,
            message_count: record.messages.len(),
            preview: record
                .messages
                .first()
                .map(|message| message.question.clone()),
        }
    }
}

/// Question nobody could answer, kept for operator follow-up.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UnansweredRecord {
    pub email: String,
    pub question: String,
    pub request_type: String,
    pub timestamp: DateTime<Utc>,
}

/// The person behind a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requester {
    pub email: String,
    pub name: String,
    pub request_type: String,
}

/// User input with a client-chosen id; re-posting the same id is a no-op.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub id: Uuid,
    pub text: String,
}

impl Submission {
    /// Wrap text with a fresh submission id.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
        }
    }
}

/// Generate a sortable ticket id: `YYYYMMDDHHMMSS-<12 hex chars>`.
pub fn new_ticket_id(now: DateTime<Utc>) -> TicketId {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{}-{}", now.format("%Y%m%d%H%M%S"), &suffix[..12])
}

/// True when the value can name a ticket (and a rollout file).
pub fn is_valid_ticket(value: &str) -> bool {
    !value.is_empty()
        && value.len() <= 64
        && value
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_')
}
