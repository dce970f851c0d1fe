use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Message addressed to a human operator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Notification {
    /// Unique id for the notification.
    pub id: Uuid,
    /// Recipient address (email or channel name).
    pub recipient: String,
    /// Subject line.
    pub subject: String,
    /// Plain-text body.
    pub body: String,
    /// Timestamp when the notification was created.
    pub created_at: DateTime<Utc>,
}

impl Notification {
    /// Build a notification stamped with a fresh id and the current time.
    pub fn new(
        recipient: impl Into<String>,
        subject: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            recipient: recipient.into(),
            subject: subject.into(),
            body: body.into(),
            created_at: Utc::now(),
        }
    }
}

/// Errors returned by notification channels.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    /// Channel could not deliver the notification.
    #[error("delivery failed: {0}")]
    Delivery(String),
    /// IO error while writing to a local channel.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// Serialization error.
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Best-effort operator notification channel.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver a single notification.
    async fn notify(&self, notification: &Notification) -> Result<(), NotifyError>;
}
