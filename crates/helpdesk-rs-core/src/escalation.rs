//! Recording and notifying operators about unanswered or rated exchanges.

use crate::state::ChatStore;
use crate::types::{Requester, UnansweredRecord};
use chrono::Utc;
use helpdesk_rs_config::EscalationConfig;
use helpdesk_rs_protocol::{Notification, Notifier};
use log::{info, warn};
use std::sync::Arc;

/// Result of a best-effort escalation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EscalationOutcome {
    /// Record was persisted.
    pub stored: bool,
    /// Operator was notified.
    pub notified: bool,
    /// Failures that did not block the conversation.
    pub warnings: Vec<String>,
}

/// Escalation component. Never fails; problems become warnings.
pub struct Escalation {
    store: Arc<dyn ChatStore>,
    notifier: Arc<dyn Notifier>,
    config: EscalationConfig,
}

impl Escalation {
    pub fn new(
        store: Arc<dyn ChatStore>,
        notifier: Arc<dyn Notifier>,
        config: EscalationConfig,
    ) -> Self {
        Self {
            store,
            notifier,
            config,
        }
    }

    /// Store the question and notify the operator.
    pub async fn record_unanswered(
        &self,
        requester: &Requester,
        question: &str,
    ) -> EscalationOutcome {
        let mut outcome = EscalationOutcome::default();
        let record = UnansweredRecord {
            email: requester.email.clone(),
            question: question.to_string(),
            request_type: requester.request_type.clone(),
            timestamp: Utc::now(),
        };
        match self.store.record_unanswered(&record) {
            Ok(()) => {
                info!("recorded unanswered question (email={})", requester.email);
                outcome.stored = true;
            }
            Err(err) => {
                warn!(
                    "failed to store unanswered question (email={}, err={})",
                    requester.email, err
                );
                outcome
                    .warnings
                    .push(format!("unanswered record not stored: {err}"));
            }
        }
        let request_type = if requester.request_type.is_empty() {
            "General"
        } else {
            requester.request_type.as_str()
        };
        let notification = Notification::new(
            self.config.recipient.clone(),
            format!(
                "[Helpdesk - Unanswered] New question from {}",
                requester.email
            ),
            format!(
                "Question: {}\nType: {}\nUser: {} ({})",
                question, request_type, requester.name, requester.email
            ),
        );
        self.deliver(&notification, &mut outcome).await;
        outcome
    }

    /// Notify the operator about a rating.
    pub async fn record_feedback(
        &self,
        requester: &Requester,
        question: &str,
        answer: &str,
        liked: bool,
    ) -> EscalationOutcome {
        let mut outcome = EscalationOutcome::default();
        let thumb = if liked { "👍" } else { "👎" };
        let notification = Notification::new(
            self.config.recipient.clone(),
            format!("[Helpdesk - Feedback] {thumb} from {}", requester.email),
            format!(
                "Question: {}\nAnswer: {}\nFeedback: {}\nUser: {} ({})",
                question,
                answer,
                if liked { "liked" } else { "disliked" },
                requester.name,
                requester.email
            ),
        );
        self.deliver(&notification, &mut outcome).await;
        outcome
    }

    /// True when a rating with this polarity is escalated.
    pub fn escalates_feedback(&self, liked: bool) -> bool {
        !liked || self.config.notify_on_like
    }

    async fn deliver(&self, notification: &Notification, outcome: &mut EscalationOutcome) {
        if !self.config.enabled {
            return;
        }
        match self.notifier.notify(notification).await {
            Ok(()) => outcome.notified = true,
            Err(err) => {
                warn!(
                    "failed to notify operator (subject={}, err={})",
                    notification.subject, err
                );
                outcome.warnings.push(format!("notification failed: {err}"));
            }
        }
    }
}
