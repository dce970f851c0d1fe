//! Core conversation engine for the helpdesk.
//!
//! This crate owns answer resolution, the session state machine, chat
//! persistence, classification, escalation, and monitoring used by the
//! binary and SDK facade.

pub mod classify;
pub mod engine;
pub mod error;
pub mod escalation;
pub mod generation;
pub mod monitoring;
pub mod notifiers;
pub mod prompt;
pub mod session;
pub mod state;
pub mod types;

/// Classification adapter and the shipped keyword classifier.
pub use classify::{Classification, ClassificationAdapter, KeywordClassifier};
/// Answer resolution engine.
pub use engine::{AnswerEngine, Resolution};
pub use error::HelpdeskError;
pub use escalation::{Escalation, EscalationOutcome};
pub use generation::LlmGenerator;
pub use monitoring::{MonitorEvent, MonitoringReport};
/// Operator notification channels.
pub use notifiers::{LogNotifier, OutboxNotifier, WebhookNotifier, notifier_from_config};
pub use prompt::PromptBuilder;
/// Helpdesk service and session state machine.
pub use session::{
    ActiveSession, Helpdesk, HelpdeskBuilder, Reply, SessionContext, SessionState,
    default_data_root,
};
/// Chat persistence.
pub use state::{ChatStore, InMemoryChatStore, JsonlChatStore, StoreError};
pub use types::{
    Message, Requester, SessionRecord, SessionSummary, Submission, UnansweredRecord, User,
    is_valid_ticket, new_ticket_id,
};
