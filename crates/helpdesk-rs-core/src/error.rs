//! Error types for the helpdesk core.

use crate::state::StoreError;
use helpdesk_rs_protocol::TicketId;
use thiserror::Error;

/// Errors returned by helpdesk operations.
#[derive(Debug, Error)]
pub enum HelpdeskError {
    /// Ticket does not name a stored session.
    #[error("invalid ticket: {0}")]
    InvalidTicket(TicketId),
    /// Email is not registered.
    #[error("unknown user: {0}")]
    UnknownUser(String),
    /// Operation requires an active session.
    #[error("no active session")]
    NotActive,
    /// Feedback addressed a message that does not exist.
    #[error("message index {index} out of range (len={len})")]
    InvalidMessageIndex { index: usize, len: usize },
    /// Session is leased to another live context.
    #[error("session is in use elsewhere: {0}")]
    SessionBusy(TicketId),
    /// Caller supplied unusable input.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// Component wiring failed.
    #[error("build error: {0}")]
    Build(String),
    /// Chat store error.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}
