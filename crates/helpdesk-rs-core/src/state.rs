//! Chat persistence: users, session rollouts, unanswered questions and monitoring.

use crate::monitoring::MonitorEvent;
use crate::types::{Message, SessionRecord, SessionSummary, UnansweredRecord, User, is_valid_ticket};
use chrono::{DateTime, Utc};
use helpdesk_rs_protocol::TicketId;
use log::{debug, info, warn};
use parking_lot::{Mutex, RwLock};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Rollout schema version written at the head of every session file.
const SCHEMA_VERSION: u32 = 1;

/// Persistent store abstraction for the helpdesk.
pub trait ChatStore: Send + Sync {
    /// Create the user or refresh their name and last-active time.
    fn upsert_user(&self, email: &str, name: &str, at: DateTime<Utc>) -> Result<User, StoreError>;
    /// Refresh last-active for a known user; `None` when the email is unknown.
    fn touch_user(&self, email: &str, at: DateTime<Utc>) -> Result<Option<User>, StoreError>;
    /// Load a user by email.
    fn load_user(&self, email: &str) -> Result<Option<User>, StoreError>;
    /// Record a new session.
    fn create_session(
        &self,
        ticket: &str,
        email: &str,
        request_type: &str,
        started_at: DateTime<Utc>,
    ) -> Result<(), StoreError>;
    /// Append a message to a session.
    fn append_message(&self, ticket: &str, message: &Message) -> Result<(), StoreError>;
    /// Rate the message at `index`, clearing the opposite flag.
    fn set_feedback(
        &self,
        ticket: &str,
        index: usize,
        liked: bool,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError>;
    /// Load a session with its full history.
    fn load_session(&self, ticket: &str) -> Result<Option<SessionRecord>, StoreError>;
    /// Sessions owned by a user, newest first.
    fn sessions_for_user(&self, email: &str) -> Result<Vec<SessionSummary>, StoreError>;
    /// Store a question nobody could answer.
    fn record_unanswered(&self, record: &UnansweredRecord) -> Result<(), StoreError>;
    /// All unanswered questions in insertion order.
    fn unanswered(&self) -> Result<Vec<UnansweredRecord>, StoreError>;
    /// Append a monitoring event.
    fn record_event(&self, event: &MonitorEvent) -> Result<(), StoreError>;
    /// All monitoring events in insertion order.
    fn events(&self) -> Result<Vec<MonitorEvent>, StoreError>;
}

/// Errors returned by chat stores.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("unsupported schema version: {0}")]
    UnsupportedSchema(u32),
    #[error("missing session metadata")]
    MissingMetadata,
    #[error("session already exists: {0}")]
    SessionExists(TicketId),
    #[error("unknown session: {0}")]
    UnknownSession(TicketId),
    #[error("message index {index} out of range for session {ticket}")]
    MessageIndex { ticket: TicketId, index: usize },
}

/// Internal JSONL event representation for a session rollout.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum RolloutEvent {
    SchemaVersion {
        version: u32,
    },
    SessionCreated {
        ticket: TicketId,
        email: String,
        #[serde(default)]
        request_type: String,
        created_at: DateTime<Utc>,
    },
    Message(Message),
    Feedback {
        index: usize,
        liked: bool,
        at: DateTime<Utc>,
    },
}

#[derive(Default)]
struct RolloutState {
    version: Option<u32>,
    email: Option<String>,
    request_type: String,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
    messages: Vec<Message>,
}

impl RolloutState {
    fn apply(&mut self, event: RolloutEvent) -> Result<(), StoreError> {
        match event {
            RolloutEvent::SchemaVersion { version } => {
                self.version = Some(version);
                if version > SCHEMA_VERSION {
                    return Err(StoreError::UnsupportedSchema(version));
                }
            }
            RolloutEvent::SessionCreated {
                email,
                request_type,
                created_at,
                ..
            } => {
                self.email = Some(email);
                self.request_type = request_type;
                self.created_at = Some(created_at);
                self.updated_at = Some(created_at);
            }
            RolloutEvent::Message(message) => {
                self.bump(message.timestamp);
                self.messages.push(message);
            }
            RolloutEvent::Feedback { index, liked, at } => match self.messages.get_mut(index) {
                Some(message) => {
                    message.apply_feedback(liked);
                    self.bump(at);
                }
                None => warn!("ignoring feedback for missing message (index={index})"),
            },
        }
        Ok(())
    }

    fn bump(&mut self, at: DateTime<Utc>) {
        if self.updated_at.is_none_or(|current| at > current) {
            self.updated_at = Some(at);
        }
    }

    fn finish(self, ticket: &str) -> Result<SessionRecord, StoreError> {
        let _ = self.version.ok_or(StoreError::MissingMetadata)?;
        let email = self.email.ok_or(StoreError::MissingMetadata)?;
        let started_at = self.created_at.ok_or(StoreError::MissingMetadata)?;
        Ok(SessionRecord {
            ticket: ticket.to_string(),
            email,
            request_type: self.request_type,
            started_at,
            updated_at: self.updated_at.unwrap_or(started_at),
            messages: self.messages,
        })
    }
}

/// Internal JSONL event representation for the user registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum UserEvent {
    Registered {
        email: String,
        name: String,
        at: DateTime<Utc>,
    },
    Seen {
        email: String,
        #[serde(default)]
        name: Option<String>,
        at: DateTime<Utc>,
    },
}

fn fold_users(events: Vec<UserEvent>) -> HashMap<String, User> {
    let mut users: HashMap<String, User> = HashMap::new();
    for event in events {
        match event {
            UserEvent::Registered { email, name, at } => {
                users.insert(
                    email.clone(),
                    User {
                        email,
                        name,
                        first_seen: at,
                        last_active: at,
                    },
                );
            }
            UserEvent::Seen { email, name, at } => match users.get_mut(&email) {
                Some(user) => {
                    user.last_active = at;
                    if let Some(name) = name {
                        user.name = name;
                    }
                }
                None => warn!("ignoring activity for unregistered user (email={email})"),
            },
        }
    }
    users
}

/// JSONL-backed chat store.
///
/// Layout: `sessions/<ticket>.jsonl` rollouts plus `users.jsonl`,
/// `unanswered.jsonl` and `monitor.jsonl` logs under the root.
pub struct JsonlChatStore {
    /// Root directory for all files.
    root: PathBuf,
    /// Serialize write access to every file.
    write_lock: Mutex<()>,
}

impl JsonlChatStore {
    /// Create a new JSONL store under the given root.
    pub fn new(root: impl AsRef<Path>) -> Result<Self, StoreError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(root.join("sessions"))?;
        info!("initialized JSONL chat store (root={})", root.display());
        Ok(Self {
            root,
            write_lock: Mutex::new(()),
        })
    }

    fn rollout_path(&self, ticket: &str) -> Option<PathBuf> {
        is_valid_ticket(ticket).then(|| self.root.join("sessions").join(format!("{ticket}.jsonl")))
    }

    fn users_path(&self) -> PathBuf {
        self.root.join("users.jsonl")
    }

    fn unanswered_path(&self) -> PathBuf {
        self.root.join("unanswered.jsonl")
    }

    fn monitor_path(&self) -> PathBuf {
        self.root.join("monitor.jsonl")
    }

    /// Append one JSON line; callers hold the write lock.
    fn append_line<T: Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        let line = serde_json::to_string(value)?;
        writeln!(file, "{line}")?;
        Ok(())
    }

    /// Read every JSON line of a file; a missing file is empty.
    fn read_lines<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, StoreError> {
        if !path.exists() {
            return Ok(Vec::new());
        }
        let file = OpenOptions::new().read(true).open(path)?;
        let reader = BufReader::new(file);
        let mut items = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            items.push(serde_json::from_str(&line)?);
        }
        Ok(items)
    }

    fn read_users(&self) -> Result<HashMap<String, User>, StoreError> {
        Ok(fold_users(Self::read_lines(&self.users_path())?))
    }

    /// Append an event to an existing rollout file.
    fn write_event(&self, ticket: &str, event: &RolloutEvent) -> Result<(), StoreError> {
        let path = self
            .rollout_path(ticket)
            .filter(|path| path.exists())
            .ok_or_else(|| StoreError::UnknownSession(ticket.to_string()))?;
        Self::append_line(&path, event)
    }

    /// Read and reconstruct a session from its rollout file.
    fn read_rollout(&self, ticket: &str) -> Result<Option<SessionRecord>, StoreError> {
        let Some(path) = self.rollout_path(ticket) else {
            debug!("rejecting malformed ticket (ticket={ticket})");
            return Ok(None);
        };
        if !path.exists() {
            return Ok(None);
        }
        let mut rollout = RolloutState::default();
        for event in Self::read_lines::<RolloutEvent>(&path)? {
            rollout.apply(event)?;
        }
        Ok(Some(rollout.finish(ticket)?))
    }
}

impl ChatStore for JsonlChatStore {
    fn upsert_user(&self, email: &str, name: &str, at: DateTime<Utc>) -> Result<User, StoreError> {
        let _guard = self.write_lock.lock();
        let users = self.read_users()?;
        let event = if users.contains_key(email) {
            UserEvent::Seen {
                email: email.to_string(),
                name: Some(name.to_string()),
                at,
            }
        } else {
            info!("registering user (email={email})");
            UserEvent::Registered {
                email: email.to_string(),
                name: name.to_string(),
                at,
            }
        };
        Self::append_line(&self.users_path(), &event)?;
        let mut users = users;
        let user = match users.remove(email) {
            Some(mut user) => {
                user.name = name.to_string();
                user.last_active = at;
                user
            }
            None => User {
                email: email.to_string(),
                name: name.to_string(),
                first_seen: at,
                last_active: at,
            },
        };
        Ok(user)
    }

    fn touch_user(&self, email: &str, at: DateTime<Utc>) -> Result<Option<User>, StoreError> {
        let _guard = self.write_lock.lock();
        let Some(mut user) = self.read_users()?.remove(email) else {
            return Ok(None);
        };
        Self::append_line(
            &self.users_path(),
            &UserEvent::Seen {
                email: email.to_string(),
                name: None,
                at,
            },
        )?;
        user.last_active = at;
        Ok(Some(user))
    }

    fn load_user(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self.read_users()?.remove(email))
    }

    fn create_session(
        &self,
        ticket: &str,
        email: &str,
        request_type: &str,
        started_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        info!("recording session creation (ticket={ticket}, email={email})");
        let path = self
            .rollout_path(ticket)
            .ok_or_else(|| StoreError::UnknownSession(ticket.to_string()))?;
        let _guard = self.write_lock.lock();
        if path.exists() {
            return Err(StoreError::SessionExists(ticket.to_string()));
        }
        let mut file = OpenOptions::new()
            .create_new(true)
            .write(true)
            .open(&path)?;
        let header = serde_json::to_string(&RolloutEvent::SchemaVersion {
            version: SCHEMA_VERSION,
        })?;
        writeln!(file, "{header}")?;
        let created = serde_json::to_string(&RolloutEvent::SessionCreated {
            ticket: ticket.to_string(),
            email: email.to_string(),
            request_type: request_type.to_string(),
            created_at: started_at,
        })?;
        writeln!(file, "{created}")?;
        Ok(())
    }

    fn append_message(&self, ticket: &str, message: &Message) -> Result<(), StoreError> {
        debug!(
            "appending message event (ticket={}, provenance={}, answer_len={})",
            ticket,
            message.provenance,
            message.answer.len()
        );
        let _guard = self.write_lock.lock();
        self.write_event(ticket, &RolloutEvent::Message(message.clone()))
    }

    fn set_feedback(
        &self,
        ticket: &str,
        index: usize,
        liked: bool,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock();
        let record = self
            .read_rollout(ticket)?
            .ok_or_else(|| StoreError::UnknownSession(ticket.to_string()))?;
        if index >= record.messages.len() {
            return Err(StoreError::MessageIndex {
                ticket: ticket.to_string(),
                index,
            });
        }
        debug!("appending feedback event (ticket={ticket}, index={index}, liked={liked})");
        self.write_event(ticket, &RolloutEvent::Feedback { index, liked, at })
    }

    fn load_session(&self, ticket: &str) -> Result<Option<SessionRecord>, StoreError> {
        self.read_rollout(ticket)
    }

    fn sessions_for_user(&self, email: &str) -> Result<Vec<SessionSummary>, StoreError> {
        let mut summaries = Vec::new();
        for entry in fs::read_dir(self.root.join("sessions"))? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("jsonl") {
                continue;
            }
            let Some(ticket) = path.file_stem().and_then(|stem| stem.to_str()) else {
                continue;
            };
            match self.read_rollout(ticket) {
                Ok(Some(record)) if record.email == email => {
                    summaries.push(SessionSummary::from(&record));
                }
                Ok(_) => {}
                Err(err) => warn!("skipping unreadable rollout (ticket={ticket}, err={err})"),
            }
        }
        summaries.sort_by(|a, b| {
            b.started_at
                .cmp(&a.started_at)
                .then_with(|| b.ticket.cmp(&a.ticket))
        });
        Ok(summaries)
    }

    fn record_unanswered(&self, record: &UnansweredRecord) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock();
        Self::append_line(&self.unanswered_path(), record)
    }

    fn unanswered(&self) -> Result<Vec<UnansweredRecord>, StoreError> {
        Self::read_lines(&self.unanswered_path())
    }

    fn record_event(&self, event: &MonitorEvent) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock();
        Self::append_line(&self.monitor_path(), event)
    }

    fn events(&self) -> Result<Vec<MonitorEvent>, StoreError> {
        Self::read_lines(&self.monitor_path())
    }
}

#[derive(Default)]
struct MemoryState {
    users: HashMap<String, User>,
    sessions: HashMap<TicketId, SessionRecord>,
    unanswered: Vec<UnansweredRecord>,
    events: Vec<MonitorEvent>,
}

/// In-memory chat store for tests and ephemeral deployments.
#[derive(Default)]
pub struct InMemoryChatStore {
    state: RwLock<MemoryState>,
}

impl InMemoryChatStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ChatStore for InMemoryChatStore {
    fn upsert_user(&self, email: &str, name: &str, at: DateTime<Utc>) -> Result<User, StoreError> {
        let mut state = self.state.write();
        let user = state
            .users
            .entry(email.to_string())
            .and_modify(|user| {
                user.name = name.to_string();
                user.last_active = at;
            })
            .or_insert_with(|| User {
                email: email.to_string(),
                name: name.to_string(),
                first_seen: at,
                last_active: at,
            });
        Ok(user.clone())
    }

    fn touch_user(&self, email: &str, at: DateTime<Utc>) -> Result<Option<User>, StoreError> {
        let mut state = self.state.write();
        Ok(state.users.get_mut(email).map(|user| {
            user.last_active = at;
            user.clone()
        }))
    }

    fn load_user(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self.state.read().users.get(email).cloned())
    }

    fn create_session(
        &self,
        ticket: &str,
        email: &str,
        request_type: &str,
        started_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut state = self.state.write();
        if state.sessions.contains_key(ticket) {
            return Err(StoreError::SessionExists(ticket.to_string()));
        }
        state.sessions.insert(
            ticket.to_string(),
            SessionRecord {
                ticket: ticket.to_string(),
                email: email.to_string(),
                request_type: request_type.to_string(),
                started_at,
                updated_at: started_at,
                messages: Vec::new(),
            },
        );
        Ok(())
    }

    fn append_message(&self, ticket: &str, message: &Message) -> Result<(), StoreError> {
        let mut state = self.state.write();
        let session = state
            .sessions
            .get_mut(ticket)
            .ok_or_else(|| StoreError::UnknownSession(ticket.to_string()))?;
        session.updated_at = session.updated_at.max(message.timestamp);
        session.messages.push(message.clone());
        Ok(())
    }

    fn set_feedback(
        &self,
        ticket: &str,
        index: usize,
        liked: bool,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut state = self.state.write();
        let session = state
            .sessions
            .get_mut(ticket)
            .ok_or_else(|| StoreError::UnknownSession(ticket.to_string()))?;
        let message = session
            .messages
            .get_mut(index)
            .ok_or_else(|| StoreError::MessageIndex {
                ticket: ticket.to_string(),
                index,
            })?;
        message.apply_feedback(liked);
        session.updated_at = session.updated_at.max(at);
        Ok(())
    }

    fn load_session(&self, ticket: &str) -> Result<Option<SessionRecord>, StoreError> {
        Ok(self.state.read().sessions.get(ticket).cloned())
    }

    fn sessions_for_user(&self, email: &str) -> Result<Vec<SessionSummary>, StoreError> {
        let mut summaries: Vec<SessionSummary> = self
            .state
            .read()
            .sessions
            .values()
            .filter(|record| record.email == email)
            .map(SessionSummary::from)
            .collect();
        summaries.sort_by(|a, b| {
            b.started_at
                .cmp(&a.started_at)
                .then_with(|| b.ticket.cmp(&a.ticket))
        });
        Ok(summaries)
    }

    fn record_unanswered(&self, record: &UnansweredRecord) -> Result<(), StoreError> {
        self.state.write().unanswered.push(record.clone());
        Ok(())
    }

    fn unanswered(&self) -> Result<Vec<UnansweredRecord>, StoreError> {
        Ok(self.state.read().unanswered.clone())
    }

    fn record_event(&self, event: &MonitorEvent) -> Result<(), StoreError> {
        self.state.write().events.push(event.clone());
        Ok(())
    }

    fn events(&self) -> Result<Vec<MonitorEvent>, StoreError> {
        Ok(self.state.read().events.clone())
    }
}
