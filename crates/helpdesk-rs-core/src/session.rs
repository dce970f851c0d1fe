//! Helpdesk service and the per-conversation session state machine.

use crate::classify::{ClassificationAdapter, KeywordClassifier};
use crate::engine::AnswerEngine;
use crate::error::HelpdeskError;
use crate::escalation::{Escalation, EscalationOutcome};
use crate::monitoring::{MonitorEvent, MonitoringReport};
use crate::notifiers::notifier_from_config;
use crate::state::{ChatStore, InMemoryChatStore, JsonlChatStore};
use crate::types::{
    Message, Requester, SessionSummary, Submission, UnansweredRecord, User, is_valid_ticket,
    new_ticket_id,
};
use chrono::Utc;
use helpdesk_rs_config::HelpdeskConfig;
use helpdesk_rs_knowledge::{
    FileKnowledgeBase, InMemoryKnowledgeBase, KnowledgeBase, KnowledgeSources,
};
use helpdesk_rs_protocol::{Classifier, Generator, Notifier, TicketId};
use log::{debug, info, warn};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

/// Request type used when none is given.
const DEFAULT_REQUEST_TYPE: &str = "General";
/// Intent tag whose responses greet a new session.
const GREETING_TAG: &str = "greeting";

/// Conversation state owned by the caller and passed to every operation.
#[derive(Default)]
pub struct SessionContext {
    state: SessionState,
    lease: Option<SessionLease>,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, SessionState::Active(_))
    }

    pub fn active(&self) -> Option<&ActiveSession> {
        match &self.state {
            SessionState::Active(session) => Some(session),
            SessionState::Unauthenticated => None,
        }
    }

    fn active_mut(&mut self) -> Result<&mut ActiveSession, HelpdeskError> {
        match &mut self.state {
            SessionState::Active(session) => Ok(session),
            SessionState::Unauthenticated => Err(HelpdeskError::NotActive),
        }
    }

    /// Ticket of the active session.
    pub fn ticket(&self) -> Option<&str> {
        self.active().map(|session| session.ticket.as_str())
    }

    /// History of the active session; empty when unauthenticated.
    pub fn messages(&self) -> &[Message] {
        self.active()
            .map(|session| session.messages.as_slice())
            .unwrap_or_default()
    }

    fn enter(&mut self, session: ActiveSession, lease: Option<SessionLease>) {
        if let Some(lease) = lease {
            self.lease = Some(lease);
        }
        self.state = SessionState::Active(session);
    }
}

/// States of a conversation.
#[derive(Debug, Default)]
pub enum SessionState {
    #[default]
    Unauthenticated,
    Active(ActiveSession),
}

/// Identified user bound to one ticket.
#[derive(Debug, Clone)]
pub struct ActiveSession {
    pub user: User,
    pub ticket: TicketId,
    pub request_type: String,
    pub messages: Vec<Message>,
    greeted: bool,
}

impl ActiveSession {
    fn requester(&self) -> Requester {
        Requester {
            email: self.user.email.clone(),
            name: self.user.name.clone(),
            request_type: self.request_type.clone(),
        }
    }
}

/// Exclusive claim on a ticket; released on drop.
struct SessionLease {
    ticket: TicketId,
    leases: Arc<Mutex<HashSet<TicketId>>>,
}

impl Drop for SessionLease {
    fn drop(&mut self) {
        self.leases.lock().remove(&self.ticket);
        debug!("released session lease (ticket={})", self.ticket);
    }
}

/// Answer to a posted submission.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    /// Position of the message in the session history.
    pub index: usize,
    pub message: Message,
    /// True when the submission had already been processed.
    pub replayed: bool,
    /// Escalation problems that did not stop the answer.
    pub warnings: Vec<String>,
}

/// Shared helpdesk service. One instance serves every conversation.
pub struct Helpdesk {
    config: HelpdeskConfig,
    engine: AnswerEngine,
    classifier: ClassificationAdapter,
    escalation: Arc<Escalation>,
    store: Arc<dyn ChatStore>,
    leases: Arc<Mutex<HashSet<TicketId>>>,
}

impl Helpdesk {
    pub fn builder(config: HelpdeskConfig) -> HelpdeskBuilder {
        HelpdeskBuilder::new(config)
    }

    pub fn config(&self) -> &HelpdeskConfig {
        &self.config
    }

    pub fn store(&self) -> Arc<dyn ChatStore> {
        self.store.clone()
    }

    /// Create or refresh the user and start a new session.
    pub fn register_or_login(
        &self,
        ctx: &mut SessionContext,
        email: &str,
        name: &str,
        request_type: &str,
    ) -> Result<TicketId, HelpdeskError> {
        let email = normalize_email(email)?;
        let name = match name.trim() {
            "" => email.split('@').next().unwrap_or_default().to_string(),
            name => name.to_string(),
        };
        let user = self.store.upsert_user(&email, &name, Utc::now())?;
        self.start_session(ctx, user, request_type)
    }

    /// Load an existing session and its history without creating a new one.
    ///
    /// Only reads the owner; last activity moves when a message is posted.
    pub fn resume_by_ticket(
        &self,
        ctx: &mut SessionContext,
        ticket: &str,
    ) -> Result<(), HelpdeskError> {
        let ticket = ticket.trim();
        if !is_valid_ticket(ticket) {
            return Err(HelpdeskError::InvalidTicket(ticket.to_string()));
        }
        let record = self
            .store
            .load_session(ticket)?
            .ok_or_else(|| HelpdeskError::InvalidTicket(ticket.to_string()))?;
        let lease = self.acquire(ctx, ticket)?;
        let user = match self.store.load_user(&record.email)? {
            Some(user) => user,
            None => {
                warn!(
                    "session owner not registered, synthesizing user (ticket={}, email={})",
                    ticket, record.email
                );
                User {
                    email: record.email.clone(),
                    name: record.email.split('@').next().unwrap_or_default().to_string(),
                    first_seen: record.started_at,
                    last_active: record.updated_at,
                }
            }
        };
        info!(
            "resumed session (ticket={}, email={}, messages={})",
            ticket,
            user.email,
            record.messages.len()
        );
        let greeted = !record.messages.is_empty();
        ctx.enter(
            ActiveSession {
                user,
                ticket: record.ticket,
                request_type: record.request_type,
                messages: record.messages,
                greeted,
            },
            lease,
        );
        Ok(())
    }

    /// Resume one of the user's sessions chosen by `select`, or start a new one when
    /// `select` returns `None`.
    pub fn resume_by_email<F>(
        &self,
        ctx: &mut SessionContext,
        email: &str,
        request_type: &str,
        select: F,
    ) -> Result<TicketId, HelpdeskError>
    where
        F: FnOnce(&[SessionSummary]) -> Option<TicketId>,
    {
        let email = normalize_email(email)?;
        let user = self
            .store
            .touch_user(&email, Utc::now())?
            .ok_or_else(|| HelpdeskError::UnknownUser(email.clone()))?;
        let sessions = self.store.sessions_for_user(&email)?;
        debug!(
            "listing sessions for user (email={}, count={})",
            email,
            sessions.len()
        );
        match select(&sessions) {
            Some(ticket) => {
                if !sessions.iter().any(|summary| summary.ticket == ticket) {
                    return Err(HelpdeskError::InvalidTicket(ticket));
                }
                self.resume_by_ticket(ctx, &ticket)?;
                Ok(ticket)
            }
            None => self.start_session(ctx, user, request_type),
        }
    }

    /// Answer one submission and persist the exchange.
    pub async fn post_message(
        &self,
        ctx: &mut SessionContext,
        submission: Submission,
    ) -> Result<Reply, HelpdeskError> {
        let session = ctx.active_mut()?;
        if let Some((index, message)) = session
            .messages
            .iter()
            .enumerate()
            .find(|(_, message)| message.submission_id == Some(submission.id))
        {
            debug!(
                "replaying processed submission (ticket={}, submission_id={})",
                session.ticket, submission.id
            );
            return Ok(Reply {
                index,
                message: message.clone(),
                replayed: true,
                warnings: Vec::new(),
            });
        }
        let question = submission.text.trim();
        if question.is_empty() {
            return Err(HelpdeskError::InvalidInput("message is empty".to_string()));
        }

        let started = Instant::now();
        let requester = session.requester();
        let resolution = self.engine.resolve(question, &requester).await;
        let classification = self.classifier.classify(&submission.text);
        let warnings = resolution.warnings;
        let message = Message {
            submission_id: Some(submission.id),
            question: question.to_string(),
            answer: resolution.answer,
            timestamp: Utc::now(),
            provenance: resolution.provenance,
            confidence: resolution.confidence,
            sentiment: classification.sentiment,
            priority: classification.priority,
            thumbs_up: false,
            thumbs_down: false,
        };
        self.store.append_message(&session.ticket, &message)?;
        session.messages.push(message.clone());
        match self.store.touch_user(&session.user.email, message.timestamp) {
            Ok(Some(user)) => session.user.last_active = user.last_active,
            Ok(None) => debug!("message from unregistered user (email={})", session.user.email),
            Err(err) => warn!(
                "failed to refresh last activity (email={}, err={err})",
                session.user.email
            ),
        }
        let index = session.messages.len() - 1;
        let response_time_ms = started.elapsed().as_millis() as u64;
        info!(
            "answered message (ticket={}, provenance={}, response_time_ms={})",
            session.ticket, message.provenance, response_time_ms
        );

        self.record_event(&MonitorEvent::Interaction {
            user: requester.email,
            ticket: session.ticket.clone(),
            question: message.question.clone(),
            answer: message.answer.clone(),
            provenance: message.provenance.clone(),
            sentiment: message.sentiment,
            priority: message.priority,
            fallback: message.provenance.is_fallback(),
            response_time_ms,
            model_version: self.engine.model_version(),
            timestamp: message.timestamp,
        });
        Ok(Reply {
            index,
            message,
            replayed: false,
            warnings,
        })
    }

    /// Rate the message at `index`; dislikes are escalated to the operator.
    pub async fn set_feedback(
        &self,
        ctx: &mut SessionContext,
        index: usize,
        liked: bool,
    ) -> Result<EscalationOutcome, HelpdeskError> {
        let session = ctx.active_mut()?;
        let len = session.messages.len();
        if index >= len {
            return Err(HelpdeskError::InvalidMessageIndex { index, len });
        }
        let now = Utc::now();
        self.store.set_feedback(&session.ticket, index, liked, now)?;
        let message = &mut session.messages[index];
        message.apply_feedback(liked);
        info!(
            "recorded feedback (ticket={}, index={}, liked={})",
            session.ticket, index, liked
        );
        self.record_event(&MonitorEvent::Feedback {
            user: session.user.email.clone(),
            ticket: session.ticket.clone(),
            index,
            liked,
            timestamp: now,
        });

        if !self.escalation.escalates_feedback(liked) {
            return Ok(EscalationOutcome::default());
        }
        let (question, answer) = (message.question.clone(), message.answer.clone());
        let requester = session.requester();
        Ok(self
            .escalation
            .record_feedback(&requester, &question, &answer, liked)
            .await)
    }

    /// Leave the active session; the stored record is kept.
    pub fn close(&self, ctx: &mut SessionContext) {
        if let Some(ticket) = ctx.ticket() {
            info!("closing session (ticket={ticket})");
        }
        *ctx = SessionContext::default();
    }

    /// Greeting for a freshly started session, returned once.
    pub fn greeting(&self, ctx: &mut SessionContext) -> Option<String> {
        let session = ctx.active_mut().ok()?;
        if session.greeted {
            return None;
        }
        session.greeted = true;
        Some(
            self.engine
                .sources()
                .tagged_response(GREETING_TAG)
                .unwrap_or_else(|| self.config.assistant.greeting.clone()),
        )
    }

    /// Sessions owned by a user, newest first.
    pub fn sessions_for(&self, email: &str) -> Result<Vec<SessionSummary>, HelpdeskError> {
        let email = normalize_email(email)?;
        Ok(self.store.sessions_for_user(&email)?)
    }

    /// Questions waiting for an operator.
    pub fn unanswered(&self) -> Result<Vec<UnansweredRecord>, HelpdeskError> {
        Ok(self.store.unanswered()?)
    }

    /// Aggregate report over every stored monitoring event.
    pub fn monitoring_report(&self) -> Result<MonitoringReport, HelpdeskError> {
        let events = self.store.events()?;
        Ok(MonitoringReport::from_events(&events))
    }

    fn start_session(
        &self,
        ctx: &mut SessionContext,
        user: User,
        request_type: &str,
    ) -> Result<TicketId, HelpdeskError> {
        let request_type = match request_type.trim() {
            "" => DEFAULT_REQUEST_TYPE.to_string(),
            request_type => request_type.to_string(),
        };
        let now = Utc::now();
        let ticket = new_ticket_id(now);
        self.store
            .create_session(&ticket, &user.email, &request_type, now)?;
        let lease = self.acquire(ctx, &ticket)?;
        info!(
            "started session (ticket={}, email={}, request_type={})",
            ticket, user.email, request_type
        );
        ctx.enter(
            ActiveSession {
                user,
                ticket: ticket.clone(),
                request_type,
                messages: Vec::new(),
                greeted: false,
            },
            lease,
        );
        Ok(ticket)
    }

    /// Claim `ticket` for `ctx`; `None` when the context already holds it.
    fn acquire(
        &self,
        ctx: &SessionContext,
        ticket: &str,
    ) -> Result<Option<SessionLease>, HelpdeskError> {
        if ctx
            .lease
            .as_ref()
            .is_some_and(|lease| lease.ticket == ticket)
        {
            return Ok(None);
        }
        if !self.leases.lock().insert(ticket.to_string()) {
            warn!("session already leased (ticket={ticket})");
            return Err(HelpdeskError::SessionBusy(ticket.to_string()));
        }
        Ok(Some(SessionLease {
            ticket: ticket.to_string(),
            leases: self.leases.clone(),
        }))
    }

    fn record_event(&self, event: &MonitorEvent) {
        if let Err(err) = self.store.record_event(event) {
            warn!("failed to record monitoring event (err={err})");
        }
    }
}

fn normalize_email(email: &str) -> Result<String, HelpdeskError> {
    let email = email.trim().to_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(email),
        _ => Err(HelpdeskError::InvalidInput(format!(
            "invalid email address: {email}"
        ))),
    }
}

/// Default data directory for stores and the outbox.
pub fn default_data_root() -> PathBuf {
    directories::ProjectDirs::from("", "", "helpdesk")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from(".helpdesk"))
}

/// Wires a [`Helpdesk`] from config, with optional component overrides.
pub struct HelpdeskBuilder {
    config: HelpdeskConfig,
    data_root: Option<PathBuf>,
    knowledge: Option<Arc<dyn KnowledgeBase>>,
    store: Option<Arc<dyn ChatStore>>,
    generator: Option<Arc<dyn Generator>>,
    classifier: Option<Arc<dyn Classifier>>,
    notifier: Option<Arc<dyn Notifier>>,
}

impl HelpdeskBuilder {
    pub fn new(config: HelpdeskConfig) -> Self {
        Self {
            config,
            data_root: None,
            knowledge: None,
            store: None,
            generator: None,
            classifier: None,
            notifier: None,
        }
    }

    /// Directory for default stores; overrides `storage.path`.
    pub fn data_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.data_root = Some(root.into());
        self
    }

    pub fn knowledge(mut self, knowledge: Arc<dyn KnowledgeBase>) -> Self {
        self.knowledge = Some(knowledge);
        self
    }

    pub fn store(mut self, store: Arc<dyn ChatStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn generator(mut self, generator: Arc<dyn Generator>) -> Self {
        self.generator = Some(generator);
        self
    }

    pub fn classifier(mut self, classifier: Arc<dyn Classifier>) -> Self {
        self.classifier = Some(classifier);
        self
    }

    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn build(self) -> Result<Helpdesk, HelpdeskError> {
        let config = self.config;
        let data_root = self
            .data_root
            .or_else(|| config.storage.path.as_ref().map(PathBuf::from))
            .unwrap_or_else(default_data_root);

        let store: Arc<dyn ChatStore> = match self.store {
            Some(store) => store,
            None if config.storage.provider == "memory" => Arc::new(InMemoryChatStore::new()),
            None => Arc::new(JsonlChatStore::new(&data_root)?),
        };
        let knowledge: Arc<dyn KnowledgeBase> = match self.knowledge {
            Some(knowledge) => knowledge,
            None if config.knowledge.provider == "memory" => Arc::new(InMemoryKnowledgeBase::new()),
            None => {
                let root = config
                    .knowledge
                    .path
                    .as_ref()
                    .map(PathBuf::from)
                    .unwrap_or_else(|| data_root.join("knowledge"));
                Arc::new(FileKnowledgeBase::new(root))
            }
        };
        let notifier = match self.notifier {
            Some(notifier) => notifier,
            None => notifier_from_config(&config.escalation, &data_root)
                .map_err(|err| HelpdeskError::Build(err.to_string()))?,
        };
        let classifier = self
            .classifier
            .unwrap_or_else(|| Arc::new(KeywordClassifier::new()));
        if self.generator.is_none() && config.generation.enabled {
            info!("no generator configured, generative fallback disabled");
        }

        let escalation = Arc::new(Escalation::new(
            store.clone(),
            notifier,
            config.escalation.clone(),
        ));
        let sources = Arc::new(KnowledgeSources::from_config(
            knowledge,
            &config.resolution,
        ));
        let engine = AnswerEngine::new(
            sources,
            self.generator,
            escalation.clone(),
            store.clone(),
            config.assistant.clone(),
            config.resolution.clone(),
            config.generation.clone(),
        );
        info!(
            "built helpdesk (storage={}, knowledge={}, data_root={})",
            config.storage.provider,
            config.knowledge.provider,
            data_root.display()
        );
        Ok(Helpdesk {
            engine,
            classifier: ClassificationAdapter::new(classifier),
            escalation,
            store,
            leases: Arc::new(Mutex::new(HashSet::new())),
            config,
        })
    }
}
