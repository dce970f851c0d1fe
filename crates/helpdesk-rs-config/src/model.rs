//! Configuration schema for the helpdesk.

use serde::{Deserialize, Serialize};

/// Root config for the helpdesk SDK and binary.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct HelpdeskConfig {
    #[serde(default, rename = "$schema")]
    pub schema: Option<String>,
    #[serde(default)]
    pub assistant: AssistantConfig,
    #[serde(default)]
    pub resolution: ResolutionConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub knowledge: KnowledgeConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub escalation: EscalationConfig,
}

impl HelpdeskConfig {
    /// Start building a config programmatically with defaults applied.
    pub fn builder() -> HelpdeskConfigBuilder {
        HelpdeskConfigBuilder::new()
    }
}

/// Builder for assembling a `HelpdeskConfig` in code.
#[derive(Debug, Default, Clone)]
pub struct HelpdeskConfigBuilder {
    config: HelpdeskConfig,
}

impl HelpdeskConfigBuilder {
    /// Create a new builder seeded with default config values.
    pub fn new() -> Self {
        Self {
            config: HelpdeskConfig::default(),
        }
    }

    /// Replace the assistant persona and canned replies.
    pub fn assistant(mut self, assistant: AssistantConfig) -> Self {
        self.config.assistant = assistant;
        self
    }

    /// Replace the resolution policy.
    pub fn resolution(mut self, resolution: ResolutionConfig) -> Self {
        self.config.resolution = resolution;
        self
    }

    /// Replace the generative fallback configuration.
    pub fn generation(mut self, generation: GenerationConfig) -> Self {
        self.config.generation = generation;
        self
    }

    /// Replace the knowledge source configuration.
    pub fn knowledge(mut self, knowledge: KnowledgeConfig) -> Self {
        self.config.knowledge = knowledge;
        self
    }

    /// Replace the chat storage configuration.
    pub fn storage(mut self, storage: StorageConfig) -> Self {
        self.config.storage = storage;
        self
    }

    /// Replace the escalation configuration.
    pub fn escalation(mut self, escalation: EscalationConfig) -> Self {
        self.config.escalation = escalation;
        self
    }

    /// Finalize and return the built `HelpdeskConfig`.
    pub fn build(self) -> HelpdeskConfig {
        self.config
    }
}

/// Persona and canned replies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantConfig {
    #[serde(default = "default_assistant_name")]
    pub name: String,
    #[serde(default = "default_organization")]
    pub organization: String,
    #[serde(default = "default_greeting")]
    pub greeting: String,
    #[serde(default = "default_fallback_message")]
    pub fallback_message: String,
    /// Apology shown when the generative backend fails. `{error}` is replaced by
    /// the failure description.
    #[serde(default = "default_ai_error_message")]
    pub ai_error_message: String,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            name: default_assistant_name(),
            organization: default_organization(),
            greeting: default_greeting(),
            fallback_message: default_fallback_message(),
            ai_error_message: default_ai_error_message(),
        }
    }
}

fn default_assistant_name() -> String {
    "Helpdesk".to_string()
}

fn default_organization() -> String {
    "TechFix Solutions".to_string()
}

/// Greeting used when the knowledge base has no `greeting` intent.
fn default_greeting() -> String {
    "Hello! 👋 How can I assist you today?".to_string()
}

/// Apology used when nothing answered and no `fallback` intent exists.
fn default_fallback_message() -> String {
    "I don't understand that.".to_string()
}

fn default_ai_error_message() -> String {
    "Sorry, there was an error with the AI: {error}".to_string()
}

/// Structured source consulted by the resolution pipeline.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum AnswerSource {
    Intent,
    Faq,
    Knowledge,
}

/// String similarity metric used for intent matching.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SimilarityMetric {
    /// Ratcliff/Obershelp matching-blocks ratio.
    #[default]
    Gestalt,
    Levenshtein,
    JaroWinkler,
}

/// Ordering and matching thresholds for structured sources.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolutionConfig {
    #[serde(default = "default_resolution_order")]
    pub order: Vec<AnswerSource>,
    #[serde(default = "default_intent_threshold")]
    pub intent_threshold: f64,
    #[serde(default)]
    pub metric: SimilarityMetric,
    #[serde(default = "default_faq_min_chars")]
    pub faq_min_chars: usize,
    #[serde(default = "default_knowledge_min_chars")]
    pub knowledge_min_chars: usize,
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for ResolutionConfig {
    fn default() -> Self {
        Self {
            order: default_resolution_order(),
            intent_threshold: default_intent_threshold(),
            metric: SimilarityMetric::default(),
            faq_min_chars: default_faq_min_chars(),
            knowledge_min_chars: default_knowledge_min_chars(),
            seed: None,
        }
    }
}

fn default_resolution_order() -> Vec<AnswerSource> {
    vec![
        AnswerSource::Intent,
        AnswerSource::Faq,
        AnswerSource::Knowledge,
    ]
}

/// Intent patterns must score strictly above this.
fn default_intent_threshold() -> f64 {
    0.85
}

fn default_faq_min_chars() -> usize {
    2
}

fn default_knowledge_min_chars() -> usize {
    4
}

/// Generative fallback settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    #[serde(default = "default_generation_enabled")]
    pub enabled: bool,
    #[serde(default = "default_generation_provider")]
    pub provider: String,
    #[serde(default = "default_generation_model")]
    pub model: String,
    #[serde(default = "default_generation_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_faq_context_limit")]
    pub faq_context_limit: usize,
    #[serde(default = "default_intent_context_limit")]
    pub intent_context_limit: usize,
    #[serde(default = "default_knowledge_context_limit")]
    pub knowledge_context_limit: usize,
    #[serde(default)]
    pub instruction: Option<String>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            enabled: default_generation_enabled(),
            provider: default_generation_provider(),
            model: default_generation_model(),
            timeout_secs: default_generation_timeout_secs(),
            faq_context_limit: default_faq_context_limit(),
            intent_context_limit: default_intent_context_limit(),
            knowledge_context_limit: default_knowledge_context_limit(),
            instruction: None,
        }
    }
}

fn default_generation_enabled() -> bool {
    true
}

fn default_generation_provider() -> String {
    "openai".to_string()
}

fn default_generation_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_generation_timeout_secs() -> u64 {
    30
}

fn default_faq_context_limit() -> usize {
    10
}

fn default_intent_context_limit() -> usize {
    5
}

fn default_knowledge_context_limit() -> usize {
    5
}

/// Knowledge backend settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeConfig {
    #[serde(default = "default_knowledge_provider")]
    pub provider: String,
    #[serde(default)]
    pub path: Option<String>,
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            provider: default_knowledge_provider(),
            path: None,
        }
    }
}

/// Default knowledge provider identifier.
fn default_knowledge_provider() -> String {
    "file".to_string()
}

/// Chat storage settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_storage_provider")]
    pub provider: String,
    #[serde(default)]
    pub path: Option<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            provider: default_storage_provider(),
            path: None,
        }
    }
}

/// Default storage provider identifier.
fn default_storage_provider() -> String {
    "jsonl".to_string()
}

/// Operator notification channel.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum NotifierKind {
    #[default]
    Log,
    Outbox,
    Webhook,
}

/// Unanswered and feedback escalation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EscalationConfig {
    #[serde(default = "default_escalation_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub notifier: NotifierKind,
    #[serde(default = "default_recipient")]
    pub recipient: String,
    #[serde(default)]
    pub notify_on_like: bool,
    #[serde(default)]
    pub outbox_path: Option<String>,
    #[serde(default)]
    pub webhook_url: Option<String>,
    #[serde(default = "default_webhook_timeout_secs")]
    pub webhook_timeout_secs: u64,
}

impl Default for EscalationConfig {
    fn default() -> Self {
        Self {
            enabled: default_escalation_enabled(),
            notifier: NotifierKind::default(),
            recipient: default_recipient(),
            notify_on_like: false,
            outbox_path: None,
            webhook_url: None,
            webhook_timeout_secs: default_webhook_timeout_secs(),
        }
    }
}

fn default_escalation_enabled() -> bool {
    true
}

fn default_recipient() -> String {
    "support@localhost".to_string()
}

fn default_webhook_timeout_secs() -> u64 {
    10
}
