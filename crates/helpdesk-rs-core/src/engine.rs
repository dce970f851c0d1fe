//! Answer resolution: structured sources, generative fallback, canned fallback.

use crate::escalation::Escalation;
use crate::monitoring::MonitorEvent;
use crate::prompt::PromptBuilder;
use crate::state::ChatStore;
use crate::types::Requester;
use chrono::Utc;
use helpdesk_rs_config::{AnswerSource, AssistantConfig, GenerationConfig, ResolutionConfig};
use helpdesk_rs_knowledge::KnowledgeSources;
use helpdesk_rs_protocol::{GenerateError, Generator, Provenance};
use log::{debug, info, warn};
use std::sync::Arc;
use std::time::Duration;

/// Confidence assigned to FAQ answers.
const FAQ_CONFIDENCE: f64 = 1.0;
/// Confidence assigned to knowledge article answers.
const KNOWLEDGE_CONFIDENCE: f64 = 0.6;
/// Confidence assigned to generated answers.
const AI_CONFIDENCE: f64 = 0.5;
/// Intent tag whose responses replace the configured fallback message.
const FALLBACK_TAG: &str = "fallback";
/// Placeholder for the failure description in the AI apology template.
const ERROR_PLACEHOLDER: &str = "{error}";

/// Outcome of resolving one utterance.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub answer: String,
    pub provenance: Provenance,
    pub confidence: f64,
    /// True when nothing could answer and the question was escalated.
    pub unresolved: bool,
    /// Upstream failure that forced the fallback, if any.
    pub error: Option<String>,
    /// Non-fatal escalation problems, such as an undelivered notification.
    pub warnings: Vec<String>,
}

impl Resolution {
    fn answered(answer: String, provenance: Provenance, confidence: f64) -> Self {
        Self {
            answer,
            provenance,
            confidence,
            unresolved: false,
            error: None,
            warnings: Vec::new(),
        }
    }
}

/// Resolves user input into exactly one answer.
pub struct AnswerEngine {
    sources: Arc<KnowledgeSources>,
    generator: Option<Arc<dyn Generator>>,
    escalation: Arc<Escalation>,
    store: Arc<dyn ChatStore>,
    prompts: PromptBuilder,
    assistant: AssistantConfig,
    resolution: ResolutionConfig,
    generation: GenerationConfig,
}

impl AnswerEngine {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        sources: Arc<KnowledgeSources>,
        generator: Option<Arc<dyn Generator>>,
        escalation: Arc<Escalation>,
        store: Arc<dyn ChatStore>,
        assistant: AssistantConfig,
        resolution: ResolutionConfig,
        generation: GenerationConfig,
    ) -> Self {
        let prompts = PromptBuilder::new(&assistant, &generation);
        Self {
            sources,
            generator,
            escalation,
            store,
            prompts,
            assistant,
            resolution,
            generation,
        }
    }

    pub fn sources(&self) -> &KnowledgeSources {
        &self.sources
    }

    /// Model recorded for interactions; `none` when generation is unavailable.
    pub fn model_version(&self) -> String {
        match (&self.generator, self.generation.enabled) {
            (Some(generator), true) => generator.model_version(),
            _ => "none".to_string(),
        }
    }

    /// Resolve one utterance. Upstream failures end in the fallback answer.
    pub async fn resolve(&self, input: &str, requester: &Requester) -> Resolution {
        if let Some(resolution) = self.lookup_structured(input) {
            return resolution;
        }
        let error = match self.generate(input).await {
            Ok(answer) => {
                info!(
                    "answered with generated text (email={}, answer_len={})",
                    requester.email,
                    answer.len()
                );
                return Resolution::answered(answer, Provenance::Ai, AI_CONFIDENCE);
            }
            Err(err) => err,
        };
        if let Some(err) = &error {
            warn!(
                "generation failed, using fallback (email={}, err={})",
                requester.email, err
            );
            let event = MonitorEvent::Error {
                user: requester.email.clone(),
                error_kind: "generation".to_string(),
                message: err.to_string(),
                timestamp: Utc::now(),
            };
            if let Err(store_err) = self.store.record_event(&event) {
                warn!("failed to record error event (err={store_err})");
            }
        }
        self.fallback(input, requester, error).await
    }

    fn lookup_structured(&self, input: &str) -> Option<Resolution> {
        for source in &self.resolution.order {
            let resolution = match source {
                AnswerSource::Intent => self.sources.lookup_intent(input).map(|matched| {
                    Resolution::answered(
                        matched.answer,
                        Provenance::Intent(matched.tag),
                        matched.score,
                    )
                }),
                AnswerSource::Faq => self
                    .sources
                    .lookup_faq(input)
                    .map(|answer| Resolution::answered(answer, Provenance::Faq, FAQ_CONFIDENCE)),
                AnswerSource::Knowledge => self.sources.lookup_knowledge(input).map(|answer| {
                    Resolution::answered(answer, Provenance::Knowledge, KNOWLEDGE_CONFIDENCE)
                }),
            };
            if let Some(resolution) = resolution {
                debug!("resolved from structured source (source={source:?})");
                return Some(resolution);
            }
        }
        None
    }

    /// Generated answer, or the failure to report. `Err(None)` when generation is off.
    async fn generate(&self, input: &str) -> Result<String, Option<GenerateError>> {
        let Some(generator) = self.generator.as_ref().filter(|_| self.generation.enabled) else {
            debug!("generation unavailable, skipping");
            return Err(None);
        };
        let sample = self.sources.context_sample(self.prompts.limits());
        let prompt = self.prompts.build(&sample, input);
        let timeout_secs = self.generation.timeout_secs;
        match tokio::time::timeout(
            Duration::from_secs(timeout_secs),
            generator.generate(&prompt),
        )
        .await
        {
            Ok(Ok(answer)) if !answer.trim().is_empty() => Ok(answer),
            Ok(Ok(_)) => Err(Some(GenerateError::Empty)),
            Ok(Err(err)) => Err(Some(err)),
            Err(_) => Err(Some(GenerateError::Timeout(timeout_secs))),
        }
    }

    async fn fallback(
        &self,
        input: &str,
        requester: &Requester,
        error: Option<GenerateError>,
    ) -> Resolution {
        let error = error.map(|err| err.to_string());
        let answer = match &error {
            Some(err) => self.ai_apology(err),
            None => self
                .sources
                .tagged_response(FALLBACK_TAG)
                .unwrap_or_else(|| self.assistant.fallback_message.clone()),
        };
        let outcome = self.escalation.record_unanswered(requester, input).await;
        debug!(
            "escalated unanswered question (stored={}, notified={}, warnings={})",
            outcome.stored,
            outcome.notified,
            outcome.warnings.len()
        );
        Resolution {
            answer,
            provenance: Provenance::Fallback,
            confidence: 0.0,
            unresolved: true,
            error,
            warnings: outcome.warnings,
        }
    }
}

impl AnswerEngine {
    /// Apology carrying the upstream failure. Templates without the placeholder get
    /// the description appended.
    fn ai_apology(&self, error: &str) -> String {
        let template = &self.assistant.ai_error_message;
        if template.contains(ERROR_PLACEHOLDER) {
            template.replace(ERROR_PLACEHOLDER, error)
        } else {
            format!("{} ({error})", template.trim_end())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::AnswerEngine;
    use crate::escalation::Escalation;
    use crate::monitoring::MonitorEvent;
    use crate::state::{ChatStore, InMemoryChatStore};
    use crate::types::Requester;
    use helpdesk_rs_config::{
        AnswerSource, AssistantConfig, EscalationConfig, GenerationConfig, ResolutionConfig,
    };
    use helpdesk_rs_knowledge::{
        FaqEntry, InMemoryKnowledgeBase, IntentEntry, KnowledgeArticle, KnowledgeSources,
    };
    use helpdesk_rs_protocol::{GenerateError, Generator, Provenance};
    use helpdesk_rs_test_utils::{
        FailingGenerator, FixedGenerator, RecordingGenerator, RecordingNotifier, SlowGenerator,
    };
    use pretty_assertions::assert_eq;
    use std::sync::Arc;
    use std::time::Duration;

    fn knowledge() -> InMemoryKnowledgeBase {
        InMemoryKnowledgeBase::new()
            .with_faqs([FaqEntry::new("password reset", "Click forgot password")])
            .with_intents([IntentEntry::new(
                "greeting",
                ["hello there"],
                ["Hi! How can I help?"],
            )])
            .with_articles([KnowledgeArticle::new(
                "Printer setup",
                "Install the driver from the portal.",
            )])
    }

    struct Harness {
        engine: AnswerEngine,
        store: Arc<InMemoryChatStore>,
        notifier: Arc<RecordingNotifier>,
    }

    fn harness(
        base: InMemoryKnowledgeBase,
        generator: Option<Arc<dyn Generator>>,
        assistant: AssistantConfig,
        resolution: ResolutionConfig,
        generation: GenerationConfig,
    ) -> Harness {
        let store = Arc::new(InMemoryChatStore::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let escalation = Arc::new(Escalation::new(
            store.clone(),
            notifier.clone(),
            EscalationConfig::default(),
        ));
        let sources = Arc::new(KnowledgeSources::from_config(Arc::new(base), &resolution));
        let engine = AnswerEngine::new(
            sources,
            generator,
            escalation,
            store.clone(),
            assistant,
            resolution,
            generation,
        );
        Harness {
            engine,
            store,
            notifier,
        }
    }

    fn default_harness(generator: Option<Arc<dyn Generator>>) -> Harness {
        harness(
            knowledge(),
            generator,
            AssistantConfig::default(),
            ResolutionConfig::default(),
            GenerationConfig::default(),
        )
    }

    fn requester() -> Requester {
        Requester {
            email: "ana@example.com".to_string(),
            name: "Ana".to_string(),
            request_type: "General".to_string(),
        }
    }

    #[tokio::test]
    async fn faq_answers_password_reset() {
        let h = default_harness(None);
        let resolution = h
            .engine
            .resolve("how do I do a password reset", &requester())
            .await;
        assert_eq!(resolution.answer, "Click forgot password");
        assert_eq!(resolution.provenance, Provenance::Faq);
        assert_eq!(resolution.confidence, 1.0);
        assert!(!resolution.unresolved);
    }

    #[tokio::test]
    async fn intent_carries_tag_and_score() {
        let h = default_harness(None);
        let resolution = h.engine.resolve("Hello there!", &requester()).await;
        assert_eq!(
            resolution.provenance,
            Provenance::Intent("greeting".to_string())
        );
        assert!(resolution.confidence > 0.85);
    }

    #[tokio::test]
    async fn knowledge_answers_with_fixed_confidence() {
        let h = default_harness(None);
        let resolution = h.engine.resolve("printer setup help", &requester()).await;
        assert_eq!(resolution.provenance, Provenance::Knowledge);
        assert_eq!(resolution.confidence, 0.6);
    }

    #[tokio::test]
    async fn policy_order_is_honored() {
        let base = InMemoryKnowledgeBase::new()
            .with_faqs([FaqEntry::new("vpn setup", "faq answer")])
            .with_articles([KnowledgeArticle::new("VPN setup", "article answer")]);
        let resolution = ResolutionConfig {
            order: vec![AnswerSource::Knowledge, AnswerSource::Faq],
            ..ResolutionConfig::default()
        };
        let h = harness(
            base,
            None,
            AssistantConfig::default(),
            resolution,
            GenerationConfig::default(),
        );
        let resolved = h.engine.resolve("vpn setup", &requester()).await;
        assert_eq!(resolved.answer, "article answer");
    }

    #[tokio::test]
    async fn generator_used_when_nothing_matches() {
        let generator = Arc::new(RecordingGenerator::new("Restart the router."));
        let h = default_harness(Some(generator.clone()));
        let resolution = h.engine.resolve("my wifi drops hourly", &requester()).await;
        assert_eq!(resolution.answer, "Restart the router.");
        assert_eq!(resolution.provenance, Provenance::Ai);
        assert_eq!(resolution.confidence, 0.5);
        let prompt = generator.prompts().pop().expect("prompt");
        assert!(prompt.contains("Click forgot password"));
        assert!(prompt.contains("my wifi drops hourly"));
        assert!(h.store.unanswered().expect("list").is_empty());
    }

    #[tokio::test]
    async fn failing_generator_falls_back_once() {
        let h = default_harness(Some(Arc::new(FailingGenerator::new("boom"))));
        let resolution = h.engine.resolve("my wifi drops hourly", &requester()).await;
        assert_eq!(
            resolution.answer,
            "Sorry, there was an error with the AI: provider error: boom"
        );
        assert_eq!(resolution.provenance, Provenance::Fallback);
        assert_eq!(resolution.confidence, 0.0);
        assert!(resolution.unresolved);
        assert_eq!(
            resolution.error,
            Some(GenerateError::Provider("boom".to_string()).to_string())
        );
        let unanswered = h.store.unanswered().expect("list");
        assert_eq!(unanswered.len(), 1);
        assert_eq!(unanswered[0].question, "my wifi drops hourly");
        assert_eq!(h.notifier.sent().len(), 1);
        assert!(resolution.warnings.is_empty());
        let events = h.store.events().expect("events");
        assert!(matches!(&events[..], [MonitorEvent::Error { .. }]));
    }

    #[tokio::test]
    async fn slow_generator_times_out_to_fallback() {
        let generation = GenerationConfig {
            timeout_secs: 1,
            ..GenerationConfig::default()
        };
        let h = harness(
            knowledge(),
            Some(Arc::new(SlowGenerator::new(Duration::from_secs(5), "late"))),
            AssistantConfig::default(),
            ResolutionConfig::default(),
            generation,
        );
        let resolution = h.engine.resolve("my wifi drops hourly", &requester()).await;
        assert_eq!(resolution.provenance, Provenance::Fallback);
        assert_eq!(
            resolution.error,
            Some(GenerateError::Timeout(1).to_string())
        );
    }

    #[tokio::test]
    async fn fallback_intent_answers_when_generation_is_unavailable() {
        let base = knowledge().with_intents([IntentEntry::new(
            "fallback",
            Vec::<String>::new(),
            ["Sorry, I could not find that."],
        )]);
        let h = harness(
            base,
            None,
            AssistantConfig::default(),
            ResolutionConfig::default(),
            GenerationConfig::default(),
        );
        let resolution = h.engine.resolve("my wifi drops hourly", &requester()).await;
        assert_eq!(resolution.answer, "Sorry, I could not find that.");
        assert_eq!(resolution.error, None);
        assert!(resolution.unresolved);
    }

    #[tokio::test]
    async fn custom_apology_template_carries_the_error() {
        let assistant = AssistantConfig {
            ai_error_message: "The assistant is unavailable right now".to_string(),
            ..AssistantConfig::default()
        };
        let h = harness(
            knowledge(),
            Some(Arc::new(FailingGenerator::new("quota"))),
            assistant,
            ResolutionConfig::default(),
            GenerationConfig::default(),
        );
        let resolution = h.engine.resolve("my wifi drops hourly", &requester()).await;
        assert_eq!(
            resolution.answer,
            "The assistant is unavailable right now (provider error: quota)"
        );
    }

    #[tokio::test]
    async fn disabled_generation_skips_generator() {
        let generator = Arc::new(RecordingGenerator::new("unused"));
        let generation = GenerationConfig {
            enabled: false,
            ..GenerationConfig::default()
        };
        let h = harness(
            knowledge(),
            Some(generator.clone()),
            AssistantConfig::default(),
            ResolutionConfig::default(),
            generation,
        );
        let resolution = h.engine.resolve("my wifi drops hourly", &requester()).await;
        assert!(resolution.unresolved);
        assert_eq!(resolution.error, None);
        assert!(generator.prompts().is_empty());
        assert!(h.store.events().expect("events").is_empty());
        assert_eq!(h.engine.model_version(), "none");
    }

    #[tokio::test]
    async fn blank_generation_is_empty_error() {
        let h = default_harness(Some(Arc::new(FixedGenerator::new("   "))));
        let resolution = h.engine.resolve("my wifi drops hourly", &requester()).await;
        assert_eq!(resolution.error, Some(GenerateError::Empty.to_string()));
    }
}
