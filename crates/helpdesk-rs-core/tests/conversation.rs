//! Conversation flow integration tests: resolution, feedback, escalation.

use helpdesk_rs_config::{GenerationConfig, HelpdeskConfig};
use helpdesk_rs_core::{
    ChatStore, Helpdesk, HelpdeskBuilder, HelpdeskError, InMemoryChatStore, MonitorEvent,
    SessionContext, Submission,
};
use helpdesk_rs_protocol::{Generator, Priority, Provenance, Sentiment};
use helpdesk_rs_test_utils::{
    FailingGenerator, FailingNotifier, RecordingGenerator, RecordingNotifier, SlowGenerator,
    sample_knowledge,
};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::Duration;

struct Fixture {
    helpdesk: Helpdesk,
    store: Arc<InMemoryChatStore>,
    notifier: Arc<RecordingNotifier>,
    ctx: SessionContext,
}

fn builder(
    config: HelpdeskConfig,
) -> (
    HelpdeskBuilder,
    Arc<InMemoryChatStore>,
    Arc<RecordingNotifier>,
) {
    let store = Arc::new(InMemoryChatStore::new());
    let notifier = Arc::new(RecordingNotifier::new());
    let builder = Helpdesk::builder(config)
        .store(store.clone())
        .notifier(notifier.clone())
        .knowledge(Arc::new(sample_knowledge()));
    (builder, store, notifier)
}

fn fixture(config: HelpdeskConfig, generator: Option<Arc<dyn Generator>>) -> Fixture {
    let (builder, store, notifier) = builder(config);
    let builder = match generator {
        Some(generator) => builder.generator(generator),
        None => builder,
    };
    let helpdesk = builder.build().expect("helpdesk");
    let mut ctx = SessionContext::new();
    helpdesk
        .register_or_login(&mut ctx, "ana@example.com", "Ana", "Access")
        .expect("register");
    Fixture {
        helpdesk,
        store,
        notifier,
        ctx,
    }
}

/// FAQ phrases inside a longer question should resolve from the FAQ.
#[tokio::test]
async fn password_reset_resolves_from_faq() {
    let mut f = fixture(HelpdeskConfig::default(), None);
    let reply = f
        .helpdesk
        .post_message(&mut f.ctx, Submission::new("how do I do a password reset"))
        .await
        .expect("post");
    assert_eq!(reply.index, 0);
    assert!(!reply.replayed);
    assert_eq!(reply.message.answer, "Click forgot password");
    assert_eq!(reply.message.provenance, Provenance::Faq);
    assert_eq!(reply.message.confidence, 1.0);
    assert!(f.store.unanswered().expect("unanswered").is_empty());
}

/// A failing generator yields an apology naming the error and one unanswered record.
#[tokio::test]
async fn failing_generator_records_one_unanswered_question() {
    let mut f = fixture(
        HelpdeskConfig::default(),
        Some(Arc::new(FailingGenerator::new("upstream 500"))),
    );
    let reply = f
        .helpdesk
        .post_message(
            &mut f.ctx,
            Submission::new("Urgent: the payroll server is down!"),
        )
        .await
        .expect("post");
    assert_eq!(
        reply.message.answer,
        "Sorry, there was an error with the AI: provider error: upstream 500"
    );
    assert_eq!(reply.message.provenance, Provenance::Fallback);
    assert_eq!(reply.message.priority, Priority::High);
    assert!(reply.warnings.is_empty());

    let unanswered = f.store.unanswered().expect("unanswered");
    assert_eq!(unanswered.len(), 1);
    assert_eq!(unanswered[0].email, "ana@example.com");
    assert_eq!(unanswered[0].request_type, "Access");
    let subjects: Vec<_> = f.notifier.sent().into_iter().map(|n| n.subject).collect();
    assert_eq!(
        subjects,
        vec!["[Helpdesk - Unanswered] New question from ana@example.com".to_string()]
    );

    let report = f.helpdesk.monitoring_report().expect("report");
    assert_eq!(report.total_responses, 1);
    assert_eq!(report.fallback_rate, 1.0);
    assert_eq!(report.errors, 1);
}

/// Generator deadlines convert to the fallback answer.
#[tokio::test]
async fn generator_timeout_falls_back() {
    let mut config = HelpdeskConfig::default();
    config.generation = GenerationConfig {
        timeout_secs: 1,
        ..GenerationConfig::default()
    };
    let mut f = fixture(
        config,
        Some(Arc::new(SlowGenerator::new(Duration::from_secs(3), "too late"))),
    );
    let reply = f
        .helpdesk
        .post_message(&mut f.ctx, Submission::new("my monitor flickers at night"))
        .await
        .expect("post");
    assert_eq!(reply.message.provenance, Provenance::Fallback);
    assert!(reply.message.answer.starts_with("Sorry, there was an error with the AI"));
    assert!(reply.message.answer.contains("timed out after 1s"));
    assert_eq!(f.store.unanswered().expect("unanswered").len(), 1);
}

/// Without a generator the canned fallback answers and no error is reported.
#[tokio::test]
async fn unavailable_generator_uses_canned_fallback() {
    let mut f = fixture(HelpdeskConfig::default(), None);
    let reply = f
        .helpdesk
        .post_message(&mut f.ctx, Submission::new("my monitor flickers at night"))
        .await
        .expect("post");
    assert_eq!(reply.message.answer, "I don't understand that.");
    assert!(reply.message.provenance.is_fallback());
    assert_eq!(f.helpdesk.monitoring_report().expect("report").errors, 0);
}

/// Generated answers are stored with their provenance and model.
#[tokio::test]
async fn generated_answer_is_recorded() {
    let generator = Arc::new(RecordingGenerator::new("Try another cable."));
    let mut f = fixture(HelpdeskConfig::default(), Some(generator.clone()));
    let reply = f
        .helpdesk
        .post_message(&mut f.ctx, Submission::new("my monitor flickers at night"))
        .await
        .expect("post");
    assert_eq!(reply.message.provenance, Provenance::Ai);
    assert_eq!(generator.prompts().len(), 1);
    let events = f.store.events().expect("events");
    assert!(matches!(
        &events[..],
        [MonitorEvent::Interaction { model_version, fallback: false, .. }] if model_version == "recording"
    ));
}

/// Re-posting a submission returns the stored message without re-processing.
#[tokio::test]
async fn reposting_a_submission_is_idempotent() {
    let generator = Arc::new(RecordingGenerator::new("Try another cable."));
    let mut f = fixture(HelpdeskConfig::default(), Some(generator.clone()));
    let submission = Submission::new("my monitor flickers at night");
    let first = f
        .helpdesk
        .post_message(&mut f.ctx, submission.clone())
        .await
        .expect("first");
    let second = f
        .helpdesk
        .post_message(&mut f.ctx, submission)
        .await
        .expect("second");
    assert!(second.replayed);
    assert_eq!(second.message, first.message);
    assert_eq!(f.ctx.messages().len(), 1);
    assert_eq!(generator.prompts().len(), 1);
    let ticket = f.ctx.ticket().expect("ticket").to_string();
    let stored = f.store.load_session(&ticket).expect("load").expect("record");
    assert_eq!(stored.messages.len(), 1);
}

/// Blank submissions are rejected before resolution.
#[tokio::test]
async fn blank_submission_is_invalid() {
    let mut f = fixture(HelpdeskConfig::default(), None);
    assert!(matches!(
        f.helpdesk
            .post_message(&mut f.ctx, Submission::new("   "))
            .await,
        Err(HelpdeskError::InvalidInput(_))
    ));
    assert!(f.ctx.messages().is_empty());
}

/// Like and dislike are mutually exclusive, in memory and in storage.
#[tokio::test]
async fn feedback_flags_are_mutually_exclusive() {
    let mut f = fixture(HelpdeskConfig::default(), None);
    f.helpdesk
        .post_message(
            &mut f.ctx,
            Submission::new("Thank you so much! That was very helpful."),
        )
        .await
        .expect("post");
    assert_eq!(f.ctx.messages()[0].sentiment, Sentiment::Positive);
    let ticket = f.ctx.ticket().expect("ticket").to_string();

    let outcome = f
        .helpdesk
        .set_feedback(&mut f.ctx, 0, true)
        .await
        .expect("like");
    assert!(!outcome.notified);
    let message = &f.ctx.messages()[0];
    assert_eq!((message.thumbs_up, message.thumbs_down), (true, false));

    let outcome = f
        .helpdesk
        .set_feedback(&mut f.ctx, 0, false)
        .await
        .expect("dislike");
    assert!(outcome.notified);
    let message = &f.ctx.messages()[0];
    assert_eq!((message.thumbs_up, message.thumbs_down), (false, true));
    let stored = f.store.load_session(&ticket).expect("load").expect("record");
    assert_eq!(
        (stored.messages[0].thumbs_up, stored.messages[0].thumbs_down),
        (false, true)
    );
    assert!(
        f.notifier
            .sent()
            .iter()
            .any(|n| n.subject == "[Helpdesk - Feedback] 👎 from ana@example.com")
    );

    assert!(matches!(
        f.helpdesk.set_feedback(&mut f.ctx, 3, true).await,
        Err(HelpdeskError::InvalidMessageIndex { index: 3, len: 1 })
    ));
    let report = f.helpdesk.monitoring_report().expect("report");
    assert_eq!((report.thumbs_up, report.thumbs_down), (1, 1));
    assert_eq!(report.satisfaction, 0.0);
}

/// Notifier failures never block the conversation.
#[tokio::test]
async fn notifier_failure_is_a_warning() {
    let store = Arc::new(InMemoryChatStore::new());
    let helpdesk = Helpdesk::builder(HelpdeskConfig::default())
        .store(store.clone())
        .knowledge(Arc::new(sample_knowledge()))
        .notifier(Arc::new(FailingNotifier::new("smtp unreachable")))
        .build()
        .expect("helpdesk");
    let mut ctx = SessionContext::new();
    helpdesk
        .register_or_login(&mut ctx, "ana@example.com", "Ana", "")
        .expect("register");
    let reply = helpdesk
        .post_message(&mut ctx, Submission::new("my monitor flickers at night"))
        .await
        .expect("post");
    assert!(reply.message.provenance.is_fallback());
    assert_eq!(store.unanswered().expect("unanswered").len(), 1);
    assert_eq!(reply.warnings.len(), 1);
    assert!(reply.warnings[0].contains("smtp unreachable"));

    let outcome = helpdesk
        .set_feedback(&mut ctx, 0, false)
        .await
        .expect("feedback");
    assert!(!outcome.notified);
    assert_eq!(outcome.warnings.len(), 1);
}
