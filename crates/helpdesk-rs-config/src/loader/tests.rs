//! Tests for layered configuration loading.

use super::*;
use crate::{AnswerSource, SimilarityMetric};
use pretty_assertions::assert_eq;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Write JSON5 contents to a path, creating parent directories if needed.
fn write_json5(path: &Path, contents: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("dir");
    }
    fs::write(path, contents).expect("write");
}

/// Project directory with a nested working directory.
fn project_layout(root: &Path) -> (PathBuf, PathBuf) {
    let project_root = root.join("project");
    let cwd = project_root.join("subdir");
    fs::create_dir_all(&cwd).expect("cwd");
    (project_root, cwd)
}

fn greeting_layer(value: &str) -> String {
    format!("{{ assistant: {{ greeting: \"{value}\" }} }}")
}

/// Verify that a minimal config parses with defaults.
#[test]
fn parse_minimal_config() {
    let config = HelpdeskConfig::load_from_str("{}").expect("config");
    assert_eq!(
        config.resolution.order,
        vec![
            AnswerSource::Intent,
            AnswerSource::Faq,
            AnswerSource::Knowledge
        ]
    );
    assert_eq!(config.resolution.intent_threshold, 0.85);
    assert_eq!(config.resolution.metric, SimilarityMetric::Gestalt);
    assert_eq!(config.generation.timeout_secs, 30);
    assert_eq!(config.generation.faq_context_limit, 10);
    assert_eq!(config.assistant.fallback_message, "I don't understand that.");
    assert_eq!(
        config.assistant.ai_error_message,
        "Sorry, there was an error with the AI: {error}"
    );
}

#[test]
fn parses_custom_resolution_policy() {
    let json5 = r#"{
        // knowledge articles first
        resolution: { order: ["knowledge", "faq"], metric: "jaro_winkler", seed: 7 },
    }"#;
    let config = HelpdeskConfig::load_from_str(json5).expect("config");
    assert_eq!(
        config.resolution.order,
        vec![AnswerSource::Knowledge, AnswerSource::Faq]
    );
    assert_eq!(config.resolution.metric, SimilarityMetric::JaroWinkler);
    assert_eq!(config.resolution.seed, Some(7));
}

/// Reject unexpected top-level config keys.
#[test]
fn rejects_unknown_top_level_key() {
    let err = HelpdeskConfig::load_from_str(r#"{ unexpected: true }"#).unwrap_err();
    assert!(format!("{err}").contains("unknown key"));
}

#[test]
fn rejects_unknown_answer_source() {
    let err = HelpdeskConfig::load_from_str(r#"{ resolution: { order: ["oracle"] } }"#)
        .unwrap_err();
    let msg = format!("{err}");
    assert!(msg.contains("resolution.order[0]"));
    assert!(msg.contains("expected one of intent, faq, knowledge"));
}

#[test]
fn rejects_duplicate_answer_source() {
    let err = HelpdeskConfig::load_from_str(r#"{ resolution: { order: ["faq", "faq"] } }"#)
        .unwrap_err();
    assert!(format!("{err}").contains("duplicate source"));
}

#[test]
fn rejects_threshold_out_of_range() {
    let err = HelpdeskConfig::load_from_str(r#"{ resolution: { intent_threshold: 1.5 } }"#)
        .unwrap_err();
    assert!(format!("{err}").contains("resolution.intent_threshold"));
}

#[test]
fn rejects_zero_timeout() {
    let err =
        HelpdeskConfig::load_from_str(r#"{ generation: { timeout_secs: 0 } }"#).unwrap_err();
    assert!(format!("{err}").contains("generation.timeout_secs"));
}

#[test]
fn webhook_notifier_requires_url() {
    let err = HelpdeskConfig::load_from_str(r#"{ escalation: { notifier: "webhook" } }"#)
        .unwrap_err();
    assert!(format!("{err}").contains("webhook_url"));

    let config = HelpdeskConfig::load_from_str(
        r#"{ escalation: { notifier: "webhook", webhook_url: "http://localhost:9000/hook" } }"#,
    )
    .expect("config");
    assert_eq!(config.escalation.notifier, NotifierKind::Webhook);
}

/// Later layers win: user, project, explicit file, then environment.
#[test]
fn layers_apply_in_precedence_order() {
    let temp = TempDir::new().expect("tmp");
    let root = temp.path();
    let (project_root, cwd) = project_layout(root);

    let user_config = root.join("home").join(files::CONFIG_DIR).join(files::CONFIG_FILE);
    write_json5(
        &user_config,
        r#"{ assistant: { greeting: "user" }, storage: { path: "/srv/user" } }"#,
    );
    write_json5(
        &project_root.join(files::CONFIG_FILE),
        &greeting_layer("project"),
    );
    let explicit = root.join("ops.json5");
    write_json5(&explicit, &greeting_layer("file"));

    let options = LayeredConfigOptions {
        user_config_path: Some(user_config),
        ..LayeredConfigOptions::isolated(&cwd)
    }
    .with_config_path(&explicit)
    .with_env("HELPDESK_STORAGE_PATH", "/srv/env");

    let layered = HelpdeskConfig::load_layered_with_options(options).expect("layered");
    assert_eq!(layered.config.assistant.greeting, "file");
    assert_eq!(layered.config.storage.path.as_deref(), Some("/srv/env"));
    let sources: Vec<_> = layered.layers.iter().map(|layer| layer.source).collect();
    assert_eq!(
        sources,
        vec![
            ConfigLayerSource::User,
            ConfigLayerSource::Project,
            ConfigLayerSource::File,
            ConfigLayerSource::Env
        ]
    );
    assert_eq!(layered.layers[3].origin, "HELPDESK_STORAGE_PATH");
}

/// The project file nearest to the working directory is the only one read.
#[test]
fn nearest_project_config_wins() {
    let temp = TempDir::new().expect("tmp");
    let root = temp.path();
    write_json5(&root.join(files::CONFIG_FILE), &greeting_layer("outer"));
    let inner = root.join("inner");
    write_json5(
        &inner.join(files::CONFIG_DIR).join(files::CONFIG_FILE),
        &greeting_layer("inner"),
    );
    let cwd = inner.join("deep");
    fs::create_dir_all(&cwd).expect("cwd");

    let layered = HelpdeskConfig::load_layered_with_options(LayeredConfigOptions::isolated(&cwd))
        .expect("layered");
    assert_eq!(layered.config.assistant.greeting, "inner");
    assert_eq!(layered.layers.len(), 1);
}

/// A user config below the working directory's ancestors is read once, as the
/// user layer.
#[test]
fn user_config_is_not_read_as_project_config() {
    let temp = TempDir::new().expect("tmp");
    let home = temp.path().join("home");
    let user_config = home.join(files::CONFIG_DIR).join(files::CONFIG_FILE);
    write_json5(&user_config, &greeting_layer("user"));
    let cwd = home.join("work");
    fs::create_dir_all(&cwd).expect("cwd");

    let options = LayeredConfigOptions {
        user_config_path: Some(user_config),
        ..LayeredConfigOptions::isolated(&cwd)
    };
    let layered = HelpdeskConfig::load_layered_with_options(options).expect("layered");
    assert_eq!(layered.config.assistant.greeting, "user");
    assert_eq!(layered.layers.len(), 1);
    assert_eq!(layered.layers[0].source, ConfigLayerSource::User);
}

/// `null` in a later layer unsets an optional path set earlier.
#[test]
fn null_unsets_optional_setting() {
    let temp = TempDir::new().expect("tmp");
    let (project_root, cwd) = project_layout(temp.path());
    let user_config = temp.path().join("user.json5");
    write_json5(&user_config, r#"{ knowledge: { path: "/srv/kb" } }"#);
    write_json5(
        &project_root.join(files::CONFIG_FILE),
        r#"{ knowledge: { path: null } }"#,
    );

    let options = LayeredConfigOptions {
        user_config_path: Some(user_config),
        ..LayeredConfigOptions::isolated(&cwd)
    };
    let layered = HelpdeskConfig::load_layered_with_options(options).expect("layered");
    assert_eq!(layered.config.knowledge.path, None);
}

#[test]
fn env_overrides_are_typed() {
    let temp = TempDir::new().expect("tmp");
    let options = LayeredConfigOptions::isolated(temp.path())
        .with_env("HELPDESK_GENERATION_TIMEOUT_SECS", "45")
        .with_env("HELPDESK_GENERATION_ENABLED", "off")
        .with_env("HELPDESK_NOTIFIER", "outbox")
        .with_env("HELPDESK_UNRELATED", "ignored");
    let layered = HelpdeskConfig::load_layered_with_options(options).expect("layered");
    assert_eq!(layered.config.generation.timeout_secs, 45);
    assert!(!layered.config.generation.enabled);
    assert_eq!(layered.config.escalation.notifier, NotifierKind::Outbox);

    let err = HelpdeskConfig::load_layered_with_options(
        LayeredConfigOptions::isolated(temp.path())
            .with_env("HELPDESK_GENERATION_TIMEOUT_SECS", "soon"),
    )
    .unwrap_err();
    assert!(format!("{err}").contains("env:HELPDESK_GENERATION_TIMEOUT_SECS"));

    let err = HelpdeskConfig::load_layered_with_options(
        LayeredConfigOptions::isolated(temp.path()).with_env("HELPDESK_NOTIFIER", "pager"),
    )
    .unwrap_err();
    assert!(format!("{err}").contains("env:escalation.notifier"));
}

#[test]
fn unknown_variables_add_no_layer() {
    let temp = TempDir::new().expect("tmp");
    let options =
        LayeredConfigOptions::isolated(temp.path()).with_env("HELPDESK_UNRELATED", "x");
    let layered = HelpdeskConfig::load_layered_with_options(options).expect("layered");
    assert!(layered.layers.is_empty());
}

#[test]
fn invalid_layer_reports_layer_and_path() {
    let temp = TempDir::new().expect("tmp");
    let (project_root, cwd) = project_layout(temp.path());
    write_json5(
        &project_root.join(files::CONFIG_FILE),
        "{ storage: { kind: \"sqlite\" } }",
    );

    let err = HelpdeskConfig::load_layered_with_options(LayeredConfigOptions::isolated(&cwd))
        .unwrap_err();
    let msg = format!("{err}");
    assert!(msg.contains("project("));
    assert!(msg.contains("storage.kind"));
}

#[test]
fn explicit_config_file_must_exist() {
    let temp = TempDir::new().expect("tmp");
    let options = LayeredConfigOptions::isolated(temp.path())
        .with_config_path(temp.path().join("missing.json5"));
    assert!(matches!(
        HelpdeskConfig::load_layered_with_options(options),
        Err(ConfigError::ReadFailed(_))
    ));
}

#[test]
fn load_from_path_reads_a_single_file() {
    let temp = TempDir::new().expect("tmp");
    let path = temp.path().join("helpdesk.json5");
    write_json5(&path, r#"{ generation: { enabled: false, instruction: null } }"#);
    let config = HelpdeskConfig::load_from_path(&path).expect("config");
    assert!(!config.generation.enabled);
    assert_eq!(config.generation.instruction, None);
}
