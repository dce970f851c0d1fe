//! Shape checks run on every layer before it is merged, so a bad value is
//! reported against the file or variable that introduced it.

use crate::ConfigError;
use serde_json::Value;

#[derive(Debug, Clone, Copy)]
enum Shape {
    Text,
    /// `null` unsets the setting in an earlier layer.
    OptionalText,
    Flag,
    Count,
    OptionalCount,
    Number,
    OneOf(&'static [&'static str]),
    ListOf(&'static [&'static str]),
}

type Fields = &'static [(&'static str, Shape)];

const ANSWER_SOURCES: &[&str] = &["intent", "faq", "knowledge"];
const METRICS: &[&str] = &["gestalt", "levenshtein", "jaro_winkler"];
const NOTIFIERS: &[&str] = &["log", "outbox", "webhook"];

const ASSISTANT: Fields = &[
    ("name", Shape::Text),
    ("organization", Shape::Text),
    ("greeting", Shape::Text),
    ("fallback_message", Shape::Text),
    ("ai_error_message", Shape::Text),
];

const RESOLUTION: Fields = &[
    ("order", Shape::ListOf(ANSWER_SOURCES)),
    ("intent_threshold", Shape::Number),
    ("metric", Shape::OneOf(METRICS)),
    ("faq_min_chars", Shape::Count),
    ("knowledge_min_chars", Shape::Count),
    ("seed", Shape::OptionalCount),
];

const GENERATION: Fields = &[
    ("enabled", Shape::Flag),
    ("provider", Shape::Text),
    ("model", Shape::Text),
    ("timeout_secs", Shape::Count),
    ("faq_context_limit", Shape::Count),
    ("intent_context_limit", Shape::Count),
    ("knowledge_context_limit", Shape::Count),
    ("instruction", Shape::OptionalText),
];

/// Shared by `knowledge` and `storage`.
const BACKEND: Fields = &[("provider", Shape::Text), ("path", Shape::OptionalText)];

const ESCALATION: Fields = &[
    ("enabled", Shape::Flag),
    ("notifier", Shape::OneOf(NOTIFIERS)),
    ("recipient", Shape::Text),
    ("notify_on_like", Shape::Flag),
    ("outbox_path", Shape::OptionalText),
    ("webhook_url", Shape::OptionalText),
    ("webhook_timeout_secs", Shape::Count),
];

const SECTIONS: &[(&str, Fields)] = &[
    ("assistant", ASSISTANT),
    ("resolution", RESOLUTION),
    ("generation", GENERATION),
    ("knowledge", BACKEND),
    ("storage", BACKEND),
    ("escalation", ESCALATION),
];

/// Check one layer. `layer` prefixes every reported path.
pub(super) fn validate_layer_schema(value: &Value, layer: &str) -> Result<(), ConfigError> {
    let Value::Object(root) = value else {
        return Err(invalid(layer, "root", "expected object"));
    };
    for (name, section) in root {
        if name == "$schema" {
            check(section, Shape::Text, layer, name)?;
            continue;
        }
        let Some((_, fields)) = SECTIONS.iter().find(|(known, _)| *known == name.as_str()) else {
            return Err(invalid(layer, name, "unknown key"));
        };
        let Value::Object(entries) = section else {
            return Err(invalid(layer, name, "expected object"));
        };
        for (key, value) in entries {
            let path = format!("{name}.{key}");
            let Some((_, shape)) = fields.iter().find(|(known, _)| *known == key.as_str()) else {
                return Err(invalid(layer, &path, "unknown key"));
            };
            check(value, *shape, layer, &path)?;
        }
    }
    Ok(())
}

fn check(value: &Value, shape: Shape, layer: &str, path: &str) -> Result<(), ConfigError> {
    let (fits, expected) = match shape {
        Shape::Text => (value.is_string(), "expected string"),
        Shape::OptionalText => (value.is_string() || value.is_null(), "expected string or null"),
        Shape::Flag => (value.is_boolean(), "expected bool"),
        Shape::Count => (value.is_u64(), "expected integer"),
        Shape::OptionalCount => (value.is_u64() || value.is_null(), "expected integer or null"),
        Shape::Number => (value.is_number(), "expected number"),
        Shape::OneOf(allowed) => return check_choice(value, allowed, layer, path),
        Shape::ListOf(allowed) => {
            let Value::Array(items) = value else {
                return Err(invalid(layer, path, "expected array"));
            };
            for (idx, item) in items.iter().enumerate() {
                check_choice(item, allowed, layer, &format!("{path}[{idx}]"))?;
            }
            return Ok(());
        }
    };
    if fits {
        Ok(())
    } else {
        Err(invalid(layer, path, expected))
    }
}

fn check_choice(
    value: &Value,
    allowed: &[&str],
    layer: &str,
    path: &str,
) -> Result<(), ConfigError> {
    match value.as_str() {
        Some(choice) if allowed.contains(&choice) => Ok(()),
        Some(_) => Err(invalid(
            layer,
            path,
            &format!("expected one of {}", allowed.join(", ")),
        )),
        None => Err(invalid(layer, path, "expected string")),
    }
}

fn invalid(layer: &str, path: &str, message: &str) -> ConfigError {
    ConfigError::InvalidField {
        path: format!("{layer}:{path}"),
        message: message.to_string(),
    }
}
