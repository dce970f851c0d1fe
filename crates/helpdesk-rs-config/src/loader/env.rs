//! `HELPDESK_*` environment overrides.

use crate::ConfigError;
use log::debug;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

const ENV_PREFIX: &str = "HELPDESK_";

#[derive(Clone, Copy)]
enum Kind {
    Text,
    Integer,
    Flag,
}

struct EnvOverride {
    var: &'static str,
    section: &'static str,
    key: &'static str,
    kind: Kind,
}

const OVERRIDES: &[EnvOverride] = &[
    EnvOverride {
        var: "HELPDESK_KNOWLEDGE_PATH",
        section: "knowledge",
        key: "path",
        kind: Kind::Text,
    },
    EnvOverride {
        var: "HELPDESK_STORAGE_PROVIDER",
        section: "storage",
        key: "provider",
        kind: Kind::Text,
    },
    EnvOverride {
        var: "HELPDESK_STORAGE_PATH",
        section: "storage",
        key: "path",
        kind: Kind::Text,
    },
    EnvOverride {
        var: "HELPDESK_GENERATION_ENABLED",
        section: "generation",
        key: "enabled",
        kind: Kind::Flag,
    },
    EnvOverride {
        var: "HELPDESK_GENERATION_MODEL",
        section: "generation",
        key: "model",
        kind: Kind::Text,
    },
    EnvOverride {
        var: "HELPDESK_GENERATION_TIMEOUT_SECS",
        section: "generation",
        key: "timeout_secs",
        kind: Kind::Integer,
    },
    EnvOverride {
        var: "HELPDESK_NOTIFIER",
        section: "escalation",
        key: "notifier",
        kind: Kind::Text,
    },
    EnvOverride {
        var: "HELPDESK_NOTIFY_RECIPIENT",
        section: "escalation",
        key: "recipient",
        kind: Kind::Text,
    },
    EnvOverride {
        var: "HELPDESK_WEBHOOK_URL",
        section: "escalation",
        key: "webhook_url",
        kind: Kind::Text,
    },
];

/// Every `HELPDESK_*` variable of the current process.
pub(super) fn process_vars() -> BTreeMap<String, String> {
    std::env::vars()
        .filter(|(name, _)| name.starts_with(ENV_PREFIX))
        .collect()
}

/// Build a config layer from recognized variables. Returns the layer and the
/// names of the variables it used.
pub(super) fn overrides(
    vars: &BTreeMap<String, String>,
) -> Result<(Map<String, Value>, Vec<String>), ConfigError> {
    let mut layer = Map::new();
    let mut used = Vec::new();
    for entry in OVERRIDES {
        let Some(raw) = vars.get(entry.var) else {
            continue;
        };
        let value = parse(entry.kind, raw.trim()).ok_or_else(|| ConfigError::InvalidField {
            path: format!("env:{}", entry.var),
            message: format!("cannot use {raw:?} for {}.{}", entry.section, entry.key),
        })?;
        if let Value::Object(section) = layer
            .entry(entry.section)
            .or_insert_with(|| Value::Object(Map::new()))
        {
            section.insert(entry.key.to_string(), value);
        }
        used.push(entry.var.to_string());
    }
    for name in vars.keys() {
        let known = OVERRIDES.iter().any(|entry| entry.var == name.as_str());
        if name.starts_with(ENV_PREFIX) && !known {
            debug!("ignoring unrecognized config variable (name={name})");
        }
    }
    Ok((layer, used))
}

fn parse(kind: Kind, raw: &str) -> Option<Value> {
    match kind {
        Kind::Text if raw.is_empty() => None,
        Kind::Text => Some(Value::String(raw.to_string())),
        Kind::Integer => raw.parse::<u64>().ok().map(Value::from),
        Kind::Flag => match raw.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Some(Value::Bool(true)),
            "0" | "false" | "no" | "off" => Some(Value::Bool(false)),
            _ => None,
        },
    }
}
