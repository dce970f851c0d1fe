//! Config failures.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    /// A config file could not be opened or read.
    #[error("cannot read helpdesk config: {0}")]
    ReadFailed(#[from] std::io::Error),
    #[error("helpdesk config is not valid JSON5: {0}")]
    ParseFailed(#[from] json5::Error),
    /// The merged layers do not fit the settings model.
    #[error("helpdesk config does not match the settings model: {0}")]
    DecodeFailed(#[from] serde_json::Error),
    /// `path` reads `layer:section.key`, e.g. `project(/srv/helpdesk.json5):storage.path`.
    #[error("{path}: {message}")]
    InvalidField { path: String, message: String },
    #[error("helpdesk config rejected: {0}")]
    Invalid(String),
}
