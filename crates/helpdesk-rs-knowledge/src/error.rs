//! Error types for knowledge base access.

/// Errors returned by knowledge bases and helpers.
#[derive(Debug, thiserror::Error)]
pub enum KnowledgeError {
    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// Serialization error.
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    /// Regex compilation error.
    #[error("regex error: {0}")]
    Regex(String),
    /// Backend-specific failure.
    #[error("knowledge backend error: {0}")]
    Backend(String),
}
