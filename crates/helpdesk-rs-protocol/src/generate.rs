use async_trait::async_trait;

/// Errors returned by generative backends.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum GenerateError {
    /// Backend rejected the request or could not be reached.
    #[error("provider error: {0}")]
    Provider(String),
    /// Backend did not answer within the configured deadline.
    #[error("generation timed out after {0}s")]
    Timeout(u64),
    /// Backend answered without any text.
    #[error("empty response")]
    Empty,
}

/// Text generation capability used for the AI fallback.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Produce a completion for a fully composed prompt.
    async fn generate(&self, prompt: &str) -> Result<String, GenerateError>;

    /// Model identifier recorded alongside interactions.
    fn model_version(&self) -> String {
        "unknown".to_string()
    }
}
