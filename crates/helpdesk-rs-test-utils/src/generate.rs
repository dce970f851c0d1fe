use async_trait::async_trait;
use helpdesk_rs_protocol::{GenerateError, Generator};
use parking_lot::Mutex;
use std::time::Duration;

/// Returns the same text for every prompt.
#[derive(Debug, Clone)]
pub struct FixedGenerator {
    response: String,
}

impl FixedGenerator {
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
        }
    }
}

#[async_trait]
impl Generator for FixedGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String, GenerateError> {
        Ok(self.response.clone())
    }

    fn model_version(&self) -> String {
        "fixed".to_string()
    }
}

/// Fails every request with a provider error.
#[derive(Debug, Clone)]
pub struct FailingGenerator {
    message: String,
}

impl FailingGenerator {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[async_trait]
impl Generator for FailingGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String, GenerateError> {
        Err(GenerateError::Provider(self.message.clone()))
    }
}

/// Answers with fixed text and keeps every prompt.
#[derive(Debug, Default)]
pub struct RecordingGenerator {
    response: String,
    prompts: Mutex<Vec<String>>,
}

impl RecordingGenerator {
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }
}

#[async_trait]
impl Generator for RecordingGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, GenerateError> {
        self.prompts.lock().push(prompt.to_string());
        Ok(self.response.clone())
    }

    fn model_version(&self) -> String {
        "recording".to_string()
    }
}

/// Sleeps before answering, for deadline tests.
#[derive(Debug, Clone)]
pub struct SlowGenerator {
    delay: Duration,
    response: String,
}

impl SlowGenerator {
    pub fn new(delay: Duration, response: impl Into<String>) -> Self {
        Self {
            delay,
            response: response.into(),
        }
    }
}

#[async_trait]
impl Generator for SlowGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String, GenerateError> {
        tokio::time::sleep(self.delay).await;
        Ok(self.response.clone())
    }
}
