//! Generator backed by an `autoagents_llm` provider.

use async_trait::async_trait;
use autoagents_llm::LLMProvider;
use autoagents_llm::chat::{ChatMessage, ChatRole, MessageType};
use helpdesk_rs_protocol::{GenerateError, Generator};
use log::{debug, warn};
use std::sync::Arc;

/// Sends the composed prompt as a single user message.
#[derive(Clone)]
pub struct LlmGenerator {
    provider: Arc<dyn LLMProvider>,
    model: String,
}

impl LlmGenerator {
    pub fn new(provider: Arc<dyn LLMProvider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
        }
    }
}

#[async_trait]
impl Generator for LlmGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, GenerateError> {
        let messages = vec![ChatMessage {
            role: ChatRole::User,
            message_type: MessageType::Text,
            content: prompt.to_string(),
        }];
        debug!(
            "requesting completion (model={}, prompt_len={})",
            self.model,
            prompt.len()
        );
        let response = self
            .provider
            .chat_with_tools(&messages, None, None)
            .await
            .map_err(|err| {
                warn!("llm request failed (model={}, err={})", self.model, err);
                GenerateError::Provider(err.to_string())
            })?;
        match response.text() {
            Some(text) if !text.trim().is_empty() => Ok(text.trim().to_string()),
            _ => Err(GenerateError::Empty),
        }
    }

    fn model_version(&self) -> String {
        self.model.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::LlmGenerator;
    use helpdesk_rs_protocol::{GenerateError, Generator};
    use helpdesk_rs_test_utils::StubLLM;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    #[tokio::test]
    async fn returns_trimmed_text() {
        let generator = LlmGenerator::new(Arc::new(StubLLM::replying("  Try a restart.\n")), "gpt");
        assert_eq!(
            generator.generate("prompt").await,
            Ok("Try a restart.".to_string())
        );
        assert_eq!(generator.model_version(), "gpt");
    }

    #[tokio::test]
    async fn blank_text_is_empty_error() {
        let generator = LlmGenerator::new(Arc::new(StubLLM::replying("   ")), "gpt");
        assert_eq!(generator.generate("prompt").await, Err(GenerateError::Empty));
    }

    #[tokio::test]
    async fn provider_failure_is_mapped() {
        let generator = LlmGenerator::new(Arc::new(StubLLM::failing("quota exceeded")), "gpt");
        let err = generator.generate("prompt").await.expect_err("failure");
        assert!(matches!(err, GenerateError::Provider(message) if message.contains("quota exceeded")));
    }

    #[tokio::test]
    async fn prompt_is_sent_as_one_user_message() {
        let llm = Arc::new(StubLLM::replying("ok"));
        let generator = LlmGenerator::new(llm.clone(), "gpt");
        generator.generate("hello").await.expect("generate");
        let captured = llm.last_messages();
        assert_eq!(captured.len(), 1);
        assert_eq!(captured[0].content, "hello");
    }
}
