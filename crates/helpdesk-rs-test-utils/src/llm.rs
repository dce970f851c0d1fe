use async_trait::async_trait;
use autoagents_llm::LLMProvider;
use autoagents_llm::ToolCall;
use autoagents_llm::chat::{
    ChatMessage, ChatProvider, ChatResponse, StructuredOutputFormat, Tool,
};
use autoagents_llm::completion::{CompletionProvider, CompletionRequest, CompletionResponse};
use autoagents_llm::embedding::EmbeddingProvider;
use autoagents_llm::error::LLMError;
use autoagents_llm::models::ModelsProvider;
use parking_lot::Mutex;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct TextResponse(String);

impl std::fmt::Display for TextResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl ChatResponse for TextResponse {
    fn text(&self) -> Option<String> {
        Some(self.0.clone())
    }

    fn tool_calls(&self) -> Option<Vec<ToolCall>> {
        None
    }
}

#[derive(Debug, Clone)]
enum Script {
    Reply(String),
    Fail(String),
}

/// Chat provider answering every request from a fixed script and keeping the
/// last messages it saw.
#[derive(Debug, Clone)]
pub struct StubLLM {
    script: Script,
    last_messages: Arc<Mutex<Vec<ChatMessage>>>,
}

impl StubLLM {
    pub fn replying(text: impl Into<String>) -> Self {
        Self::scripted(Script::Reply(text.into()))
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self::scripted(Script::Fail(message.into()))
    }

    fn scripted(script: Script) -> Self {
        Self {
            script,
            last_messages: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn last_messages(&self) -> Vec<ChatMessage> {
        self.last_messages.lock().clone()
    }

    fn outcome(&self) -> Result<String, LLMError> {
        match &self.script {
            Script::Reply(text) => Ok(text.clone()),
            Script::Fail(message) => Err(LLMError::ProviderError(message.clone())),
        }
    }
}

#[async_trait]
impl ChatProvider for StubLLM {
    async fn chat_with_tools(
        &self,
        messages: &[ChatMessage],
        _tools: Option<&[Tool]>,
        _json_schema: Option<StructuredOutputFormat>,
    ) -> Result<Box<dyn ChatResponse>, LLMError> {
        *self.last_messages.lock() = messages.to_vec();
        Ok(Box::new(TextResponse(self.outcome()?)))
    }
}

#[async_trait]
impl CompletionProvider for StubLLM {
    async fn complete(
        &self,
        _req: &CompletionRequest,
        _json_schema: Option<StructuredOutputFormat>,
    ) -> Result<CompletionResponse, LLMError> {
        Ok(CompletionResponse {
            text: self.outcome()?,
        })
    }
}

#[async_trait]
impl EmbeddingProvider for StubLLM {
    async fn embed(&self, _input: Vec<String>) -> Result<Vec<Vec<f32>>, LLMError> {
        Err(LLMError::ProviderError("embeddings unsupported".to_string()))
    }
}

#[async_trait]
impl ModelsProvider for StubLLM {}

impl LLMProvider for StubLLM {}
