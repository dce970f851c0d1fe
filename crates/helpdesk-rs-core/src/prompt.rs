//! Prompt assembly for the generative fallback.

use helpdesk_rs_config::{AssistantConfig, GenerationConfig};
use helpdesk_rs_knowledge::{ContextLimits, KnowledgeSample};

/// Closing instruction appended after the user input.
const RESPOND_INSTRUCTION: &str = "Respond professionally and clearly based on the context above.";

/// Builds generation prompts from a knowledge sample and the assistant persona.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    organization: String,
    instruction: Option<String>,
    limits: ContextLimits,
}

impl PromptBuilder {
    pub fn new(assistant: &AssistantConfig, generation: &GenerationConfig) -> Self {
        Self {
            organization: assistant.organization.clone(),
            instruction: generation
                .instruction
                .as_ref()
                .map(|instruction| instruction.trim().to_string())
                .filter(|instruction| !instruction.is_empty()),
            limits: ContextLimits {
                faqs: generation.faq_context_limit,
                intents: generation.intent_context_limit,
                articles: generation.knowledge_context_limit,
            },
        }
    }

    /// Caps used when sampling knowledge for a prompt.
    pub fn limits(&self) -> ContextLimits {
        self.limits
    }

    /// Compose the full prompt for one question.
    pub fn build(&self, sample: &KnowledgeSample, input: &str) -> String {
        let mut sections = Vec::new();
        sections.push(format!(
            "You are a support assistant for {}.",
            self.organization
        ));
        if let Some(instruction) = &self.instruction {
            sections.push(instruction.clone());
        }
        if !sample.faqs.is_empty() {
            let faqs = sample
                .faqs
                .iter()
                .map(|entry| format!("Q: {}\nA: {}", entry.question, entry.answer))
                .collect::<Vec<_>>()
                .join("\n");
            sections.push(format!("## FAQ\n{faqs}"));
        }
        if !sample.intents.is_empty() {
            let intents = sample
                .intents
                .iter()
                .map(|intent| {
                    format!(
                        "- {}: patterns [{}]; responses [{}]",
                        intent.tag,
                        intent.patterns.join(", "),
                        intent.responses.join(" | ")
                    )
                })
                .collect::<Vec<_>>()
                .join("\n");
            sections.push(format!("## Intents\n{intents}"));
        }
        if !sample.articles.is_empty() {
            let articles = sample
                .articles
                .iter()
                .map(|article| format!("### {}\n{}", article.title, article.content))
                .collect::<Vec<_>>()
                .join("\n\n");
            sections.push(format!("## Knowledge\n{articles}"));
        }
        sections.push(format!("## User\n{}", input.trim()));
        sections.push(RESPOND_INSTRUCTION.to_string());
        sections.join("\n\n")
    }
}
