//! Uniform lookups over the ranked knowledge sources.

use crate::error::KnowledgeError;
use crate::model::{FaqEntry, IntentEntry, KnowledgeArticle};
use crate::provider::KnowledgeBase;
use crate::similarity::similarity;
use helpdesk_rs_config::{ResolutionConfig, SimilarityMetric};
use log::{debug, warn};
use parking_lot::Mutex;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use regex::Regex;
use std::sync::Arc;

/// Matching knobs for the lookups.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchOptions {
    /// Intent patterns must score strictly above this.
    pub intent_threshold: f64,
    pub metric: SimilarityMetric,
    pub faq_min_chars: usize,
    pub knowledge_min_chars: usize,
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self::from(&ResolutionConfig::default())
    }
}

impl From<&ResolutionConfig> for MatchOptions {
    fn from(config: &ResolutionConfig) -> Self {
        Self {
            intent_threshold: config.intent_threshold,
            metric: config.metric,
            faq_min_chars: config.faq_min_chars,
            knowledge_min_chars: config.knowledge_min_chars,
        }
    }
}

/// Accepted intent match.
#[derive(Debug, Clone, PartialEq)]
pub struct IntentMatch {
    /// Response drawn from the matched intent.
    pub answer: String,
    pub tag: String,
    /// Similarity of the accepted pattern.
    pub score: f64,
}

/// Caps for the knowledge embedded in a generation prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextLimits {
    pub faqs: usize,
    pub intents: usize,
    pub articles: usize,
}

/// Leading slice of every source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KnowledgeSample {
    pub faqs: Vec<FaqEntry>,
    pub intents: Vec<IntentEntry>,
    pub articles: Vec<KnowledgeArticle>,
}

impl KnowledgeSample {
    pub fn is_empty(&self) -> bool {
        self.faqs.is_empty() && self.intents.is_empty() && self.articles.is_empty()
    }
}

/// Read-only adapter answering FAQ, intent and knowledge lookups.
///
/// Backend errors are logged and treated as a miss.
pub struct KnowledgeSources {
    base: Arc<dyn KnowledgeBase>,
    options: MatchOptions,
    rng: Mutex<StdRng>,
}

impl KnowledgeSources {
    /// Create an adapter drawing random responses from OS entropy.
    pub fn new(base: Arc<dyn KnowledgeBase>, options: MatchOptions) -> Self {
        Self {
            base,
            options,
            rng: Mutex::new(StdRng::from_os_rng()),
        }
    }

    /// Create an adapter with a deterministic response picker.
    pub fn with_seed(base: Arc<dyn KnowledgeBase>, options: MatchOptions, seed: u64) -> Self {
        Self {
            base,
            options,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Build from the resolution config, honoring its optional seed.
    pub fn from_config(base: Arc<dyn KnowledgeBase>, config: &ResolutionConfig) -> Self {
        let options = MatchOptions::from(config);
        match config.seed {
            Some(seed) => Self::with_seed(base, options, seed),
            None => Self::new(base, options),
        }
    }

    pub fn options(&self) -> &MatchOptions {
        &self.options
    }

    /// Canonical answer of the first FAQ whose question and the input contain each other
    /// as whole words.
    pub fn lookup_faq(&self, text: &str) -> Option<String> {
        let input = normalize(text);
        if input.chars().count() < self.options.faq_min_chars {
            return None;
        }
        let faqs = or_miss(self.base.faqs(), "faq")?;
        let input_pattern = phrase_pattern(&input)?;
        faqs.into_iter()
            .filter(|entry| !entry.question.trim().is_empty() && !entry.answer.is_empty())
            .find(|entry| {
                let question = entry.question.trim().to_lowercase();
                input_pattern.is_match(&question)
                    || phrase_pattern(&question).is_some_and(|pattern| pattern.is_match(&input))
            })
            .map(|entry| {
                debug!("faq matched (question={})", entry.question);
                entry.answer
            })
    }

    /// First intent with a pattern scoring above the threshold, answered with one of
    /// its responses at random.
    pub fn lookup_intent(&self, text: &str) -> Option<IntentMatch> {
        let input = text.trim().to_lowercase();
        let intents = or_miss(self.base.intents(), "intent")?;
        for intent in intents {
            for pattern in &intent.patterns {
                let score = similarity(pattern.trim(), &input, self.options.metric);
                if score <= self.options.intent_threshold {
                    continue;
                }
                let Some(answer) = self.pick(&intent.responses) else {
                    break;
                };
                debug!(
                    "intent matched (tag={}, pattern={}, score={:.3})",
                    intent.tag, pattern, score
                );
                return Some(IntentMatch {
                    answer,
                    tag: intent.tag,
                    score,
                });
            }
        }
        None
    }

    /// Content of the first article whose title or body contains the input, or whose
    /// title appears in the input as whole words.
    pub fn lookup_knowledge(&self, text: &str) -> Option<String> {
        let input = normalize(text);
        if input.chars().count() < self.options.knowledge_min_chars {
            return None;
        }
        let articles = or_miss(self.base.articles(), "knowledge")?;
        articles
            .into_iter()
            .filter(|article| !article.content.trim().is_empty())
            .find(|article| {
                let title = article.title.trim().to_lowercase();
                title.contains(&input)
                    || article.content.to_lowercase().contains(&input)
                    || (!title.is_empty()
                        && phrase_pattern(&title).is_some_and(|pattern| pattern.is_match(&input)))
            })
            .map(|article| {
                debug!("knowledge matched (title={})", article.title);
                article.content
            })
    }

    /// Random response of the intent tagged `tag`, compared case-insensitively.
    pub fn tagged_response(&self, tag: &str) -> Option<String> {
        let intents = or_miss(self.base.intents(), "intent")?;
        let intent = intents
            .into_iter()
            .find(|intent| intent.tag.trim().eq_ignore_ascii_case(tag.trim()))?;
        self.pick(&intent.responses)
    }

    /// First entries of each source, capped by `limits`.
    pub fn context_sample(&self, limits: ContextLimits) -> KnowledgeSample {
        KnowledgeSample {
            faqs: take(or_miss(self.base.faqs(), "faq").unwrap_or_default(), limits.faqs),
            intents: take(
                or_miss(self.base.intents(), "intent").unwrap_or_default(),
                limits.intents,
            ),
            articles: take(
                or_miss(self.base.articles(), "knowledge").unwrap_or_default(),
                limits.articles,
            ),
        }
    }

    fn pick(&self, responses: &[String]) -> Option<String> {
        let mut rng = self.rng.lock();
        responses.choose(&mut *rng).cloned()
    }
}

/// Trim, lower-case and drop trailing sentence punctuation.
fn normalize(text: &str) -> String {
    text.trim()
        .trim_end_matches(['?', '!', '.'])
        .trim_end()
        .to_lowercase()
}

/// Case-insensitive literal phrase bounded by non-word characters or the string edges.
fn phrase_pattern(phrase: &str) -> Option<Regex> {
    let source = format!(r"(?i)(?:^|\W){}(?:\W|$)", regex::escape(phrase));
    match Regex::new(&source) {
        Ok(pattern) => Some(pattern),
        Err(err) => {
            warn!(
                "{}",
                KnowledgeError::Regex(format!("phrase={phrase}, err={err}"))
            );
            None
        }
    }
}

fn take<T>(mut items: Vec<T>, limit: usize) -> Vec<T> {
    items.truncate(limit);
    items
}

fn or_miss<T>(result: Result<Vec<T>, KnowledgeError>, source: &str) -> Option<Vec<T>> {
    match result {
        Ok(items) => Some(items),
        Err(err) => {
            warn!("knowledge source unavailable (source={source}, err={err})");
            None
        }
    }
}
