//! Knowledge sources for the helpdesk: FAQ entries, intents and articles.

pub mod error;
pub mod model;
pub mod provider;
pub mod similarity;
pub mod sources;

/// Knowledge error type.
pub use error::KnowledgeError;
/// Knowledge record models.
pub use model::{FaqEntry, IntentEntry, KnowledgeArticle};
/// Knowledge base interface and default implementations.
pub use provider::{FileKnowledgeBase, InMemoryKnowledgeBase, KnowledgeBase};
/// String similarity scoring.
pub use similarity::{gestalt_ratio, similarity};
/// Lookup adapter over a knowledge base.
pub use sources::{ContextLimits, IntentMatch, KnowledgeSample, KnowledgeSources, MatchOptions};
