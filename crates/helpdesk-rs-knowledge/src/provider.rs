//! Knowledge base implementations.

use crate::error::KnowledgeError;
use crate::model::{
    FaqEntry, IntentEntry, KnowledgeArticle, articles_from_value, faqs_from_value,
    intents_from_value,
};
use log::{debug, info};
use serde_json::Value;
use std::path::{Path, PathBuf};

/// FAQ file name inside a knowledge directory.
pub const FAQ_FILE: &str = "faq.json";
/// Intent file name inside a knowledge directory.
pub const INTENTS_FILE: &str = "default_chat.json";
/// Article file name inside a knowledge directory.
pub const ARTICLES_FILE: &str = "knowledge.json";

/// Read-only access to the three structured answer sources.
///
/// Collections are returned in storage order.
pub trait KnowledgeBase: Send + Sync {
    /// All FAQ entries.
    fn faqs(&self) -> Result<Vec<FaqEntry>, KnowledgeError>;

    /// All intents that carry at least one response.
    fn intents(&self) -> Result<Vec<IntentEntry>, KnowledgeError>;

    /// All knowledge articles.
    fn articles(&self) -> Result<Vec<KnowledgeArticle>, KnowledgeError>;
}

/// Directory-backed knowledge base, re-read on every call.
#[derive(Debug, Clone)]
pub struct FileKnowledgeBase {
    /// Directory holding the JSON collections.
    root: PathBuf,
}

impl FileKnowledgeBase {
    /// Create a knowledge base over the given directory. The directory may be empty.
    pub fn new(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref().to_path_buf();
        info!("initialized file knowledge base (root={})", root.display());
        Self { root }
    }

    /// Directory this knowledge base reads from.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Read a collection file, treating a missing file as `None`.
    fn read_collection(&self, name: &str) -> Result<Option<(Value, String)>, KnowledgeError> {
        let path = self.root.join(name);
        if !path.exists() {
            debug!("knowledge collection missing (path={})", path.display());
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&path)?;
        if contents.trim().is_empty() {
            return Ok(None);
        }
        let value: Value = serde_json::from_str(&contents)?;
        Ok(Some((value, path.display().to_string())))
    }
}

impl KnowledgeBase for FileKnowledgeBase {
    fn faqs(&self) -> Result<Vec<FaqEntry>, KnowledgeError> {
        Ok(self
            .read_collection(FAQ_FILE)?
            .map(|(value, origin)| faqs_from_value(value, &origin))
            .unwrap_or_default())
    }

    fn intents(&self) -> Result<Vec<IntentEntry>, KnowledgeError> {
        Ok(self
            .read_collection(INTENTS_FILE)?
            .map(|(value, origin)| intents_from_value(value, &origin))
            .unwrap_or_default())
    }

    fn articles(&self) -> Result<Vec<KnowledgeArticle>, KnowledgeError> {
        Ok(self
            .read_collection(ARTICLES_FILE)?
            .map(|(value, origin)| articles_from_value(value, &origin))
            .unwrap_or_default())
    }
}

/// Knowledge held in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryKnowledgeBase {
    faqs: Vec<FaqEntry>,
    intents: Vec<IntentEntry>,
    articles: Vec<KnowledgeArticle>,
}

impl InMemoryKnowledgeBase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_faqs(mut self, faqs: impl IntoIterator<Item = FaqEntry>) -> Self {
        self.faqs.extend(faqs);
        self
    }

    /// Add intents; those without responses are ignored.
    pub fn with_intents(mut self, intents: impl IntoIterator<Item = IntentEntry>) -> Self {
        self.intents
            .extend(intents.into_iter().filter(|intent| !intent.responses.is_empty()));
        self
    }

    pub fn with_articles(mut self, articles: impl IntoIterator<Item = KnowledgeArticle>) -> Self {
        self.articles.extend(articles);
        self
    }
}

impl KnowledgeBase for InMemoryKnowledgeBase {
    fn faqs(&self) -> Result<Vec<FaqEntry>, KnowledgeError> {
        Ok(self.faqs.clone())
    }

    fn intents(&self) -> Result<Vec<IntentEntry>, KnowledgeError> {
        Ok(self.intents.clone())
    }

    fn articles(&self) -> Result<Vec<KnowledgeArticle>, KnowledgeError> {
        Ok(self.articles.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::{FAQ_FILE, FileKnowledgeBase, INTENTS_FILE, InMemoryKnowledgeBase, KnowledgeBase};
    use crate::{FaqEntry, IntentEntry, KnowledgeSources, MatchOptions};
    use pretty_assertions::assert_eq;
    use std::sync::Arc;
    use tempfile::tempdir;

    #[test]
    fn missing_files_read_as_empty() {
        let temp = tempdir().expect("tempdir");
        let kb = FileKnowledgeBase::new(temp.path());
        assert!(kb.faqs().expect("faqs").is_empty());
        assert!(kb.intents().expect("intents").is_empty());
        assert!(kb.articles().expect("articles").is_empty());
    }

    #[test]
    fn file_changes_are_visible_without_restart() {
        let temp = tempdir().expect("tempdir");
        let kb = FileKnowledgeBase::new(temp.path());
        std::fs::write(
            temp.path().join(FAQ_FILE),
            r#"[{ "question": "vpn", "answer": "Use the client" }]"#,
        )
        .expect("write");
        assert_eq!(kb.faqs().expect("faqs").len(), 1);

        std::fs::write(
            temp.path().join(FAQ_FILE),
            r#"[{ "question": "vpn", "answer": "a" }, { "question": "wifi", "answer": "b" }]"#,
        )
        .expect("write");
        assert_eq!(kb.faqs().expect("faqs").len(), 2);
    }

    #[test]
    fn faq_map_lookup_prefers_earlier_entries() {
        let temp = tempdir().expect("tempdir");
        std::fs::write(
            temp.path().join(FAQ_FILE),
            r#"{ "vpn": "first in storage", "alpha vpn": "second in storage" }"#,
        )
        .expect("write");
        let sources = KnowledgeSources::new(
            Arc::new(FileKnowledgeBase::new(temp.path())),
            MatchOptions::default(),
        );
        assert_eq!(
            sources.lookup_faq("alpha vpn help"),
            Some("first in storage".to_string())
        );
    }

    #[test]
    fn invalid_json_is_an_error() {
        let temp = tempdir().expect("tempdir");
        std::fs::write(temp.path().join(INTENTS_FILE), "{ not json").expect("write");
        let kb = FileKnowledgeBase::new(temp.path());
        assert!(kb.intents().is_err());
    }

    #[test]
    fn in_memory_ignores_intents_without_responses() {
        let kb = InMemoryKnowledgeBase::new()
            .with_faqs([FaqEntry::new("q", "a")])
            .with_intents([
                IntentEntry::new("greeting", ["hi"], ["Hello"]),
                IntentEntry::new("empty", ["x"], Vec::<String>::new()),
            ]);
        assert_eq!(kb.intents().expect("intents").len(), 1);
        assert_eq!(kb.faqs().expect("faqs").len(), 1);
    }
}
