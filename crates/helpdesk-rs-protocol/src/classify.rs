use crate::{Priority, Sentiment};

/// Black-box sentiment and priority predictor.
pub trait Classifier: Send + Sync {
    /// Predict the sentiment of a user question.
    fn predict_sentiment(&self, text: &str) -> Sentiment;

    /// Predict the urgency of a user question.
    fn predict_priority(&self, text: &str) -> Priority;
}
