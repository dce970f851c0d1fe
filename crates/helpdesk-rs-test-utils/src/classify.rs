use helpdesk_rs_protocol::{Classifier, Priority, Sentiment};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Returns fixed labels and counts predictions.
#[derive(Debug)]
pub struct StubClassifier {
    sentiment: Sentiment,
    priority: Priority,
    calls: AtomicUsize,
}

impl StubClassifier {
    pub fn new(sentiment: Sentiment, priority: Priority) -> Self {
        Self {
            sentiment,
            priority,
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of predictions made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Classifier for StubClassifier {
    fn predict_sentiment(&self, _text: &str) -> Sentiment {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.sentiment
    }

    fn predict_priority(&self, _text: &str) -> Priority {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.priority
    }
}
