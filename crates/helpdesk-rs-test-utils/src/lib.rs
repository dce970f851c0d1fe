//! Test helpers shared across helpdesk crates.

pub mod classify;
pub mod generate;
pub mod knowledge;
pub mod llm;
pub mod notify;

pub use classify::StubClassifier;
pub use generate::{FailingGenerator, FixedGenerator, RecordingGenerator, SlowGenerator};
pub use knowledge::sample_knowledge;
pub use llm::{StubLLM, TextResponse};
pub use notify::{FailingNotifier, RecordingNotifier};
