//! Public SDK surface for the helpdesk.
//!
//! This crate re-exports the core building blocks and provides a small
//! initialization helper to keep consumer setup consistent.

/// Re-export for convenience.
pub use helpdesk_rs_config as config;
pub use helpdesk_rs_core as core;
/// Re-export for convenience.
pub use helpdesk_rs_knowledge as knowledge;
/// Re-export for convenience.
pub use helpdesk_rs_protocol as protocol;

pub use helpdesk_rs_core::{Helpdesk, HelpdeskBuilder, SessionContext, Submission};

/// Initialize logging with millisecond timestamps, honoring `RUST_LOG`.
///
/// A no-op unless the `logging` feature is enabled. Later calls are ignored.
#[inline]
pub fn init_logging() {
    #[cfg(feature = "logging")]
    {
        let _ = env_logger::builder()
            .format_timestamp_millis()
            .parse_default_env()
            .try_init();
    }
}
