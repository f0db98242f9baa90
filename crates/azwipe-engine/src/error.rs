//! Engine errors. Only run-fatal conditions surface here; per-resource failures are
//! recorded in the report instead.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid glob pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    #[error("failed to resolve subscriptions: {0}")]
    Subscriptions(#[source] azwipe_core::Error),
}
