//! Cleanup orchestration for azwipe.
//!
//! Discovers orphaned resources kind by kind, in dependency order, filters them
//! against the run configuration and deletes the survivors with bounded retries.

pub mod cleaner;
pub mod cleaners;
pub mod error;
pub mod filter;
pub mod orchestrator;
pub mod report;
pub mod retry;

#[cfg(test)]
pub(crate) mod testing;

pub use cleaner::{CleanContext, ResourceCleaner, clean};
pub use cleaners::{CLEANERS, CleanerEntry, entry_for};
pub use error::EngineError;
pub use filter::{Exclusion, FilterPolicy};
pub use orchestrator::{Orchestrator, execution_order};
pub use report::Summary;
pub use retry::RetryPolicy;
