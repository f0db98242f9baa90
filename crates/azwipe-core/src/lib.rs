//! Core domain types and traits for azwipe.
//!
//! This crate contains:
//! - Resource records and resource kinds
//! - Per-kind and per-run cleanup reports
//! - The run identifier and run context
//! - Collaborator traits (inventory, delete, locks, credentials)
//! - The platform failure taxonomy

pub mod context;
pub mod credential;
pub mod error;
pub mod id;
pub mod inventory;
pub mod platform;
pub mod report;
pub mod resource;

pub use context::RunContext;
pub use credential::{AccessToken, CredentialProvider};
pub use error::{Error, Result, TransientKind};
pub use id::RunId;
pub use inventory::{InventorySource, OrphanQuery};
pub use platform::{DeleteTarget, LockInspector, Platform, ResourceDeleter};
pub use report::{CleanerReport, KindReport, ResourceOutcome, RunReport, RunReportBuilder};
pub use resource::{CLEANUP_ORDER, ResourceKind, ResourceRecord, UnknownResourceKind};
