//! KDL configuration parsing for azwipe.
//!
//! This crate handles:
//! - The cleanup configuration model and its defaults
//! - Parsing configuration files (azwipe.kdl)
//! - Overlaying command-line overrides on top of file values

pub mod cleanup;
pub mod error;
pub mod parse;

pub use cleanup::{
    ALL, CleanupConfig, ConfigOverrides, RetrySettings, Scope, TagFilters, load_config,
};
pub use error::{ConfigError, ConfigResult};
pub use parse::parse_config;
