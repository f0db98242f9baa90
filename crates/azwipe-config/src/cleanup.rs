//! Cleanup configuration model.

use crate::{ConfigError, ConfigResult, parse_config};
use azwipe_core::TransientKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

/// Sentinel value selecting everything.
pub const ALL: &str = "all";

/// A target set that is either everything or an explicit list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Scope {
    #[default]
    All,
    Only(Vec<String>),
}

impl Scope {
    /// Build a scope from configured values. Any `all` entry selects everything.
    pub fn from_values(values: Vec<String>) -> Self {
        if values.iter().any(|v| v == ALL) {
            Scope::All
        } else {
            Scope::Only(values)
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Scope::All)
    }

    /// The explicit values, or `None` for [`Scope::All`].
    pub fn values(&self) -> Option<&[String]> {
        match self {
            Scope::All => None,
            Scope::Only(values) => Some(values),
        }
    }
}

/// Tag include/exclude rules: tag key to the set of matching values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagFilters {
    pub include: BTreeMap<String, Vec<String>>,
    pub exclude: BTreeMap<String, Vec<String>>,
}

/// Retry budget for platform delete calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrySettings {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    /// Transient failure classes worth retrying.
    pub retryable: Vec<TransientKind>,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
            retryable: TransientKind::ALL.to_vec(),
        }
    }
}

/// Configuration for a cleanup run. Built once, then treated as immutable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanupConfig {
    pub subscriptions: Scope,
    /// Resource group glob patterns.
    pub resource_groups: Scope,
    /// Requested resource kinds, kept as written so unknown kinds can be reported.
    pub resource_types: Scope,
    pub tag_filters: TagFilters,
    /// Resource name glob patterns that are never deleted.
    pub exclude_patterns: Vec<String>,
    /// True unless explicitly overridden.
    pub dry_run: bool,
    pub json_logs: bool,
    pub verbosity: u8,
    /// Maximum concurrent deletions within one resource kind.
    pub concurrency: usize,
    pub retry: RetrySettings,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            subscriptions: Scope::All,
            resource_groups: Scope::All,
            resource_types: Scope::All,
            tag_filters: TagFilters::default(),
            exclude_patterns: Vec::new(),
            dry_run: true,
            json_logs: false,
            verbosity: 0,
            concurrency: 1,
            retry: RetrySettings::default(),
        }
    }
}

/// Command-line values that take precedence over the config file.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub subscription: Option<String>,
    pub resource_group: Option<String>,
    /// Zero leaves the file value untouched.
    pub verbosity: u8,
    pub json_logs: bool,
    /// The only way to turn dry-run off from the command line.
    pub live_run: bool,
    pub concurrency: Option<usize>,
}

impl ConfigOverrides {
    pub fn apply(self, config: &mut CleanupConfig) {
        if let Some(subscription) = self.subscription {
            config.subscriptions = Scope::from_values(vec![subscription]);
        }
        if let Some(resource_group) = self.resource_group {
            config.resource_groups = Scope::from_values(vec![resource_group]);
        }
        if self.verbosity > 0 {
            config.verbosity = self.verbosity;
        }
        if self.json_logs {
            config.json_logs = true;
        }
        if self.live_run {
            config.dry_run = false;
        }
        if let Some(concurrency) = self.concurrency {
            config.concurrency = concurrency.max(1);
        }
    }
}

/// Load configuration from `path`, or defaults when no path is given.
pub fn load_config(path: Option<&Path>) -> ConfigResult<CleanupConfig> {
    let Some(path) = path else {
        return Ok(CleanupConfig::default());
    };

    if !path.exists() {
        return Err(ConfigError::NotFound(path.to_path_buf()));
    }

    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}
