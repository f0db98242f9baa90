//! Deletion eligibility.
//!
//! Rules run in a fixed order and the first failing rule excludes the resource:
//! name exclude patterns, tag excludes, tag includes, resource group patterns.

use azwipe_config::{CleanupConfig, Scope};
use azwipe_core::ResourceRecord;
use glob::Pattern;
use std::collections::BTreeMap;
use std::fmt;

use crate::EngineError;

/// Why a resource was excluded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Exclusion {
    /// The name matched an exclude pattern.
    NamePattern(String),
    /// An excluded tag value is present.
    ExcludedTag { key: String, value: String },
    /// Include rules exist and none matched.
    NoIncludedTag,
    /// The resource group matched no configured pattern.
    ResourceGroup(String),
}

impl fmt::Display for Exclusion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Exclusion::NamePattern(p) => write!(f, "name matches exclude pattern '{}'", p),
            Exclusion::ExcludedTag { key, value } => write!(f, "tag {}={} is excluded", key, value),
            Exclusion::NoIncludedTag => f.write_str("no included tag present"),
            Exclusion::ResourceGroup(rg) => write!(f, "resource group '{}' not targeted", rg),
        }
    }
}

/// Compiled filter rules for one run.
#[derive(Debug, Clone)]
pub struct FilterPolicy {
    exclude_names: Vec<Pattern>,
    tag_include: BTreeMap<String, Vec<String>>,
    tag_exclude: BTreeMap<String, Vec<String>>,
    /// `None` targets every resource group.
    resource_groups: Option<Vec<Pattern>>,
}

impl FilterPolicy {
    /// Compile the filter rules of `config`, rejecting invalid glob patterns.
    pub fn new(config: &CleanupConfig) -> Result<Self, EngineError> {
        let exclude_names = compile_all(&config.exclude_patterns)?;
        let resource_groups = match &config.resource_groups {
            Scope::All => None,
            Scope::Only(patterns) => Some(compile_all(patterns)?),
        };

        Ok(Self {
            exclude_names,
            tag_include: config.tag_filters.include.clone(),
            tag_exclude: config.tag_filters.exclude.clone(),
            resource_groups,
        })
    }

    /// Whether `resource` is eligible for deletion.
    pub fn should_delete(&self, resource: &ResourceRecord) -> bool {
        self.evaluate(resource).is_none()
    }

    /// The first rule that excludes `resource`, or `None` if every rule passes.
    pub fn evaluate(&self, resource: &ResourceRecord) -> Option<Exclusion> {
        if let Some(pattern) = self
            .exclude_names
            .iter()
            .find(|p| p.matches(&resource.name))
        {
            return Some(Exclusion::NamePattern(pattern.as_str().to_string()));
        }

        for (key, values) in &self.tag_exclude {
            if let Some(value) = resource.tags.get(key) {
                if values.contains(value) {
                    return Some(Exclusion::ExcludedTag {
                        key: key.clone(),
                        value: value.clone(),
                    });
                }
            }
        }

        if !self.tag_include.is_empty() {
            let included = self.tag_include.iter().any(|(key, values)| {
                resource
                    .tags
                    .get(key)
                    .is_some_and(|value| values.contains(value))
            });
            if !included {
                return Some(Exclusion::NoIncludedTag);
            }
        }

        if let Some(patterns) = &self.resource_groups {
            if !patterns.iter().any(|p| p.matches(&resource.resource_group)) {
                return Some(Exclusion::ResourceGroup(resource.resource_group.clone()));
            }
        }

        None
    }
}

fn compile_all(patterns: &[String]) -> Result<Vec<Pattern>, EngineError> {
    patterns
        .iter()
        .map(|p| {
            Pattern::new(p).map_err(|source| EngineError::InvalidPattern {
                pattern: p.clone(),
                source,
            })
        })
        .collect()
}
