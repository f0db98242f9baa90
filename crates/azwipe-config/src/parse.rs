//! Cleanup configuration parsing.

use crate::{CleanupConfig, ConfigError, ConfigResult, RetrySettings, Scope, TagFilters};
use azwipe_core::TransientKind;
use kdl::{KdlDocument, KdlNode};
use std::collections::BTreeMap;
use std::time::Duration;

/// Parse a cleanup configuration from KDL text. Absent fields keep their defaults.
pub fn parse_config(kdl: &str) -> ConfigResult<CleanupConfig> {
    let doc: KdlDocument = kdl.parse()?;

    let mut config = CleanupConfig::default();

    for node in doc.nodes() {
        match node.name().value() {
            "subscriptions" => {
                config.subscriptions = parse_scope(node, "subscriptions")?;
            }
            "resource_groups" | "resource-groups" => {
                config.resource_groups = parse_scope(node, "resource_groups")?;
            }
            "resource_types" | "resource-types" => {
                config.resource_types = parse_scope(node, "resource_types")?;
            }
            "exclude_patterns" | "exclude-patterns" => {
                config.exclude_patterns = get_all_string_args(node);
            }
            "tag_filters" | "tag-filters" => {
                config.tag_filters = parse_tag_filters(node);
            }
            "dry_run" | "dry-run" => {
                config.dry_run = require_bool_arg(node, "dry_run")?;
            }
            "json_logs" | "json-logs" => {
                config.json_logs = require_bool_arg(node, "json_logs")?;
            }
            "verbosity" => {
                config.verbosity = require_int_arg(node, "verbosity")?;
            }
            "concurrency" => {
                config.concurrency = require_int_arg(node, "concurrency")?;
            }
            "retry" => {
                config.retry = parse_retry(node)?;
            }
            _ => {} // Ignore unknown nodes
        }
    }

    validate(&config)?;
    Ok(config)
}

fn parse_scope(node: &KdlNode, field: &str) -> ConfigResult<Scope> {
    let values = get_all_string_args(node);
    if values.is_empty() {
        return Err(ConfigError::invalid(
            field,
            "expected \"all\" or at least one value",
        ));
    }
    Ok(Scope::from_values(values))
}

fn parse_tag_filters(node: &KdlNode) -> TagFilters {
    let mut filters = TagFilters::default();

    if let Some(children) = node.children() {
        for child in children.nodes() {
            match child.name().value() {
                "include" => filters.include = parse_tag_rules(child),
                "exclude" => filters.exclude = parse_tag_rules(child),
                _ => {}
            }
        }
    }

    filters
}

fn parse_tag_rules(node: &KdlNode) -> BTreeMap<String, Vec<String>> {
    let mut rules = BTreeMap::new();

    if let Some(children) = node.children() {
        for child in children.nodes() {
            let key = child.name().value().to_string();
            rules
                .entry(key)
                .or_insert_with(Vec::new)
                .extend(get_all_string_args(child));
        }
    }

    rules
}

fn parse_retry(node: &KdlNode) -> ConfigResult<RetrySettings> {
    let mut retry = RetrySettings::default();

    if let Some(children) = node.children() {
        for child in children.nodes() {
            match child.name().value() {
                "max_attempts" | "max-attempts" => {
                    retry.max_attempts = require_int_arg(child, "retry.max_attempts")?;
                }
                "base_delay_ms" | "base-delay-ms" => {
                    let ms: u64 = require_int_arg(child, "retry.base_delay_ms")?;
                    retry.base_delay = Duration::from_millis(ms);
                }
                "max_delay_ms" | "max-delay-ms" => {
                    let ms: u64 = require_int_arg(child, "retry.max_delay_ms")?;
                    retry.max_delay = Duration::from_millis(ms);
                }
                "retryable" => {
                    retry.retryable = parse_retryable(child)?;
                }
                _ => {}
            }
        }
    }

    Ok(retry)
}

fn parse_retryable(node: &KdlNode) -> ConfigResult<Vec<TransientKind>> {
    let names = get_all_string_args(node);
    if names.is_empty() {
        return Err(ConfigError::invalid(
            "retry.retryable",
            "expected at least one transient class",
        ));
    }

    let mut kinds = Vec::new();
    for name in names {
        let kind = TransientKind::from_name(&name).ok_or_else(|| {
            ConfigError::invalid(
                "retry.retryable",
                format!(
                    "unknown transient class '{}', expected one of throttled, unavailable, gateway_timeout, connection",
                    name
                ),
            )
        })?;
        if !kinds.contains(&kind) {
            kinds.push(kind);
        }
    }
    Ok(kinds)
}

fn validate(config: &CleanupConfig) -> ConfigResult<()> {
    if config.concurrency == 0 {
        return Err(ConfigError::invalid("concurrency", "must be at least 1"));
    }
    if config.retry.max_attempts == 0 {
        return Err(ConfigError::invalid(
            "retry.max_attempts",
            "must be at least 1",
        ));
    }
    if config.retry.base_delay > config.retry.max_delay {
        return Err(ConfigError::invalid(
            "retry.base_delay_ms",
            "must not exceed retry.max_delay_ms",
        ));
    }
    Ok(())
}

// Helper functions for extracting values from KDL nodes

fn get_all_string_args(node: &KdlNode) -> Vec<String> {
    node.entries()
        .iter()
        .filter(|e| e.name().is_none())
        .filter_map(|e| e.value().as_string())
        .map(|s| s.to_string())
        .collect()
}

fn require_bool_arg(node: &KdlNode, field: &str) -> ConfigResult<bool> {
    node.entries()
        .iter()
        .find(|e| e.name().is_none())
        .and_then(|e| e.value().as_bool())
        .ok_or_else(|| ConfigError::invalid(field, "expected #true or #false"))
}

fn require_int_arg<T: TryFrom<i128>>(node: &KdlNode, field: &str) -> ConfigResult<T> {
    let value = node
        .entries()
        .iter()
        .find(|e| e.name().is_none())
        .and_then(|e| e.value().as_integer())
        .ok_or_else(|| ConfigError::invalid(field, "expected an integer"))?;

    T::try_from(value).map_err(|_| ConfigError::invalid(field, format!("{} is out of range", value)))
}
