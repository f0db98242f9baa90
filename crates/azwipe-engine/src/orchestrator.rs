//! Run orchestration: resolves subscriptions and kinds, then cleans kind by kind.

use azwipe_config::{CleanupConfig, Scope};
use azwipe_core::{
    CleanerReport, Platform, ResourceKind, RunContext, RunReport, RunReportBuilder,
};
use std::collections::HashMap;
use std::time::Instant;
use tracing::{Instrument, info, info_span, warn};

use crate::cleaners::{CLEANERS, CleanerEntry, entry_for};
use crate::{CleanContext, EngineError, FilterPolicy, RetryPolicy, clean};

/// Drives one cleanup run against a platform.
pub struct Orchestrator {
    platform: Platform,
}

impl Orchestrator {
    pub fn new(platform: Platform) -> Self {
        Self { platform }
    }

    /// Run every requested cleaner in dependency order and collect the run report.
    ///
    /// Kinds run strictly one after another. A kind that fails entirely does not
    /// stop the kinds after it. Only invalid filter patterns and a failed
    /// subscription lookup abort the run.
    pub async fn purge(
        &self,
        config: &CleanupConfig,
        ctx: &RunContext,
    ) -> Result<RunReport, EngineError> {
        let span = info_span!("run", run_id = %ctx.run_id, dry_run = ctx.dry_run);
        self.purge_inner(config, ctx).instrument(span).await
    }

    async fn purge_inner(
        &self,
        config: &CleanupConfig,
        ctx: &RunContext,
    ) -> Result<RunReport, EngineError> {
        let filter = FilterPolicy::new(config)?;
        let retry = RetryPolicy::from(&config.retry);
        let mut builder = RunReportBuilder::new(ctx);

        let subscriptions = self.resolve_subscriptions(&config.subscriptions).await?;
        let kinds = resolve_kinds(&config.resource_types);
        if subscriptions.is_empty() {
            warn!("No subscriptions to clean");
            for kind in kinds {
                builder.push(kind, CleanerReport::default());
            }
            return Ok(builder.finish());
        }

        info!(
            subscriptions = subscriptions.len(),
            kinds = ?kinds.iter().map(|k| k.as_str()).collect::<Vec<_>>(),
            "Starting cleanup"
        );

        let clean_ctx = CleanContext {
            run: ctx,
            filter: &filter,
            retry: &retry,
            concurrency: config.concurrency.max(1),
        };

        for kind in kinds {
            let Some(entry) = entry_for(kind) else {
                continue;
            };
            let cleaner = entry.build(&self.platform);
            let started = Instant::now();

            let report = clean(cleaner.as_ref(), &subscriptions, clean_ctx).await;

            info!(
                %kind,
                deleted = report.deleted.len(),
                failed = report.failed.len(),
                skipped = report.skipped.len(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Finished {} cleanup",
                kind.display_name()
            );
            builder.push(kind, report);
        }

        Ok(builder.finish())
    }

    async fn resolve_subscriptions(&self, scope: &Scope) -> Result<Vec<String>, EngineError> {
        match scope {
            Scope::All => {
                let subscriptions = self
                    .platform
                    .inventory
                    .list_enabled_subscriptions()
                    .await
                    .map_err(EngineError::Subscriptions)?;
                info!(count = subscriptions.len(), "Resolved enabled subscriptions");
                Ok(subscriptions)
            }
            Scope::Only(ids) => Ok(ids.clone()),
        }
    }
}

/// Kinds in processing order: every kind after the kinds it depends on.
///
/// Ties are broken by table order, which yields the canonical cleanup order.
pub fn execution_order() -> Vec<ResourceKind> {
    let by_kind: HashMap<ResourceKind, &CleanerEntry> =
        CLEANERS.iter().map(|e| (e.kind, e)).collect();

    let mut visited = HashMap::new();
    let mut result = Vec::with_capacity(CLEANERS.len());
    for entry in &CLEANERS {
        topo_visit(entry.kind, &by_kind, &mut visited, &mut result);
    }
    result
}

fn topo_visit(
    kind: ResourceKind,
    by_kind: &HashMap<ResourceKind, &CleanerEntry>,
    visited: &mut HashMap<ResourceKind, bool>,
    result: &mut Vec<ResourceKind>,
) {
    if visited.get(&kind).copied().unwrap_or(false) {
        return;
    }

    visited.insert(kind, true);

    if let Some(entry) = by_kind.get(&kind) {
        for dep in entry.dependencies {
            topo_visit(*dep, by_kind, visited, result);
        }
    }

    result.push(kind);
}

/// Intersect the processing order with the requested kinds.
fn resolve_kinds(requested: &Scope) -> Vec<ResourceKind> {
    let order = execution_order();
    let Some(values) = requested.values() else {
        return order;
    };

    let mut wanted = Vec::new();
    for value in values {
        match value.parse::<ResourceKind>() {
            Ok(kind) => wanted.push(kind),
            Err(e) => warn!(error = %e, "Ignoring unrecognized resource type"),
        }
    }

    order.into_iter().filter(|k| wanted.contains(k)).collect()
}
