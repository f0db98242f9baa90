//! The per-kind cleaner contract and the classification loop shared by all cleaners.

use async_trait::async_trait;
use azwipe_core::{
    CleanerReport, ResourceKind, ResourceOutcome, ResourceRecord, Result, RunContext,
};
use futures::StreamExt;
use futures::stream;
use std::collections::HashSet;
use tracing::{debug, error, info, warn};

use crate::{FilterPolicy, RetryPolicy};

/// Capability interface implemented once per resource kind.
#[async_trait]
pub trait ResourceCleaner: Send + Sync {
    /// The kind this cleaner handles.
    fn kind(&self) -> ResourceKind;

    /// Kinds that must be fully processed before this one. Only used for ordering.
    fn dependencies(&self) -> &'static [ResourceKind];

    /// Find candidate resources. Read-only; returns the inventory rows unfiltered.
    async fn discover(&self, subscriptions: &[String]) -> Result<Vec<ResourceRecord>>;

    /// Delete one resource, returning once the platform confirms completion.
    async fn delete(&self, resource: &ResourceRecord) -> Result<()>;

    /// Whether the resource is protected from deletion on the platform.
    async fn is_protected(&self, _resource: &ResourceRecord) -> bool {
        false
    }
}

/// Run-scoped values every cleaner needs while classifying.
#[derive(Debug, Clone, Copy)]
pub struct CleanContext<'a> {
    pub run: &'a RunContext,
    pub filter: &'a FilterPolicy,
    pub retry: &'a RetryPolicy,
    /// Maximum concurrent deletions within the kind.
    pub concurrency: usize,
}

/// Discover, filter and delete resources of one kind.
///
/// Each resource is classified independently; a failure never stops its siblings.
/// Outcomes are reduced in discovery order, so the report does not depend on
/// completion order when `concurrency > 1`.
pub async fn clean(
    cleaner: &dyn ResourceCleaner,
    subscriptions: &[String],
    ctx: CleanContext<'_>,
) -> CleanerReport {
    let kind = cleaner.kind();

    let discovered = match cleaner.discover(subscriptions).await {
        Ok(resources) => resources,
        Err(e) => {
            error!(%kind, error = %e, "Discovery failed");
            return CleanerReport::discovery_failed(e.to_string());
        }
    };

    let mut seen = HashSet::new();
    let resources: Vec<ResourceRecord> = discovered
        .into_iter()
        .filter(|r| {
            let first = seen.insert(r.id.clone());
            if !first {
                debug!(%kind, resource_id = %r.id, "Ignoring duplicate inventory row");
            }
            first
        })
        .collect();

    let outcomes: Vec<(String, ResourceOutcome)> = stream::iter(resources.iter())
        .map(move |resource| async move {
            let outcome = classify(cleaner, resource, ctx).await;
            (resource.id.clone(), outcome)
        })
        .buffered(ctx.concurrency.max(1))
        .collect()
        .await;

    CleanerReport::from_outcomes(outcomes)
}

async fn classify(
    cleaner: &dyn ResourceCleaner,
    resource: &ResourceRecord,
    ctx: CleanContext<'_>,
) -> ResourceOutcome {
    let kind = cleaner.kind();

    if let Some(exclusion) = ctx.filter.evaluate(resource) {
        debug!(%kind, resource_id = %resource.id, reason = %exclusion, "Skipping");
        return ResourceOutcome::Skipped;
    }

    if cleaner.is_protected(resource).await {
        warn!(
            %kind,
            resource_id = %resource.id,
            "{} {} has a delete lock, skipping",
            kind.display_name(),
            resource.name
        );
        return ResourceOutcome::Skipped;
    }

    if ctx.run.dry_run {
        info!(%kind, resource_id = %resource.id, "Would delete");
        return ResourceOutcome::Deleted;
    }

    info!(
        %kind,
        subscription = %resource.subscription_id,
        resource_group = %resource.resource_group,
        "Deleting {} {}",
        kind.display_name(),
        resource.name
    );

    let operation = format!("delete {} {}", kind.display_name(), resource.name);
    match ctx.retry.run(&operation, || cleaner.delete(resource)).await {
        Ok(()) => {
            info!(%kind, resource_id = %resource.id, "Deleted");
            ResourceOutcome::Deleted
        }
        Err(e) => {
            error!(%kind, resource_id = %resource.id, error = %e, "Delete failed");
            ResourceOutcome::Failed
        }
    }
}
