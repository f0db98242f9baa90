//! Cleanup reports.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{ResourceKind, RunContext, RunId};

/// How a single discovered resource was classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceOutcome {
    /// Deleted, or would be deleted under dry-run.
    Deleted,
    /// Deletion was attempted and did not complete.
    Failed,
    /// Excluded by filters or protected by a lock.
    Skipped,
}

/// Outcome of one cleaner's run.
///
/// Every discovered resource identifier appears in exactly one of the three lists,
/// in discovery order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanerReport {
    pub deleted: Vec<String>,
    pub failed: Vec<String>,
    pub skipped: Vec<String>,
    /// Set when discovery itself failed and nothing could be classified.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discovery_error: Option<String>,
}

impl CleanerReport {
    /// Reduce per-resource outcomes into a report, keeping the iteration order.
    pub fn from_outcomes<I>(outcomes: I) -> Self
    where
        I: IntoIterator<Item = (String, ResourceOutcome)>,
    {
        let mut report = Self::default();
        for (id, outcome) in outcomes {
            report.record(id, outcome);
        }
        report
    }

    /// Report for a kind whose discovery failed.
    pub fn discovery_failed(message: impl Into<String>) -> Self {
        Self {
            discovery_error: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn record(&mut self, id: String, outcome: ResourceOutcome) {
        match outcome {
            ResourceOutcome::Deleted => self.deleted.push(id),
            ResourceOutcome::Failed => self.failed.push(id),
            ResourceOutcome::Skipped => self.skipped.push(id),
        }
    }

    /// Number of classified resources.
    pub fn total(&self) -> usize {
        self.deleted.len() + self.failed.len() + self.skipped.len()
    }
}

/// A cleaner report keyed by the kind that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KindReport {
    pub kind: ResourceKind,
    #[serde(flatten)]
    pub report: CleanerReport,
}

/// Aggregated outcome of a run. Kinds appear in execution order.
///
/// Only [`RunReportBuilder::finish`] creates one; it has no mutating methods.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    run_id: RunId,
    dry_run: bool,
    started_at: DateTime<Utc>,
    finished_at: DateTime<Utc>,
    kinds: Vec<KindReport>,
}

impl RunReport {
    pub fn run_id(&self) -> &RunId {
        &self.run_id
    }

    pub fn dry_run(&self) -> bool {
        self.dry_run
    }

    /// Label for the `deleted` bucket: nothing is deleted under dry-run.
    pub fn action_label(&self) -> &'static str {
        if self.dry_run { "Would delete" } else { "Deleted" }
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn finished_at(&self) -> DateTime<Utc> {
        self.finished_at
    }

    /// Per-kind reports in execution order.
    pub fn kinds(&self) -> &[KindReport] {
        &self.kinds
    }

    /// Kinds in the order they were processed.
    pub fn kind_order(&self) -> Vec<ResourceKind> {
        self.kinds.iter().map(|k| k.kind).collect()
    }

    pub fn get(&self, kind: ResourceKind) -> Option<&CleanerReport> {
        self.kinds.iter().find(|k| k.kind == kind).map(|k| &k.report)
    }

    pub fn total_deleted(&self) -> usize {
        self.kinds.iter().map(|k| k.report.deleted.len()).sum()
    }

    pub fn total_failed(&self) -> usize {
        self.kinds.iter().map(|k| k.report.failed.len()).sum()
    }

    pub fn total_skipped(&self) -> usize {
        self.kinds.iter().map(|k| k.report.skipped.len()).sum()
    }
}

/// Accumulates per-kind reports while a run is in progress.
#[derive(Debug)]
pub struct RunReportBuilder {
    run_id: RunId,
    dry_run: bool,
    started_at: DateTime<Utc>,
    kinds: Vec<KindReport>,
}

impl RunReportBuilder {
    pub fn new(ctx: &RunContext) -> Self {
        Self {
            run_id: ctx.run_id.clone(),
            dry_run: ctx.dry_run,
            started_at: Utc::now(),
            kinds: Vec::new(),
        }
    }

    /// Append the report for `kind`. A kind recorded twice keeps its first report.
    pub fn push(&mut self, kind: ResourceKind, report: CleanerReport) {
        if self.kinds.iter().any(|k| k.kind == kind) {
            return;
        }
        self.kinds.push(KindReport { kind, report });
    }

    pub fn finish(self) -> RunReport {
        RunReport {
            run_id: self.run_id,
            dry_run: self.dry_run,
            started_at: self.started_at,
            finished_at: Utc::now(),
            kinds: self.kinds,
        }
    }
}
