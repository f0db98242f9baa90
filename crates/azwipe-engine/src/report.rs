//! Human-readable run summary.
//!
//! The run report stays authoritative; sample truncation only happens here.

use azwipe_core::RunReport;
use std::fmt;

const DELETED_SAMPLE: usize = 10;
const FAILED_SAMPLE: usize = 5;

/// Display adapter printing a run report as a text summary.
pub struct Summary<'a>(pub &'a RunReport);

impl fmt::Display for Summary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let report = self.0;
        let action = report.action_label();

        writeln!(f, "=== Azure Cleanup Report ===")?;
        writeln!(
            f,
            "Run: {}{}",
            report.run_id(),
            if report.dry_run() { " (dry run)" } else { "" }
        )?;

        for entry in report.kinds() {
            writeln!(f)?;
            writeln!(f, "Resource: {}", entry.kind)?;
            if let Some(error) = &entry.report.discovery_error {
                writeln!(f, "  Discovery failed: {}", error)?;
            }
            write_sample(f, action, &entry.report.deleted, DELETED_SAMPLE)?;
            write_sample(f, "Failed", &entry.report.failed, FAILED_SAMPLE)?;
            writeln!(f, "  Skipped: {}", entry.report.skipped.len())?;
        }

        writeln!(f)?;
        write!(
            f,
            "Total: {} {}, {} failed, {} skipped",
            report.total_deleted(),
            action.to_lowercase(),
            report.total_failed(),
            report.total_skipped()
        )
    }
}

fn write_sample(f: &mut fmt::Formatter<'_>, label: &str, ids: &[String], cap: usize) -> fmt::Result {
    writeln!(f, "  {}:", label)?;
    if ids.is_empty() {
        return writeln!(f, "    None");
    }
    for id in ids.iter().take(cap) {
        writeln!(f, "    - {}", id)?;
    }
    if ids.len() > cap {
        writeln!(f, "    ... and {} more", ids.len() - cap)?;
    }
    Ok(())
}
