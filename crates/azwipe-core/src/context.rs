//! Per-run context.

use crate::RunId;

/// Values scoped to one cleanup run, threaded through the orchestrator into every cleaner.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub run_id: RunId,
    pub dry_run: bool,
}

impl RunContext {
    pub fn new(dry_run: bool) -> Self {
        Self {
            run_id: RunId::new(),
            dry_run,
        }
    }
}
