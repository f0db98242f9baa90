//! The cleanup run.

use anyhow::{Context, Result};
use azwipe_azure::{ChainedCredential, azure_platform};
use azwipe_config::CleanupConfig;
use azwipe_core::{CredentialProvider, RunContext};
use azwipe_engine::{FilterPolicy, Orchestrator, Summary};
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::OutputFormat;

/// Seconds the user has to cancel a live run.
const COUNTDOWN_SECS: u64 = 5;

pub async fn run(config: CleanupConfig, output: OutputFormat) -> Result<()> {
    let ctx = RunContext::new(config.dry_run);
    info!(run_id = %ctx.run_id, dry_run = ctx.dry_run, "azwipe starting");

    // Fail on bad patterns before the countdown rather than after it.
    FilterPolicy::new(&config).context("Invalid filter configuration")?;

    let credential = Arc::new(ChainedCredential::new());
    credential
        .access_token()
        .await
        .context("Failed to acquire Azure credentials")?;
    let platform = azure_platform(credential).context("Failed to set up the Azure client")?;

    if !ctx.dry_run && !confirm_live_run(COUNTDOWN_SECS).await {
        info!("Cancelled by user");
        eprintln!("Cancelled.");
        return Ok(());
    }

    let report = Orchestrator::new(platform)
        .purge(&config, &ctx)
        .await
        .context("Cleanup run failed")?;

    match output {
        OutputFormat::Text => println!("{}", Summary(&report)),
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string_pretty(&report).context("Failed to serialize report")?
        ),
    }

    Ok(())
}

/// Count down before a live run. Returns `false` if Ctrl-C arrives first.
async fn confirm_live_run(seconds: u64) -> bool {
    warn!("LIVE RUN MODE - resources WILL be deleted");

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    for remaining in (1..=seconds).rev() {
        eprint!("\rStarting in {}s... (Ctrl+C to cancel)", remaining);
        let _ = std::io::stderr().flush();

        tokio::select! {
            _ = tokio::time::sleep(Duration::from_secs(1)) => {}
            _ = &mut ctrl_c => {
                eprintln!();
                return false;
            }
        }
    }

    eprint!("\r{:40}\r", "");
    true
}
