//! azwipe: finds and deletes orphaned Azure resources.

use anyhow::{Context, Result};
use azwipe_config::{ConfigOverrides, load_config};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

mod logging;
mod purge;

#[derive(Parser, Debug)]
#[command(name = "azwipe")]
#[command(about = "Clean up orphaned Azure resources", long_about = None)]
struct Cli {
    /// Path to the KDL configuration file
    #[arg(short, long, env = "AZWIPE_CONFIG")]
    config: Option<PathBuf>,

    /// Subscription ID (overrides config)
    #[arg(short, long)]
    subscription: Option<String>,

    /// Resource group name or glob (overrides config)
    #[arg(short = 'g', long)]
    resource_group: Option<String>,

    /// Verbosity: -v for info, -vv for debug
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,

    /// Actually delete resources (default is a dry run)
    #[arg(long)]
    live_run: bool,

    /// Concurrent deletions within one resource type
    #[arg(long, value_parser = clap::value_parser!(u16).range(1..))]
    concurrency: Option<u16>,

    /// Report format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    output: OutputFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable summary
    Text,
    /// Full report as JSON
    Json,
}

impl Cli {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            subscription: self.subscription.clone(),
            resource_group: self.resource_group.clone(),
            verbosity: self.verbose,
            json_logs: self.json_logs,
            live_run: self.live_run,
            concurrency: self.concurrency.map(usize::from),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_deref()).with_context(|| match &cli.config {
        Some(path) => format!("Failed to load config file: {}", path.display()),
        None => "Failed to load default config".to_string(),
    })?;
    cli.overrides().apply(&mut config);

    logging::init(config.verbosity, config.json_logs);

    purge::run(config, cli.output).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use azwipe_config::{CleanupConfig, Scope};

    #[test]
    fn test_defaults_are_dry_run() {
        let cli = Cli::try_parse_from(["azwipe"]).unwrap();
        let mut config = CleanupConfig::default();
        cli.overrides().apply(&mut config);

        assert!(config.dry_run);
        assert_eq!(cli.output, OutputFormat::Text);
        assert!(config.subscriptions.is_all());
    }

    #[test]
    fn test_flags_override_config() {
        let cli = Cli::try_parse_from([
            "azwipe",
            "-s",
            "sub-1",
            "-g",
            "rg-dev-*",
            "-vv",
            "--json-logs",
            "--live-run",
            "--concurrency",
            "4",
            "--output",
            "json",
        ])
        .unwrap();
        let mut config = CleanupConfig::default();
        cli.overrides().apply(&mut config);

        assert_eq!(config.subscriptions, Scope::Only(vec!["sub-1".to_string()]));
        assert_eq!(config.resource_groups, Scope::Only(vec!["rg-dev-*".to_string()]));
        assert_eq!(config.verbosity, 2);
        assert!(config.json_logs);
        assert!(!config.dry_run);
        assert_eq!(config.concurrency, 4);
        assert_eq!(cli.output, OutputFormat::Json);
    }

    #[test]
    fn test_zero_concurrency_is_rejected() {
        assert!(Cli::try_parse_from(["azwipe", "--concurrency", "0"]).is_err());
    }

    #[test]
    fn test_verbosity_without_flag_keeps_file_value() {
        let cli = Cli::try_parse_from(["azwipe"]).unwrap();
        let mut config = CleanupConfig {
            verbosity: 1,
            ..CleanupConfig::default()
        };
        cli.overrides().apply(&mut config);
        assert_eq!(config.verbosity, 1);
    }
}
