use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use clap::{Parser, Subcommand};
use pagewatch_service::Orchestrator;
use pagewatch_service::config::Config;
use pagewatch_service::reports::{DEFAULT_REPORT_DAYS, ReportScope};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "pagewatch")]
#[command(about = "Website uptime and content change monitor")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the scheduler until interrupted
    Run,

    /// Run one check pass and print the results
    Check {
        /// Check every active site, even when not due
        #[arg(short, long)]
        force: bool,
    },

    /// Print an SLA report as JSON
    Report {
        /// Site id; all active sites when omitted
        #[arg(short, long)]
        site: Option<Uuid>,

        /// Window length in days
        #[arg(short, long, default_value_t = DEFAULT_REPORT_DAYS)]
        days: i64,
    },

    /// Print the effective configuration
    Config,
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value).context("failed to serialize output")?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    logger::init_tracing();

    let cli = Cli::parse();
    let config = Config::from_config(cli.config.as_ref()).context("failed to load configuration")?;

    match cli.command {
        Commands::Config => {
            print!("{config}");
        }
        Commands::Run => {
            let mut orchestrator = Orchestrator::open(config).await?;
            orchestrator.run().await?;
            info!("Scheduler stopped");
        }
        Commands::Check { force } => {
            let orchestrator = Orchestrator::open(config).await?;
            let summary = if force {
                orchestrator.run_all_checks().await?
            } else {
                orchestrator.run_due_checks().await?
            };
            print_json(&summary)?;
        }
        Commands::Report { site, days } => {
            anyhow::ensure!(days > 0, "--days must be positive");
            let orchestrator = Orchestrator::open(config).await?;
            let scope = site.map_or(ReportScope::AllActive, ReportScope::Site);
            let end = Utc::now();
            let report = orchestrator.sla_report(scope, Some(end - Duration::days(days)), Some(end)).await?;
            print_json(&report)?;
        }
    }

    Ok(())
}
