pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::anyhow;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use pantree_core::config::{LogFormat, LoggingConfig};
use tracing::Level;

#[derive(Debug, Parser)]
#[command(
    name = "pantree",
    about = "Pantree subscribe & save analysis CLI",
    long_about = "Score how regularly customers rebuy grocery items and suggest subscription cadences.",
    after_help = "Examples:\n  pantree analyze large_dataset --limit 3\n  pantree config\n  pantree doctor --json"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Analyze receipt batches and print subscription recommendations as JSON")]
    Analyze {
        #[arg(help = "Directory holding batch_*.json receipt files (overrides dataset.path)")]
        dataset_dir: Option<PathBuf>,
        #[arg(long, help = "Only analyze this customer id")]
        customer: Option<String>,
        #[arg(long, default_value_t = 5, help = "Maximum number of customer reports to print")]
        limit: usize,
        #[arg(long, help = "Override enrichment.min_purchases")]
        min_purchases: Option<usize>,
        #[arg(long, help = "Override enrichment.min_confidence (0 - 100)")]
        min_confidence: Option<f64>,
        #[arg(long, help = "Score against this date instead of the latest purchase (YYYY-MM-DD)")]
        reference_date: Option<NaiveDate>,
        #[arg(long = "config", help = "Path to a pantree.toml file")]
        config_path: Option<PathBuf>,
    },
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
    #[command(about = "Validate config and dataset readiness")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Analyze {
            dataset_dir,
            customer,
            limit,
            min_purchases,
            min_confidence,
            reference_date,
            config_path,
        } => commands::analyze::run(commands::analyze::AnalyzeArgs {
            dataset_dir,
            customer,
            limit,
            min_purchases,
            min_confidence,
            reference_date,
            config_path,
        }),
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Doctor { json } => commands::doctor::run(json),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}

/// Installs the global subscriber; logs go to stderr so stdout stays JSON.
pub fn init_logging(logging: &LoggingConfig) -> anyhow::Result<()> {
    let log_level = logging.level.parse::<Level>().unwrap_or(Level::INFO);
    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(log_level)
        .with_writer(std::io::stderr);

    let installed = match logging.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };

    installed.map_err(|error| anyhow!("failed to install log subscriber: {error}"))
}
