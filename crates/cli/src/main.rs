use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use bankport_import::{import, ImportStatistics, RunFailure};
use bankport_ledger::{DryRunLedger, HttpLedger, LedgerApi};
use clap::Parser;
use tracing::{error, info, warn};

mod config;
mod logging;

use config::{Config, Overrides};

/// Imports Banking4 JSON exports into the budgeting ledger.
#[derive(Debug, Parser)]
#[command(version)]
struct Args {
    /// TOML file with settings; environment and flags override it
    #[arg(long, env = "BANKPORT_CONFIG")]
    config: Option<PathBuf>,
    /// Directory holding one <account>.json export per account
    #[arg(short = 'f', long)]
    export_dir: Option<PathBuf>,
    /// Base URL of the ledger API
    #[arg(short = 'u', long)]
    api_url: Option<String>,
    /// Ledger API token
    #[arg(short = 't', long)]
    token: Option<String>,
    /// Ignore export lines booked before this date (YYYY-MM-DD)
    #[arg(short = 'd', long)]
    min_date: Option<String>,
    /// Read everything but write nothing
    #[arg(long)]
    dry_run: bool,
    /// Log at debug level
    #[arg(short, long)]
    verbose: bool,
    /// Log level filter (overridden by RUST_LOG)
    #[arg(short = 'l', long)]
    log_level: Option<String>,
    /// Also append log lines to this file
    #[arg(long)]
    log_file: Option<PathBuf>,
}

impl Args {
    fn overrides(&self) -> Overrides {
        Overrides {
            api_url: self.api_url.clone(),
            api_token: self.token.clone(),
            export_dir: self.export_dir.clone(),
            min_date: self.min_date.clone(),
            log_level: self.log_level.clone(),
            log_file: self.log_file.clone(),
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    match run(&args) {
        Ok(code) => code,
        Err(e) => {
            // Logging may not be installed yet.
            eprintln!("bankport: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<ExitCode> {
    let config = Config::load(
        args.config.as_deref(),
        |key| std::env::var(key).ok(),
        &args.overrides(),
    )?;
    logging::init(&config.log_level, args.verbose, config.log_file.as_deref())?;
    config.validate()?;

    let ledger = HttpLedger::new(config.ledger_settings()?)
        .context("Cannot set up the ledger client")?;
    ledger
        .health_check()
        .with_context(|| format!("Ledger at {} is not reachable", config.api_url))?;
    info!("Ledger at {} is reachable", config.api_url);

    let settings = config.import_settings()?;
    let result = if args.dry_run {
        let (result, ledger) = import::run_once(DryRunLedger::new(ledger), settings);
        info!("Dry run: {} records were not written", ledger.suppressed().len());
        result
    } else {
        import::run_once(ledger, settings).0
    };

    Ok(exit_code(&result))
}

fn exit_code(result: &Result<ImportStatistics, RunFailure>) -> ExitCode {
    match result {
        Ok(stats) if stats.has_failures() => {
            warn!(
                "Finished with {} failures in {} accounts",
                stats.total_failures(),
                stats.failures_by_account.len()
            );
            ExitCode::FAILURE
        }
        Ok(_) => ExitCode::SUCCESS,
        Err(failure) => {
            error!("{}", failure);
            ExitCode::FAILURE
        }
    }
}
