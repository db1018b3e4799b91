//! `appmover`: converts global appearances of city model documents into
//! local appearances of the features they decorate.
//!
//! ```text
//! appmover move-global-apps city.jsonl                    # writes city-local-app.jsonl
//! appmover move-global-apps --feature nested 'tiles/*.jsonl'
//! appmover move-global-apps --overwrite-files --workers 4 a.jsonl b.jsonl
//! ```

use std::process::ExitCode;

use anyhow::{bail, Result};
use appmover::batch::{expand_patterns, BatchOptions, BatchRunner};
use appmover::document::{CityGmlVersion, JsonlFormat};
use appmover::relocation::LocalAppTarget;
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "appmover", version, about)]
struct Cli {
    /// Log debug output of appmover.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Converts global appearances to local ones.
    MoveGlobalApps(MoveGlobalApps),
}

#[derive(clap::Args, Debug)]
struct MoveGlobalApps {
    /// CityGML version used for output files: 2.0, 1.0.
    #[arg(long = "citygml", default_value_t = CityGmlVersion::V2_0)]
    version: CityGmlVersion,

    /// Feature to assign the local appearance to: top-level, nested.
    #[arg(long = "feature", default_value_t = LocalAppTarget::TopLevel)]
    target: LocalAppTarget,

    /// Overwrite input file(s).
    #[arg(long)]
    overwrite_files: bool,

    /// Number of files processed in parallel (default: available cores).
    #[arg(long)]
    workers: Option<usize>,

    /// File(s) to process (glob patterns allowed).
    #[arg(required = true, value_name = "FILES")]
    files: Vec<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    // Default: WARN for everything, INFO (or DEBUG) for appmover.
    // Override with RUST_LOG.
    let level = if verbose { "appmover=debug" } else { "appmover=info" };
    let env_filter = EnvFilter::from_default_env()
        .add_directive(LevelFilter::WARN.into())
        .add_directive(level.parse().unwrap_or_default());
    tracing_subscriber::fmt().with_env_filter(env_filter).init();
}

fn run(command: Command) -> Result<()> {
    match command {
        Command::MoveGlobalApps(args) => move_global_apps(&args),
    }
}

fn move_global_apps(args: &MoveGlobalApps) -> Result<()> {
    info!("Executing command 'move-global-apps'.");

    let inputs = expand_patterns(args.files.as_slice());
    if inputs.is_empty() {
        warn!("No input files found.");
        return Ok(());
    }

    let mut options = BatchOptions {
        target: args.target,
        overwrite: args.overwrite_files,
        ..BatchOptions::default()
    };
    if let Some(workers) = args.workers {
        options.workers = workers;
    }

    let runner = BatchRunner::new(JsonlFormat::new(args.version), options);
    let report = runner.run(&inputs);

    info!(
        "Processed {} of {} file(s): {}.",
        report.documents.len(),
        inputs.len(),
        report.statistic
    );
    if report.unclaimed > 0 {
        warn!(
            "{} global appearance element(s) remain global in total.",
            report.unclaimed
        );
    }
    if !report.is_success() {
        bail!("{} file(s) could not be processed", report.failures.len());
    }
    Ok(())
}
