//! Retouch CLI
//!
//! Entry point: parse flags, resolve the bundle directory through the
//! discovery chain, then either patch or restore. Per-file problems are
//! reported and skipped; discovery failures, malformed configuration,
//! and permission-denied writes end the run with a non-zero exit.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing::Level;

use retouch::config;
use retouch::coordinator;
use retouch::discover;
use retouch::events::ConsoleReporter;
use retouch::processor::ProcessOptions;

/// Retouch -- apply local development overrides to an installed bundle
#[derive(Parser, Debug)]
#[command(
    name = "retouch",
    version,
    about = "Apply local development overrides to an installed app bundle"
)]
struct Cli {
    /// Bundle directory (skips automatic discovery)
    #[arg(long)]
    path: Option<PathBuf>,

    /// Rename backups over their originals instead of patching
    #[arg(long)]
    restore: bool,

    /// Re-apply even when the applied marker is present
    #[arg(long)]
    force: bool,

    /// Report what would change without writing anything
    #[arg(long)]
    dry_run: bool,

    /// Enable debug logging
    #[arg(long)]
    verbose: bool,
}

fn run(cli: &Cli) -> Result<bool> {
    let config = config::load_config()?;
    let bundle_dir = discover::resolve_bundle_dir(cli.path.as_deref(), &config)?;
    let reporter = ConsoleReporter;

    if cli.restore {
        coordinator::run_restore(&bundle_dir, &reporter);
        return Ok(true);
    }

    let options = ProcessOptions {
        force: cli.force,
        dry_run: cli.dry_run,
    };

    match coordinator::run(&bundle_dir, &config, options, &reporter) {
        Ok(_summary) => Ok(true),
        Err(e) if e.is_permission_denied() => {
            eprintln!("Error: {}", e);
            eprintln!("The bundle is not writable by this user. Re-run with elevated privileges (e.g. sudo) or fix the directory ownership.");
            Ok(false)
        }
        Err(e) => Err(e.into()),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::WARN };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .init();

    match run(&cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
