//! Progress Events
//!
//! Structured events emitted by the processor and coordinator, decoupling
//! the patch logic from presentation. The console reporter renders them
//! as timestamped lines; tests plug in the silent reporter.

use std::path::{Path, PathBuf};

use chrono::Local;
use colored::Colorize;

use crate::types::RunSummary;

/// Everything the run can tell the operator about.
#[derive(Clone, Debug)]
pub enum PatchEvent {
    RunStarted { bundle_dir: PathBuf },
    TargetPatched { path: PathBuf, applied: usize, dry_run: bool },
    TargetUnchanged { path: PathBuf },
    TargetSkipped { path: PathBuf, reason: String },
    TargetFailed { path: PathBuf, error: String },
    BackupCreated { path: PathBuf },
    BackupFailed { path: PathBuf, error: String },
    SeedWritten { path: PathBuf },
    Restored { count: usize },
    RunFinished { summary: RunSummary },
}

/// Sink for [`PatchEvent`]s. The processor and coordinator only ever talk
/// to this trait.
pub trait Reporter {
    fn emit(&self, event: PatchEvent);
}

// ---------------------------------------------------------------------------
// Console reporter
// ---------------------------------------------------------------------------

/// Renders events as `[HH:MM:SS]` lines on stdout.
pub struct ConsoleReporter;

fn line(msg: &str) {
    println!("[{}] {}", Local::now().format("%H:%M:%S"), msg);
}

fn short(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

impl Reporter for ConsoleReporter {
    fn emit(&self, event: PatchEvent) {
        match event {
            PatchEvent::RunStarted { bundle_dir } => {
                line(&format!("bundle: {}", bundle_dir.display()));
            }
            PatchEvent::TargetPatched { path, applied, dry_run } => {
                let verb = if dry_run { "would patch" } else { "patched" };
                line(&format!(
                    "{} {} ({} rule{})",
                    verb.green(),
                    short(&path),
                    applied,
                    if applied == 1 { "" } else { "s" }
                ));
            }
            PatchEvent::TargetUnchanged { path } => {
                line(&format!("unchanged {}", short(&path)));
            }
            PatchEvent::TargetSkipped { path, reason } => {
                line(&format!("{} {} ({})", "skipped".yellow(), short(&path), reason));
            }
            PatchEvent::TargetFailed { path, error } => {
                line(&format!("{} {}: {}", "failed".red(), short(&path), error));
            }
            PatchEvent::BackupCreated { path } => {
                line(&format!("backed up {}", short(&path)));
            }
            PatchEvent::BackupFailed { path, error } => {
                line(&format!(
                    "{} backup of {}: {}",
                    "warning:".yellow(),
                    short(&path),
                    error
                ));
            }
            PatchEvent::SeedWritten { path } => {
                line(&format!("seeded mock account at {}", path.display()));
            }
            PatchEvent::Restored { count } => {
                line(&format!("restored {} file(s) from backups", count));
            }
            PatchEvent::RunFinished { summary } => {
                line(&format!(
                    "done: {} patched, {} unchanged, {} skipped, {} failed ({} rules applied)",
                    summary.patched,
                    summary.unchanged,
                    summary.skipped,
                    summary.failed,
                    summary.rules_applied
                ));
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Null reporter
// ---------------------------------------------------------------------------

/// Discards every event. Used by tests.
pub struct NullReporter;

impl Reporter for NullReporter {
    fn emit(&self, _event: PatchEvent) {}
}
