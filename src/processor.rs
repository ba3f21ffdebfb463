//! File Processor
//!
//! The per-file workflow: read, marker check, engine pass, persist
//! decision, one-time backup, atomic write. Each call touches at most
//! one file and creates at most one backup; failures are returned to the
//! coordinator, which decides whether they sink the run.

use std::fs;
use std::io::Write as _;
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::debug;

use crate::backup;
use crate::engine;
use crate::error::PatchError;
use crate::events::{PatchEvent, Reporter};
use crate::rules::{RuleSet, SignatureGroup};
use crate::types::{FileDisposition, TargetFile};

/// Per-call switches the coordinator passes through from the CLI.
#[derive(Clone, Copy, Debug, Default)]
pub struct ProcessOptions {
    /// Re-apply even when the skip marker is present.
    pub force: bool,
    /// Run the engine but never write or back up.
    pub dry_run: bool,
}

/// Process one target file against its resolved rules.
///
/// The file is only rewritten when the engine reports a change: a rule
/// fired, or the output differs from the input. Untouched files get no
/// backup and no write. The backup runs before the write and is
/// best-effort; its failure is reported but does not block the write.
pub fn process(
    target: &TargetFile,
    rule_set: &RuleSet,
    groups: &[SignatureGroup],
    skip_marker: &str,
    options: ProcessOptions,
    reporter: &dyn Reporter,
) -> Result<FileDisposition, PatchError> {
    let content = fs::read_to_string(&target.path).map_err(|source| PatchError::Read {
        path: target.path.clone(),
        source,
    })?;

    if !options.force && !skip_marker.is_empty() && content.contains(skip_marker) {
        reporter.emit(PatchEvent::TargetSkipped {
            path: target.path.clone(),
            reason: "already patched, use --force to re-apply".to_string(),
        });
        return Ok(FileDisposition::AlreadyPatched);
    }

    let outcome = engine::apply_with_groups(&content, rule_set, groups);
    debug!(
        path = %target.path.display(),
        kind = target.kind.label(),
        applied = outcome.applied,
        "engine pass complete"
    );

    if !outcome.changed {
        reporter.emit(PatchEvent::TargetUnchanged {
            path: target.path.clone(),
        });
        return Ok(FileDisposition::Unchanged);
    }

    if options.dry_run {
        reporter.emit(PatchEvent::TargetPatched {
            path: target.path.clone(),
            applied: outcome.applied,
            dry_run: true,
        });
        return Ok(FileDisposition::WouldPatch(outcome.applied));
    }

    match backup::ensure_backup(&target.path) {
        Ok(true) => reporter.emit(PatchEvent::BackupCreated {
            path: target.path.clone(),
        }),
        Ok(false) => {}
        Err(e) => reporter.emit(PatchEvent::BackupFailed {
            path: target.path.clone(),
            error: e.to_string(),
        }),
    }

    write_atomic(&target.path, &outcome.new_content)?;

    reporter.emit(PatchEvent::TargetPatched {
        path: target.path.clone(),
        applied: outcome.applied,
        dry_run: false,
    });
    Ok(FileDisposition::Patched(outcome.applied))
}

/// Write `content` via a temp file in the same directory, then rename
/// over the original, so a crash mid-write cannot leave a truncated
/// target behind. The original's permissions are carried onto the temp
/// file first; the rename must not strip exec or group-read bits from an
/// installed file.
fn write_atomic(path: &Path, content: &str) -> Result<(), PatchError> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let write = || -> std::io::Result<()> {
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(content.as_bytes())?;
        let perms = fs::metadata(path)?.permissions();
        tmp.as_file().set_permissions(perms)?;
        tmp.persist(path).map_err(|e| e.error)?;
        Ok(())
    };
    write().map_err(|source| PatchError::Write {
        path: path.to_path_buf(),
        source,
    })
}
