//! Bundle Discovery
//!
//! Ordered chain of resolver strategies for finding the installed bundle.
//! Each strategy either yields a directory or passes to the next one:
//!
//! 1. An explicit `--path` argument, taken as-is.
//! 2. Each configured search root under the home directory, scanning for
//!    the first subdirectory whose name starts with the bundle prefix
//!    (installed bundles carry a version suffix, so prefix match).
//! 3. The current directory, if it already looks like a bundle root.
//!
//! Discovery failure is fatal to the run; no file is touched.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::{resolve_path, RetouchConfig};
use crate::error::PatchError;

/// Resolve the bundle directory, trying each strategy in order.
pub fn resolve_bundle_dir(
    explicit: Option<&Path>,
    config: &RetouchConfig,
) -> Result<PathBuf, PatchError> {
    if let Some(path) = explicit {
        if path.is_dir() {
            return Ok(path.to_path_buf());
        }
        return Err(PatchError::Discovery(format!(
            "{} is not a directory",
            path.display()
        )));
    }

    for root in &config.search_roots {
        let root = resolve_path(root);
        if let Some(found) = scan_root(&root, &config.bundle_prefix) {
            return Ok(found);
        }
    }

    if let Some(cwd) = current_dir_bundle(config) {
        return Ok(cwd);
    }

    Err(PatchError::Discovery(format!(
        "no directory matching '{}*' under the search roots; pass --path",
        config.bundle_prefix
    )))
}

/// First subdirectory of `root` whose name starts with `prefix`.
fn scan_root(root: &Path, prefix: &str) -> Option<PathBuf> {
    let entries = match fs::read_dir(root) {
        Ok(e) => e,
        Err(_) => {
            debug!(root = %root.display(), "search root not readable, trying next");
            return None;
        }
    };

    for entry in entries.flatten() {
        let path = entry.path();
        let name = entry.file_name();
        if path.is_dir() && name.to_string_lossy().starts_with(prefix) {
            debug!(bundle = %path.display(), "matched bundle directory");
            return Some(path);
        }
    }
    None
}

/// The current directory, if it contains the manifest and the main
/// script's parent directory. Covers running the tool from inside an
/// unpacked bundle.
fn current_dir_bundle(config: &RetouchConfig) -> Option<PathBuf> {
    let cwd = env::current_dir().ok()?;
    let manifest = cwd.join(&config.layout.manifest);
    let out_dir = cwd.join(&config.layout.main_script).parent()?.to_path_buf();
    if manifest.is_file() && out_dir.is_dir() {
        return Some(cwd);
    }
    None
}
