//! Backup Manager
//!
//! One-time `.bak` snapshots next to each patched file, and the restore
//! pass that renames them back. A backup is created at most once per
//! original path and is never overwritten afterwards, so it always holds
//! the content from the moment of the first successful patch.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use crate::error::PatchError;

/// Suffix appended to the original file name.
pub const BACKUP_SUFFIX: &str = ".bak";

/// The derived backup location for `path` (`main.js` -> `main.js.bak`).
pub fn backup_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(BACKUP_SUFFIX);
    PathBuf::from(name)
}

/// True when `path` itself is a backup file.
pub fn is_backup(path: &Path) -> bool {
    path.to_string_lossy().ends_with(BACKUP_SUFFIX)
}

/// Snapshot `path` to its backup location unless a backup already exists.
///
/// Returns `true` when a new backup was created. An existing backup is
/// left untouched so repeated runs cannot clobber the pristine copy.
/// `fs::copy` carries permissions along with the bytes.
pub fn ensure_backup(path: &Path) -> Result<bool, PatchError> {
    let bak = backup_path(path);
    if bak.exists() {
        debug!(path = %path.display(), "backup already present, keeping it");
        return Ok(false);
    }

    fs::copy(path, &bak).map_err(|source| PatchError::Backup {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(true)
}

/// Walk `dir` and rename every `*.bak` back over its original, returning
/// the number of files restored. Individual failures are skipped; the
/// walk continues.
pub fn restore_backups(dir: &Path) -> usize {
    let mut restored = 0;

    for entry in WalkDir::new(dir).into_iter().filter_map(|e| e.ok()) {
        let path = entry.path();
        if !entry.file_type().is_file() || !is_backup(path) {
            continue;
        }

        let lossy = path.to_string_lossy();
        let original = match lossy.strip_suffix(BACKUP_SUFFIX) {
            Some(stem) => PathBuf::from(stem),
            None => continue,
        };
        match fs::rename(path, &original) {
            Ok(()) => {
                debug!(path = %original.display(), "restored from backup");
                restored += 1;
            }
            Err(e) => {
                debug!(path = %path.display(), error = %e, "restore failed, skipping");
            }
        }
    }

    restored
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_backup_path_appends_suffix() {
        let p = backup_path(Path::new("/opt/app/out/main.js"));
        assert_eq!(p, PathBuf::from("/opt/app/out/main.js.bak"));
    }

    #[test]
    fn test_first_backup_wins() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("main.js");
        fs::write(&file, "original").unwrap();

        assert!(ensure_backup(&file).unwrap());

        // Mutate the original, then back up again: the snapshot must keep
        // the content from the first call.
        fs::write(&file, "patched").unwrap();
        assert!(!ensure_backup(&file).unwrap());

        let bak = fs::read_to_string(backup_path(&file)).unwrap();
        assert_eq!(bak, "original");
    }

    #[test]
    fn test_backup_missing_file_fails() {
        let dir = tempdir().unwrap();
        let err = ensure_backup(&dir.path().join("absent.js")).unwrap_err();
        assert!(matches!(err, PatchError::Backup { .. }));
    }

    #[test]
    fn test_restore_round_trip() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("out").join("ui");
        fs::create_dir_all(&nested).unwrap();

        let file = nested.join("chunk.js");
        fs::write(&file, "original").unwrap();
        ensure_backup(&file).unwrap();
        fs::write(&file, "patched").unwrap();

        let restored = restore_backups(dir.path());
        assert_eq!(restored, 1);
        assert_eq!(fs::read_to_string(&file).unwrap(), "original");
        assert!(!backup_path(&file).exists());
    }

    #[test]
    fn test_restore_with_no_backups_is_zero() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("main.js"), "content").unwrap();
        assert_eq!(restore_backups(dir.path()), 0);
    }
}
