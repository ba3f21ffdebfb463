//! Error Taxonomy
//!
//! Failure kinds the run loop has to tell apart: configuration problems
//! abort before any file is touched, per-file read/write problems skip
//! that file only, backup problems never block the write, and a
//! permission-denied write aborts the whole run with elevation guidance.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PatchError {
    /// Malformed rule pattern or unparseable config file. Load-time only;
    /// rule application itself cannot fail.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// No bundle directory could be resolved. Fatal to the run.
    #[error("no bundle directory found: {0}")]
    Discovery(String),

    #[error("failed to read {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write {path}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Best-effort backup creation failed. Reported, never fatal.
    #[error("failed to back up {path}")]
    Backup {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl PatchError {
    /// True when the underlying cause is a permission-denied I/O error.
    /// The coordinator aborts the run on these instead of skipping the
    /// file, since every remaining target will hit the same wall.
    pub fn is_permission_denied(&self) -> bool {
        match self {
            PatchError::Read { source, .. }
            | PatchError::Write { source, .. }
            | PatchError::Backup { source, .. } => {
                source.kind() == io::ErrorKind::PermissionDenied
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_detection() {
        let err = PatchError::Write {
            path: PathBuf::from("/opt/app/out/main.js"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(err.is_permission_denied());

        let err = PatchError::Read {
            path: PathBuf::from("missing.js"),
            source: io::Error::new(io::ErrorKind::NotFound, "gone"),
        };
        assert!(!err.is_permission_denied());

        let err = PatchError::Config("bad pattern".into());
        assert!(!err.is_permission_denied());
    }
}
