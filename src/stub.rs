//! Seed Payload Writer
//!
//! Writes the mock-account JSON the local mock backend serves, into a
//! dedicated subdirectory of the bundle. Values come from configuration;
//! the relative expiry is resolved to an absolute epoch-millisecond
//! timestamp at write time.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Duration, Utc};

use crate::config::{RetouchConfig, SeedValues};
use crate::error::PatchError;
use crate::types::SeedAccount;

/// File name of the seed payload inside the seed directory.
const SEED_FILENAME: &str = "account.json";

/// Build the payload from configured values.
pub fn build_account(values: &SeedValues) -> SeedAccount {
    let expires_at = (Utc::now() + Duration::days(values.expires_in_days)).timestamp_millis();
    SeedAccount {
        id: values.id.clone(),
        email: values.email.clone(),
        display_name: values.display_name.clone(),
        expires_at,
        active: values.active,
        plan: values.plan.clone(),
    }
}

/// Write the seed payload into `<bundle>/<seed_dir>/account.json`,
/// creating the directory if needed. Returns the written path.
pub fn write_seed(bundle_dir: &Path, config: &RetouchConfig) -> Result<PathBuf, PatchError> {
    let dir = bundle_dir.join(&config.seed_dir);
    fs::create_dir_all(&dir).map_err(|source| PatchError::Write {
        path: dir.clone(),
        source,
    })?;

    let account = build_account(&config.seed);
    let json = serde_json::to_string_pretty(&account)
        .map_err(|e| PatchError::Config(format!("cannot serialize seed payload: {}", e)))?;

    let path = dir.join(SEED_FILENAME);
    fs::write(&path, json).map_err(|source| PatchError::Write {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_expiry_is_in_the_future() {
        let account = build_account(&SeedValues::default());
        assert!(account.expires_at > Utc::now().timestamp_millis());
        assert!(account.active);
        assert_eq!(account.plan, "development");
    }

    #[test]
    fn test_seed_file_round_trips() {
        let dir = tempdir().unwrap();
        let config = RetouchConfig::default();

        let path = write_seed(dir.path(), &config).unwrap();
        assert!(path.ends_with("mock/account.json"));

        let written: SeedAccount =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written.id, "dev-local");
        assert_eq!(written.email, "dev@localhost");
    }

    #[test]
    fn test_seed_values_are_parameterized() {
        let dir = tempdir().unwrap();
        let mut config = RetouchConfig::default();
        config.seed.display_name = "CI Fixture".to_string();
        config.seed.active = false;

        let path = write_seed(dir.path(), &config).unwrap();
        let written: SeedAccount =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written.display_name, "CI Fixture");
        assert!(!written.active);
    }
}
