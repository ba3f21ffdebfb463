//! Retouch Configuration
//!
//! Optional JSON configuration merged over built-in defaults. Looked up
//! at `./retouch.json` first, then `~/.retouch/config.json`; a missing
//! file just means defaults. Configuration can relocate the bundle
//! layout, change the seed-account values, and append extra rules and
//! signature groups per target kind.

use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::PatchError;
use crate::rules::APPLIED_MARKER;
use crate::types::{GroupSpec, RuleSpec, TargetKind};

/// Config file name in the working directory.
const LOCAL_CONFIG: &str = "retouch.json";

/// Config directory under the home directory.
const CONFIG_DIR: &str = ".retouch";

/// Relative locations of the patchable files inside a bundle.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct BundleLayout {
    pub main_script: String,
    pub assets_dir: String,
    pub manifest: String,
}

impl Default for BundleLayout {
    fn default() -> Self {
        Self {
            main_script: "out/main.js".to_string(),
            assets_dir: "out/ui/assets".to_string(),
            manifest: "manifest.json".to_string(),
        }
    }
}

/// Values for the mock-account seed payload. `expires_in_days` is turned
/// into an absolute epoch-millisecond timestamp at write time.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct SeedValues {
    pub id: String,
    pub email: String,
    pub display_name: String,
    pub plan: String,
    pub active: bool,
    pub expires_in_days: i64,
}

impl Default for SeedValues {
    fn default() -> Self {
        Self {
            id: "dev-local".to_string(),
            email: "dev@localhost".to_string(),
            display_name: "Local Developer".to_string(),
            plan: "development".to_string(),
            active: true,
            expires_in_days: 365,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct RetouchConfig {
    /// Directory-name prefix the discovery chain matches bundles by.
    pub bundle_prefix: String,
    /// Roots searched for installed bundles, tried in order. `~` expands
    /// to the home directory.
    pub search_roots: Vec<String>,
    pub layout: BundleLayout,
    /// Substring whose presence short-circuits a target unless `--force`.
    pub skip_marker: String,
    /// Whether to write the mock-account seed file after patching.
    pub seed_mock: bool,
    /// Bundle-relative directory the seed file is written into.
    pub seed_dir: String,
    pub seed: SeedValues,
    /// Extra rules appended after the built-in tables, per target kind.
    pub primary_rules: Vec<RuleSpec>,
    pub asset_rules: Vec<RuleSpec>,
    pub manifest_rules: Vec<RuleSpec>,
    /// Extra signature groups for asset scripts.
    pub asset_groups: Vec<GroupSpec>,
}

impl Default for RetouchConfig {
    fn default() -> Self {
        Self {
            bundle_prefix: "apphub.desktop-".to_string(),
            search_roots: vec![
                "~/.apphub/bundles".to_string(),
                "~/.apphub-server/bundles".to_string(),
            ],
            layout: BundleLayout::default(),
            skip_marker: APPLIED_MARKER.to_string(),
            seed_mock: true,
            seed_dir: "mock".to_string(),
            seed: SeedValues::default(),
            primary_rules: Vec::new(),
            asset_rules: Vec::new(),
            manifest_rules: Vec::new(),
            asset_groups: Vec::new(),
        }
    }
}

impl RetouchConfig {
    /// The config-supplied extra rules and groups for one target kind.
    pub fn extras_for(&self, kind: TargetKind) -> (&[RuleSpec], &[GroupSpec]) {
        match kind {
            TargetKind::PrimaryScript => (&self.primary_rules, &[]),
            TargetKind::AssetScript => (&self.asset_rules, &self.asset_groups),
            TargetKind::Manifest => (&self.manifest_rules, &[]),
        }
    }
}

/// Returns the full path to the user config file: `~/.retouch/config.json`.
pub fn user_config_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("/root"))
        .join(CONFIG_DIR)
        .join("config.json")
}

/// Load configuration, merged over defaults by serde.
///
/// `./retouch.json` wins over `~/.retouch/config.json`; when neither
/// exists, defaults are returned. An unreadable or unparseable file is a
/// configuration error that aborts the run before any file is touched.
pub fn load_config() -> Result<RetouchConfig, PatchError> {
    let local = PathBuf::from(LOCAL_CONFIG);
    let path = if local.exists() {
        local
    } else {
        let user = user_config_path();
        if !user.exists() {
            return Ok(RetouchConfig::default());
        }
        user
    };

    let contents = fs::read_to_string(&path).map_err(|e| {
        PatchError::Config(format!("cannot read {}: {}", path.display(), e))
    })?;
    serde_json::from_str(&contents).map_err(|e| {
        PatchError::Config(format!("cannot parse {}: {}", path.display(), e))
    })
}

/// Resolve a path that may start with `~` to an absolute path.
pub fn resolve_path(p: &str) -> PathBuf {
    if let Some(rest) = p.strip_prefix('~') {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("/root"));
        let rest = rest.strip_prefix('/').unwrap_or(rest);
        home.join(rest)
    } else {
        PathBuf::from(p)
    }
}
