//! Run Coordinator
//!
//! Enumerates the bundle's target files, resolves the compiled rules for
//! each target kind once, and drives the processor over the targets in
//! sequence. A failed file is reported and skipped; the only failure
//! that aborts the run mid-way is permission-denied, since every
//! remaining target would hit the same wall.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::backup;
use crate::config::RetouchConfig;
use crate::error::PatchError;
use crate::events::{PatchEvent, Reporter};
use crate::processor::{self, ProcessOptions};
use crate::rules::{self, RuleSet, SignatureGroup};
use crate::stub;
use crate::types::{FileDisposition, RunSummary, TargetFile, TargetKind};

/// Compiled rules for every target kind, resolved once per run.
struct RunPlan {
    primary: (RuleSet, Vec<SignatureGroup>),
    asset: (RuleSet, Vec<SignatureGroup>),
    manifest: (RuleSet, Vec<SignatureGroup>),
}

impl RunPlan {
    fn build(config: &RetouchConfig) -> Result<Self, PatchError> {
        let resolve = |kind| {
            let (extra_rules, extra_groups) = config.extras_for(kind);
            rules::resolve(kind, extra_rules, extra_groups)
        };
        Ok(Self {
            primary: resolve(TargetKind::PrimaryScript)?,
            asset: resolve(TargetKind::AssetScript)?,
            manifest: resolve(TargetKind::Manifest)?,
        })
    }

    fn for_kind(&self, kind: TargetKind) -> (&RuleSet, &[SignatureGroup]) {
        let (set, groups) = match kind {
            TargetKind::PrimaryScript => &self.primary,
            TargetKind::AssetScript => &self.asset,
            TargetKind::Manifest => &self.manifest,
        };
        (set, groups)
    }
}

/// Patch every discovered target in `bundle_dir`.
///
/// Returns the aggregate summary, or a fatal error (rule compilation or
/// permission-denied). Per-file read/write failures are counted in the
/// summary and do not interrupt the run.
pub fn run(
    bundle_dir: &Path,
    config: &RetouchConfig,
    options: ProcessOptions,
    reporter: &dyn Reporter,
) -> Result<RunSummary, PatchError> {
    let plan = RunPlan::build(config)?;
    let targets = enumerate_targets(bundle_dir, config);

    reporter.emit(PatchEvent::RunStarted {
        bundle_dir: bundle_dir.to_path_buf(),
    });

    let mut summary = RunSummary {
        targets: targets.len(),
        ..RunSummary::default()
    };

    for target in &targets {
        let (rule_set, groups) = plan.for_kind(target.kind);
        match processor::process(
            target,
            rule_set,
            groups,
            &config.skip_marker,
            options,
            reporter,
        ) {
            Ok(FileDisposition::Patched(applied))
            | Ok(FileDisposition::WouldPatch(applied)) => {
                summary.patched += 1;
                summary.rules_applied += applied;
            }
            Ok(FileDisposition::Unchanged) => summary.unchanged += 1,
            Ok(FileDisposition::AlreadyPatched) => summary.skipped += 1,
            Err(e) if e.is_permission_denied() => {
                reporter.emit(PatchEvent::TargetFailed {
                    path: target.path.clone(),
                    error: e.to_string(),
                });
                return Err(e);
            }
            Err(e) => {
                warn!(path = %target.path.display(), error = %e, "target failed, continuing");
                reporter.emit(PatchEvent::TargetFailed {
                    path: target.path.clone(),
                    error: e.to_string(),
                });
                summary.failed += 1;
            }
        }
    }

    if config.seed_mock && !options.dry_run {
        match stub::write_seed(bundle_dir, config) {
            Ok(path) => reporter.emit(PatchEvent::SeedWritten { path }),
            Err(e) if e.is_permission_denied() => return Err(e),
            Err(e) => warn!(error = %e, "seed payload not written"),
        }
    }

    reporter.emit(PatchEvent::RunFinished {
        summary: summary.clone(),
    });
    Ok(summary)
}

/// Rename backups over their originals across the whole bundle.
pub fn run_restore(bundle_dir: &Path, reporter: &dyn Reporter) -> usize {
    let count = backup::restore_backups(bundle_dir);
    reporter.emit(PatchEvent::Restored { count });
    count
}

/// Build the target list: the primary script, every `.js` file under the
/// assets directory, and the manifest. Missing pieces are simply absent
/// from the list; an empty list is a valid (if useless) run.
fn enumerate_targets(bundle_dir: &Path, config: &RetouchConfig) -> Vec<TargetFile> {
    let mut targets = Vec::new();

    let primary = bundle_dir.join(&config.layout.main_script);
    if primary.is_file() {
        targets.push(TargetFile {
            path: primary,
            kind: TargetKind::PrimaryScript,
        });
    } else {
        debug!(path = %primary.display(), "primary script not present");
    }

    targets.extend(
        asset_scripts(&bundle_dir.join(&config.layout.assets_dir))
            .into_iter()
            .map(|path| TargetFile {
                path,
                kind: TargetKind::AssetScript,
            }),
    );

    let manifest = bundle_dir.join(&config.layout.manifest);
    if manifest.is_file() {
        targets.push(TargetFile {
            path: manifest,
            kind: TargetKind::Manifest,
        });
    }

    targets
}

/// All `.js` files under `dir`, sorted for a stable processing order.
/// Backup files are excluded by extension.
fn asset_scripts(dir: &Path) -> Vec<PathBuf> {
    let mut scripts: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| {
            p.extension().map(|ext| ext == "js").unwrap_or(false) && !backup::is_backup(p)
        })
        .collect();
    scripts.sort();
    scripts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::NullReporter;
    use crate::types::RuleSpec;
    use std::fs;
    use tempfile::tempdir;

    /// Lay out a minimal bundle with the default layout.
    fn make_bundle(dir: &Path) {
        fs::create_dir_all(dir.join("out/ui/assets")).unwrap();
        fs::write(
            dir.join("out/main.js"),
            "static isOnline() { return navigator.onLine; }\n\
             fetch(\"https://api.apphub.example/v1/session\")",
        )
        .unwrap();
        fs::write(
            dir.join("out/ui/assets/chunk-a1b2.js"),
            "banner=\"Connected to cloud\"",
        )
        .unwrap();
        fs::write(
            dir.join("manifest.json"),
            r#"{ "updateMode": "auto", "telemetry": true }"#,
        )
        .unwrap();
    }

    #[test]
    fn test_full_run_patches_all_kinds() {
        let dir = tempdir().unwrap();
        make_bundle(dir.path());
        let config = RetouchConfig::default();

        let summary = run(
            dir.path(),
            &config,
            ProcessOptions::default(),
            &NullReporter,
        )
        .unwrap();

        assert_eq!(summary.targets, 3);
        assert_eq!(summary.patched, 3);
        assert_eq!(summary.failed, 0);

        let main = fs::read_to_string(dir.path().join("out/main.js")).unwrap();
        assert!(main.contains("static isOnline() { return false; }"));
        assert!(main.contains("http://127.0.0.1:4820/v1/session"));

        let manifest = fs::read_to_string(dir.path().join("manifest.json")).unwrap();
        assert!(manifest.contains(r#""updateMode": "manual""#));
        assert!(manifest.contains(r#""telemetry": false"#));

        // Seed payload written alongside.
        assert!(dir.path().join("mock/account.json").is_file());
    }

    #[test]
    fn test_one_bad_target_does_not_sink_the_run() {
        let dir = tempdir().unwrap();
        make_bundle(dir.path());
        // Invalid UTF-8 fails the text read for this asset. It sorts
        // before the good asset, so the targets after it prove the run
        // kept going.
        fs::write(
            dir.path().join("out/ui/assets/broken.js"),
            [0xff, 0xfe, 0xfd],
        )
        .unwrap();
        let config = RetouchConfig::default();

        let summary = run(
            dir.path(),
            &config,
            ProcessOptions::default(),
            &NullReporter,
        )
        .unwrap();

        assert_eq!(summary.targets, 4);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.patched, 3);
        let manifest = fs::read_to_string(dir.path().join("manifest.json")).unwrap();
        assert!(manifest.contains(r#""updateMode": "manual""#));
        // The broken asset was left alone: no write, no backup.
        assert!(!dir.path().join("out/ui/assets/broken.js.bak").exists());
    }

    #[test]
    fn test_second_run_skips_marked_primary() {
        let dir = tempdir().unwrap();
        make_bundle(dir.path());
        let config = RetouchConfig::default();

        run(dir.path(), &config, ProcessOptions::default(), &NullReporter).unwrap();
        let second = run(dir.path(), &config, ProcessOptions::default(), &NullReporter).unwrap();

        // Primary carries the marker now; the asset and manifest rewrites
        // are content-stable so they no longer fire.
        assert_eq!(second.skipped, 1);
        assert_eq!(second.patched, 0);
    }

    #[test]
    fn test_backups_reflect_pristine_content() {
        let dir = tempdir().unwrap();
        make_bundle(dir.path());
        let original = fs::read_to_string(dir.path().join("manifest.json")).unwrap();
        let config = RetouchConfig::default();

        run(dir.path(), &config, ProcessOptions::default(), &NullReporter).unwrap();
        let force = ProcessOptions {
            force: true,
            dry_run: false,
        };
        run(dir.path(), &config, force, &NullReporter).unwrap();

        let bak = fs::read_to_string(dir.path().join("manifest.json.bak")).unwrap();
        assert_eq!(bak, original);
    }

    #[test]
    fn test_restore_round_trip() {
        let dir = tempdir().unwrap();
        make_bundle(dir.path());
        let original = fs::read_to_string(dir.path().join("out/main.js")).unwrap();
        let config = RetouchConfig::default();

        run(dir.path(), &config, ProcessOptions::default(), &NullReporter).unwrap();
        let restored = run_restore(dir.path(), &NullReporter);

        assert!(restored >= 1);
        assert_eq!(
            fs::read_to_string(dir.path().join("out/main.js")).unwrap(),
            original
        );
    }

    #[test]
    fn test_dry_run_leaves_bundle_untouched() {
        let dir = tempdir().unwrap();
        make_bundle(dir.path());
        let before = fs::read_to_string(dir.path().join("out/main.js")).unwrap();
        let config = RetouchConfig::default();
        let options = ProcessOptions {
            force: false,
            dry_run: true,
        };

        let summary = run(dir.path(), &config, options, &NullReporter).unwrap();
        assert_eq!(summary.patched, 3);
        assert_eq!(fs::read_to_string(dir.path().join("out/main.js")).unwrap(), before);
        assert!(!dir.path().join("out/main.js.bak").exists());
        assert!(!dir.path().join("mock").exists());
    }

    #[test]
    fn test_empty_bundle_is_a_quiet_run() {
        let dir = tempdir().unwrap();
        let config = RetouchConfig::default();
        let summary = run(
            dir.path(),
            &config,
            ProcessOptions {
                force: false,
                dry_run: true,
            },
            &NullReporter,
        )
        .unwrap();
        assert_eq!(summary.targets, 0);
        assert_eq!(summary.patched, 0);
    }

    #[test]
    fn test_config_rules_extend_builtins() {
        let dir = tempdir().unwrap();
        make_bundle(dir.path());
        let mut config = RetouchConfig::default();
        config.manifest_rules.push(RuleSpec::new(
            r#""name"\s*:\s*"AppHub""#,
            r#""name": "AppHub (dev)""#,
            "tag the dev build",
        ));
        fs::write(
            dir.path().join("manifest.json"),
            r#"{ "name": "AppHub", "updateMode": "auto" }"#,
        )
        .unwrap();

        run(dir.path(), &config, ProcessOptions::default(), &NullReporter).unwrap();
        let manifest = fs::read_to_string(dir.path().join("manifest.json")).unwrap();
        assert!(manifest.contains(r#""name": "AppHub (dev)""#));
        assert!(manifest.contains(r#""updateMode": "manual""#));
    }

    #[test]
    fn test_asset_enumeration_skips_backups() {
        let dir = tempdir().unwrap();
        let assets = dir.path().join("out/ui/assets");
        fs::create_dir_all(&assets).unwrap();
        fs::write(assets.join("chunk.js"), "x").unwrap();
        fs::write(assets.join("chunk.js.bak"), "x").unwrap();
        fs::write(assets.join("styles.css"), "x").unwrap();

        let scripts = asset_scripts(&assets);
        assert_eq!(scripts.len(), 1);
        assert!(scripts[0].ends_with("chunk.js"));
    }
}
