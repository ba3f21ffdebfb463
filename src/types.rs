//! Retouch - Type Definitions
//!
//! Shared types for the bundle patcher: rule specifications, patch
//! outcomes, target descriptors, and the mock-account seed payload.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

// ─── Rules ───────────────────────────────────────────────────────

/// An uncompiled patch rule as it appears in the built-in tables and in
/// user configuration: a regex pattern, a replacement template (which may
/// reference capture groups as `$1` / `${name}`), and a human-readable
/// label used in progress output.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RuleSpec {
    pub pattern: String,
    pub replacement: String,
    pub description: String,
}

impl RuleSpec {
    pub fn new(pattern: &str, replacement: &str, description: &str) -> Self {
        Self {
            pattern: pattern.to_string(),
            replacement: replacement.to_string(),
            description: description.to_string(),
        }
    }
}

/// An uncompiled signature-gated rule group: `rules` only apply to buffers
/// that contain `signature` at the time the group is evaluated.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GroupSpec {
    pub signature: String,
    pub rules: Vec<RuleSpec>,
}

// ─── Patch outcome ───────────────────────────────────────────────

/// Result of running a rule set over a text buffer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PatchOutcome {
    /// The buffer after all applicable rules have run.
    pub new_content: String,
    /// Number of rules that fired (matched at least once before their
    /// substitution ran). Counts rules, not occurrences.
    pub applied: usize,
    /// True when the buffer differs from the input or any rule fired.
    /// Both conditions are checked: a rule can fire with a no-op
    /// replacement, and content comparison alone would miss it.
    pub changed: bool,
}

// ─── Targets ─────────────────────────────────────────────────────

/// The role a file plays inside the bundle. Each kind has its own rule
/// tables.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    /// The bundle's main script (`out/main.js` by default).
    PrimaryScript,
    /// A script under the UI assets directory.
    AssetScript,
    /// The bundle manifest (`manifest.json` by default).
    Manifest,
}

impl TargetKind {
    pub fn label(&self) -> &'static str {
        match self {
            TargetKind::PrimaryScript => "primary script",
            TargetKind::AssetScript => "asset script",
            TargetKind::Manifest => "manifest",
        }
    }
}

/// A single file eligible for patching, discovered once per run.
#[derive(Clone, Debug)]
pub struct TargetFile {
    pub path: PathBuf,
    pub kind: TargetKind,
}

/// What the processor did with one target.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FileDisposition {
    /// Rules fired and the file was rewritten (count of rules applied).
    Patched(usize),
    /// Same, but `--dry-run` suppressed the write.
    WouldPatch(usize),
    /// No applicable rule fired; file untouched.
    Unchanged,
    /// Skip marker present and `--force` not given.
    AlreadyPatched,
}

// ─── Run summary ─────────────────────────────────────────────────

/// Aggregate counters for one patch run, maintained by the coordinator.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub targets: usize,
    pub patched: usize,
    pub unchanged: usize,
    pub skipped: usize,
    pub failed: usize,
    pub rules_applied: usize,
}

// ─── Seed payload ────────────────────────────────────────────────

/// Account payload seeded into the bundle for the local mock backend to
/// serve. All values come from configuration; `expires_at` is epoch
/// milliseconds.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SeedAccount {
    pub id: String,
    pub email: String,
    pub display_name: String,
    pub expires_at: i64,
    pub active: bool,
    pub plan: String,
}
