//! Rule Tables
//!
//! The declarative patch configuration: built-in rule tables per target
//! kind, signature-gated rule groups, and compilation of rule specs into
//! ready-to-run rule sets. Order within a table is significant and is
//! preserved through compilation; the engine applies rules strictly in
//! table order.
//!
//! The built-in tables carry the stock local-development overrides
//! (mock-server routing, offline mode, telemetry and update-check
//! suppression). User configuration can append additional rules and
//! groups per target kind; appended rules run after the built-ins.

use regex::Regex;

use crate::error::PatchError;
use crate::types::{GroupSpec, RuleSpec, TargetKind};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Injected into the primary script by the offline-mode rule. Its presence
/// lets later runs short-circuit without re-reading the whole table.
pub const APPLIED_MARKER: &str = "/* retouch:applied */";

/// Stock rules for the bundle's main script.
static PRIMARY_RULES: &[(&str, &str, &str)] = &[
    (
        r"(https?://)api\.apphub\.example/v(\d+)/",
        "http://127.0.0.1:4820/v${2}/",
        "route backend calls to the local mock server",
    ),
    (
        r"static\s+isOnline\s*\(\s*\)\s*\{[\s\S]*?\}",
        "static isOnline() { return false; } /* retouch:applied */",
        "force offline mode",
    ),
    (
        r#""telemetryEnabled"\s*:\s*true"#,
        r#""telemetryEnabled": false"#,
        "disable telemetry",
    ),
    (
        r"async\s+checkForUpdates\s*\([^)]*\)\s*\{[\s\S]*?\}",
        "async checkForUpdates() { return null; }",
        "short-circuit update checks",
    ),
];

/// Stock rules applied to every script in the UI assets directory.
static ASSET_RULES: &[(&str, &str, &str)] = &[
    (
        r#"(["'])wss://relay\.apphub\.example/"#,
        "${1}ws://127.0.0.1:4821/",
        "route the event stream to the local relay",
    ),
    (
        r"Connected to cloud",
        "Local mode",
        "relabel the connection banner",
    ),
];

/// Stock rules for the bundle manifest.
static MANIFEST_RULES: &[(&str, &str, &str)] = &[
    (
        r#""updateMode"\s*:\s*"auto""#,
        r#""updateMode": "manual""#,
        "pin updates to manual",
    ),
    (
        r#""telemetry"\s*:\s*true"#,
        r#""telemetry": false"#,
        "clear the manifest telemetry flag",
    ),
];

/// Signature-gated groups for asset scripts. UI bundles are minified with
/// unstable file names, so the signature identifies the file by a content
/// substring rather than by name.
static ASSET_GROUPS: &[(&str, &[(&str, &str, &str)])] = &[
    (
        "cloud.connectNotice",
        &[(
            r#"value:["']Cloud required["']"#,
            r#"value:"",hidden:!0"#,
            "hide the cloud-required banner",
        )],
    ),
    (
        "updateBanner",
        &[(
            r"showUpdateBanner\s*:\s*!0",
            "showUpdateBanner:!1",
            "suppress the update banner",
        )],
    ),
];

// ---------------------------------------------------------------------------
// Compiled forms
// ---------------------------------------------------------------------------

/// A rule with its pattern compiled. Compilation happens once at load;
/// a malformed pattern is a configuration error, never a patch error.
#[derive(Clone, Debug)]
pub struct Rule {
    pub regex: Regex,
    pub replacement: String,
    pub description: String,
}

/// An ordered, compiled rule table.
#[derive(Clone, Debug, Default)]
pub struct RuleSet {
    pub rules: Vec<Rule>,
}

/// A compiled signature-gated group.
#[derive(Clone, Debug)]
pub struct SignatureGroup {
    pub signature: String,
    pub rules: Vec<Rule>,
}

fn compile_rule(spec: &RuleSpec) -> Result<Rule, PatchError> {
    let regex = Regex::new(&spec.pattern).map_err(|e| {
        PatchError::Config(format!("rule '{}': {}", spec.description, e))
    })?;
    Ok(Rule {
        regex,
        replacement: spec.replacement.clone(),
        description: spec.description.clone(),
    })
}

impl RuleSet {
    /// Compile an ordered list of specs, preserving order.
    pub fn compile(specs: &[RuleSpec]) -> Result<Self, PatchError> {
        let rules = specs.iter().map(compile_rule).collect::<Result<_, _>>()?;
        Ok(Self { rules })
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl SignatureGroup {
    pub fn compile(spec: &GroupSpec) -> Result<Self, PatchError> {
        let rules = spec
            .rules
            .iter()
            .map(compile_rule)
            .collect::<Result<_, _>>()?;
        Ok(Self {
            signature: spec.signature.clone(),
            rules,
        })
    }
}

// ---------------------------------------------------------------------------
// Table lookup
// ---------------------------------------------------------------------------

fn specs_from_table(table: &[(&str, &str, &str)]) -> Vec<RuleSpec> {
    table
        .iter()
        .map(|(p, r, d)| RuleSpec::new(p, r, d))
        .collect()
}

/// The built-in rule specs for one target kind, in table order.
pub fn builtin_specs(kind: TargetKind) -> Vec<RuleSpec> {
    match kind {
        TargetKind::PrimaryScript => specs_from_table(PRIMARY_RULES),
        TargetKind::AssetScript => specs_from_table(ASSET_RULES),
        TargetKind::Manifest => specs_from_table(MANIFEST_RULES),
    }
}

/// The built-in signature groups for one target kind.
pub fn builtin_group_specs(kind: TargetKind) -> Vec<GroupSpec> {
    match kind {
        TargetKind::AssetScript => ASSET_GROUPS
            .iter()
            .map(|(sig, rules)| GroupSpec {
                signature: sig.to_string(),
                rules: specs_from_table(rules),
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// Resolve the full compiled rule set and signature groups for one target
/// kind: built-ins first, then any config-supplied extras in their given
/// order.
pub fn resolve(
    kind: TargetKind,
    extra_rules: &[RuleSpec],
    extra_groups: &[GroupSpec],
) -> Result<(RuleSet, Vec<SignatureGroup>), PatchError> {
    let mut specs = builtin_specs(kind);
    specs.extend_from_slice(extra_rules);
    let rule_set = RuleSet::compile(&specs)?;

    let mut group_specs = builtin_group_specs(kind);
    group_specs.extend_from_slice(extra_groups);
    let groups = group_specs
        .iter()
        .map(SignatureGroup::compile)
        .collect::<Result<_, _>>()?;

    Ok((rule_set, groups))
}
