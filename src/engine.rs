//! Patch Engine
//!
//! Pure text transformation: applies an ordered rule set (and any
//! signature-gated groups) to a buffer and reports how many rules fired.
//! No I/O happens here; the processor owns reading and writing.
//!
//! Order is part of the contract. Each rule sees the buffer as mutated by
//! the rules before it, so a later rule may re-match text produced by an
//! earlier one. A rule "fires" when its pattern matches the current
//! buffer at least once; substitution then replaces every occurrence, not
//! just the first.

use crate::rules::{Rule, RuleSet, SignatureGroup};
use crate::types::PatchOutcome;

/// Run `rules` over `content` in order, each rule against the output of
/// the previous one.
pub fn apply(content: &str, rules: &[Rule]) -> PatchOutcome {
    let mut buffer = content.to_string();
    let mut applied = 0;

    for rule in rules {
        // The fire check happens before substitution so a rule whose
        // replacement equals the matched text still counts.
        if rule.regex.is_match(&buffer) {
            buffer = rule
                .regex
                .replace_all(&buffer, rule.replacement.as_str())
                .into_owned();
            applied += 1;
        }
    }

    let changed = applied > 0 || buffer != content;
    PatchOutcome {
        new_content: buffer,
        applied,
        changed,
    }
}

/// Fold signature-gated groups into the buffer.
///
/// Groups are evaluated in declaration order, and each signature check
/// runs against the buffer as mutated by earlier groups, not the pristine
/// original. That is a policy choice matching the strictly sequential
/// application order: a group whose signature is introduced by an earlier
/// group's replacement will activate.
pub fn apply_gated(content: &str, groups: &[SignatureGroup]) -> PatchOutcome {
    let mut buffer = content.to_string();
    let mut applied = 0;

    for group in groups {
        if !buffer.contains(&group.signature) {
            continue;
        }
        let outcome = apply(&buffer, &group.rules);
        applied += outcome.applied;
        buffer = outcome.new_content;
    }

    let changed = applied > 0 || buffer != content;
    PatchOutcome {
        new_content: buffer,
        applied,
        changed,
    }
}

/// The full engine pass for one file: the base rule set first, then the
/// signature groups over the already-mutated buffer.
pub fn apply_with_groups(
    content: &str,
    rule_set: &RuleSet,
    groups: &[SignatureGroup],
) -> PatchOutcome {
    let base = apply(content, &rule_set.rules);
    let gated = apply_gated(&base.new_content, groups);

    let applied = base.applied + gated.applied;
    let changed = applied > 0 || gated.new_content != content;
    PatchOutcome {
        new_content: gated.new_content,
        applied,
        changed,
    }
}
