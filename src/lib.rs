//! Retouch -- Rule-Driven Bundle Patcher
//!
//! Locates an installed app bundle and rewrites selected text fragments
//! in its scripts and manifest according to ordered tables of regex
//! rules, applying local-development overrides (mock-server routing,
//! offline mode, telemetry and update-check suppression). Every mutated
//! file gets a one-time `.bak` snapshot first; `--restore` puts the
//! originals back.

pub mod backup;
pub mod config;
pub mod coordinator;
pub mod discover;
pub mod engine;
pub mod error;
pub mod events;
pub mod processor;
pub mod rules;
pub mod stub;
pub mod types;
