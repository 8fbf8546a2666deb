//! Liftoff Release - The commit-to-release pipeline
//!
//! This crate turns a commit range into a release:
//! - [`log_parse`] normalizes raw commits through an extensible hook chain
//! - [`enrich`] attaches authors, labels and pull requests from the provider
//! - [`release`] classifies commits, renders notes and updates the changelog
//! - [`orchestrator`] drives the `version`, `changelog`, `release`, `next`,
//!   `canary` and `shipit` workflows
//! - [`plugins`] holds the built-in `git-tag`, `conventional-commits` and
//!   `exec` plugins

pub mod context;
pub mod enrich;
pub mod hooks;
pub mod log_parse;
pub mod orchestrator;
pub mod plugins;
pub mod release;

#[cfg(test)]
pub(crate) mod testing;

pub use context::ReleaseContext;
pub use hooks::{LifecycleHooks, ShipitContext, ShipitOutcome};
pub use log_parse::{LogParse, LogParseHooks};
pub use orchestrator::{CanaryOptions, Liftoff, ReleaseOptions};
pub use plugins::Plugin;
pub use release::Release;
