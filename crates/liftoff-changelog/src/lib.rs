//! Liftoff Changelog - Changelog generation for release automation
//!
//! Renders release notes from normalized commits: one section per titled
//! label, an extracted "Release Notes" block per pull request and an authors
//! section. Every rendering step can be overridden through
//! [`ChangelogHooks`].

pub mod generator;
pub mod hooks;
pub mod options;
pub mod release_notes;
pub mod writer;

pub use generator::Changelog;
pub use hooks::{BodyContext, ChangelogHooks};
pub use options::ChangelogOptions;
pub use writer::prepend_changelog;
