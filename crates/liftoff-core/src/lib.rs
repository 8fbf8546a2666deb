//! Liftoff Core - Core library for label-driven release automation
//!
//! This crate provides the commit model, label taxonomy, release
//! classification, configuration, error handling and the typed hook
//! primitives shared by the rest of the Liftoff workspace. It also defines
//! the version-control and code-hosting interfaces the pipeline talks to.

pub mod classify;
pub mod commit;
pub mod config;
pub mod error;
pub mod hooks;
pub mod labels;
pub mod memo;
pub mod provider;
pub mod types;
pub mod vcs;
pub mod version;

pub use classify::{calculate_semver_bump, BumpOptions};
pub use commit::{Commit, CommitAuthor, PullRequestRef, RawCommit};
pub use config::Config;
pub use error::{
    ChangelogError, ConfigError, GitError, LiftoffError, PreconditionError, ProviderError,
    PublishError, Result, VersionError,
};
pub use hooks::{BailHook, HookStrategy, SeriesHook, WaterfallHook};
pub use labels::{LabelConfig, LabelDefinition, LabelTaxonomy, VersionLabels};
pub use memo::Memo;
pub use provider::Provider;
pub use types::{ReleaseType, SemverBump};
pub use vcs::Vcs;
