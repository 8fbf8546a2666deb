//! Lifecycle extension points of a release run
//!
//! Plugins and embedders tap these hooks before `load`; the orchestrator
//! calls them at fixed points of each workflow. Fallible taps return
//! [`Result`] and the first error of a series fails the step.

use std::sync::Arc;

use serde::Serialize;

use liftoff_changelog::ChangelogHooks;
use liftoff_core::commit::Commit;
use liftoff_core::config::Config;
use liftoff_core::error::Result;
use liftoff_core::hooks::{BailHook, SeriesHook, WaterfallHook};
use liftoff_core::types::SemverBump;

use crate::log_parse::LogParseHooks;

/// Arguments of the `version` hook
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionArgs {
    /// Bump to apply
    pub bump: SemverBump,
    /// Report instead of writing
    pub dry_run: bool,
}

/// Arguments of the `after_release` hook
#[derive(Debug, Clone)]
pub struct AfterReleaseArgs {
    /// Release the notes start from
    pub last_release: String,
    /// Published version
    pub new_version: String,
    /// Commits in the release
    pub commits: Vec<Commit>,
    /// Rendered release notes
    pub release_notes: String,
    /// Whether a prerelease was published
    pub prerelease: bool,
}

/// Arguments of the `canary` hook
#[derive(Debug, Clone)]
pub struct CanaryArgs {
    /// Bump the canary is based on, always releasable
    pub bump: SemverBump,
    /// Suffix such as `.123.4`
    pub suffix: String,
    /// Release the canary builds on
    pub last_release: String,
    /// Commits since that release
    pub commits: Vec<Commit>,
}

/// Value threaded through the `next` hook
#[derive(Debug, Clone)]
pub struct NextContext {
    /// Prerelease versions published so far, in tap order
    pub versions: Vec<String>,
    /// Bump since the last full release
    pub bump: SemverBump,
    /// Report instead of writing
    pub dry_run: bool,
    /// Commits since the last full release
    pub commits: Vec<Commit>,
    /// Rendered release notes
    pub release_notes: String,
    /// Latest full release
    pub last_release: String,
    /// Prerelease branch being released
    pub branch: String,
}

/// Which workflow `shipit` ran
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ShipitContext {
    /// Full release from the base branch
    Latest,
    /// Prerelease from a prerelease branch
    Next,
    /// Canary from any other branch
    Canary,
}

impl ShipitContext {
    /// Get the context name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Latest => "latest",
            Self::Next => "next",
            Self::Canary => "canary",
        }
    }
}

impl std::fmt::Display for ShipitContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result of `shipit`, also passed to `after_ship_it`
#[derive(Debug, Clone, Serialize)]
pub struct ShipitOutcome {
    /// Workflow that ran
    pub context: ShipitContext,
    /// Published version, `None` when nothing was released
    pub new_version: Option<String>,
    /// Commits considered
    pub commits: Vec<Commit>,
}

/// Every extension point of a release run
#[derive(Debug, Clone)]
pub struct LifecycleHooks {
    /// Adjust the configuration before anything else reads it
    pub modify_config: WaterfallHook<Config>,
    /// Runs once `load` has finished
    pub before_run: SeriesHook<Arc<Config>, Result<()>>,
    /// Current version of the project; falls back to the last release
    pub get_previous_version: BailHook<(), String>,
    /// Apply a bump to the project (tagging, manifests)
    pub version: SeriesHook<VersionArgs, Result<()>>,
    /// Push the versioned project
    pub publish: SeriesHook<SemverBump, Result<()>>,
    /// Runs after a release was published on the provider
    pub after_release: SeriesHook<AfterReleaseArgs, Result<()>>,
    /// Runs at the end of `shipit`
    pub after_ship_it: SeriesHook<ShipitOutcome, Result<()>>,
    /// Publish a canary, answering with the version
    pub canary: BailHook<CanaryArgs, Result<String>>,
    /// Publish prereleases; each tap appends to `versions`
    pub next: WaterfallHook<Result<NextContext>>,
    /// Title of the changelog entry
    pub create_changelog_title: BailHook<(), String>,
    /// Taps added to every commit parser
    pub log_parse: LogParseHooks,
    /// Taps added to every changelog renderer
    pub changelog: ChangelogHooks,
}

impl LifecycleHooks {
    /// Create hooks with only the built-in defaults tapped
    pub fn new() -> Self {
        Self {
            modify_config: WaterfallHook::new("modifyConfig"),
            before_run: SeriesHook::new("beforeRun"),
            get_previous_version: BailHook::new("getPreviousVersion"),
            version: SeriesHook::new("version"),
            publish: SeriesHook::new("publish"),
            after_release: SeriesHook::new("afterRelease"),
            after_ship_it: SeriesHook::new("afterShipIt"),
            canary: BailHook::new("canary"),
            next: WaterfallHook::new("next"),
            create_changelog_title: BailHook::new("createChangelogTitle"),
            log_parse: LogParseHooks::new(),
            changelog: ChangelogHooks::new(),
        }
    }
}

impl Default for LifecycleHooks {
    fn default() -> Self {
        Self::new()
    }
}

/// Collapse the results of a series hook into its first error
pub fn first_error(results: Vec<Result<()>>) -> Result<()> {
    results.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use liftoff_core::error::PublishError;
    use liftoff_core::hooks::HookStrategy;

    #[test]
    fn test_strategies() {
        let hooks = LifecycleHooks::new();
        assert_eq!(hooks.modify_config.strategy(), HookStrategy::Waterfall);
        assert_eq!(hooks.get_previous_version.strategy(), HookStrategy::Bail);
        assert_eq!(hooks.after_release.strategy(), HookStrategy::Collect);
        assert!(!hooks.version.is_tapped());
    }

    #[tokio::test]
    async fn test_series_runs_every_tap_and_reports_first_error() {
        let mut hooks = LifecycleHooks::new();
        hooks.publish.tap("ok", |_| Ok(()));
        hooks
            .publish
            .tap("fails", |_| Err(PublishError::hook("fails", "boom").into()));
        hooks
            .publish
            .tap("also fails", |_| Err(PublishError::hook("also fails", "bang").into()));

        let results = hooks.publish.call(SemverBump::Patch).await;
        assert_eq!(results.len(), 3);
        let err = first_error(results).unwrap_err();
        assert!(err.to_string().contains("boom"));
    }

    #[tokio::test]
    async fn test_modify_config() {
        let mut hooks = LifecycleHooks::new();
        hooks.modify_config.tap("rename", |mut config: Config| {
            config.base_branch = "trunk".to_string();
            config
        });
        let config = hooks.modify_config.call(Config::default()).await;
        assert_eq!(config.base_branch, "trunk");
    }

    #[test]
    fn test_shipit_context_names() {
        assert_eq!(ShipitContext::Latest.to_string(), "latest");
        assert_eq!(
            serde_json::to_string(&ShipitContext::Canary).unwrap(),
            "\"canary\""
        );
    }
}
