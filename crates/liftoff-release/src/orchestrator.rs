//! Release orchestration
//!
//! [`Liftoff`] is created unloaded. Taps registered on [`Liftoff::hooks`]
//! and plugins added with [`Liftoff::with_plugin`] take effect on
//! [`Liftoff::load`]; every workflow before that fails with
//! [`PreconditionError::NotLoaded`].

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use liftoff_core::classify::{calculate_semver_bump, BumpOptions};
use liftoff_core::commit::Commit;
use liftoff_core::config::{validate_config, Config};
use liftoff_core::error::{ConfigError, PreconditionError, PublishError, Result};
use liftoff_core::labels::LabelTaxonomy;
use liftoff_core::provider::{CommitStatus, NewRelease, Provider, StatusState};
use liftoff_core::types::{ReleaseType, SemverBump};
use liftoff_core::vcs::Vcs;
use liftoff_core::version::{increment_str, parse_version};

use crate::context::ReleaseContext;
use crate::hooks::{
    first_error, AfterReleaseArgs, CanaryArgs, LifecycleHooks, NextContext, ShipitContext,
    ShipitOutcome, VersionArgs,
};
use crate::plugins::{self, Plugin};
use crate::release::Release;

/// Comment posted on a pull request after a canary; `%v` is the version
const DEFAULT_CANARY_MESSAGE: &str = "Published canary version: `%v`";

/// Length of the commit hash used in canary suffixes
const SHORT_SHA_LEN: usize = 7;

/// Version assumed before the first release
const INITIAL_VERSION: &str = "0.0.0";

/// Options for a full release
#[derive(Debug, Clone, Default)]
pub struct ReleaseOptions {
    /// Release to start from; defaults to the latest release
    pub from: Option<String>,
    /// Version to publish instead of the detected one
    pub use_version: Option<String>,
    /// Publish as a prerelease
    pub prerelease: bool,
    /// Report instead of publishing
    pub dry_run: bool,
}

impl ReleaseOptions {
    /// Create options for a dry run
    pub fn dry_run() -> Self {
        Self {
            dry_run: true,
            ..Default::default()
        }
    }
}

/// Options for a canary release
#[derive(Debug, Clone, Default)]
pub struct CanaryOptions {
    /// Pull request the canary is built from
    pub pr: Option<u64>,
    /// CI build number
    pub build: Option<String>,
    /// Comment to post on the pull request, `%v` is replaced by the version
    pub message: Option<String>,
    /// Report instead of publishing
    pub dry_run: bool,
}

/// State created by `load`
struct Loaded {
    ctx: ReleaseContext,
    hooks: LifecycleHooks,
    release: Release,
}

/// Drives the release workflows for one project
pub struct Liftoff {
    root: PathBuf,
    /// Extension points; taps registered here are applied before plugins
    pub hooks: LifecycleHooks,
    plugins: Vec<Box<dyn Plugin>>,
    state: Option<Loaded>,
}

impl Liftoff {
    /// Create an unloaded instance rooted at the current directory
    pub fn new() -> Self {
        Self {
            root: PathBuf::from("."),
            hooks: LifecycleHooks::new(),
            plugins: Vec::new(),
            state: None,
        }
    }

    /// Set the project root
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }

    /// Add a plugin applied after the configured ones
    pub fn with_plugin(mut self, plugin: impl Plugin + 'static) -> Self {
        self.plugins.push(Box::new(plugin));
        self
    }

    /// Whether `load` has completed
    pub fn is_loaded(&self) -> bool {
        self.state.is_some()
    }

    /// Effective configuration, once loaded
    pub fn config(&self) -> Option<&Config> {
        self.state.as_ref().map(|s| s.ctx.config.as_ref())
    }

    /// The release pipeline, once loaded
    pub fn release(&self) -> Result<&Release> {
        Ok(&self.loaded("release")?.release)
    }

    fn loaded(&self, operation: &str) -> Result<&Loaded> {
        self.state
            .as_ref()
            .ok_or_else(|| PreconditionError::NotLoaded(operation.to_string()).into())
    }

    /// Load a project.
    ///
    /// Runs `modify_config`, validates the result, resolves the labels,
    /// applies plugins in order, reads the project from the provider and
    /// finally runs `before_run`.
    #[instrument(skip_all)]
    pub async fn load(
        &mut self,
        config: Config,
        vcs: Arc<dyn Vcs>,
        provider: Arc<dyn Provider>,
    ) -> Result<()> {
        let config = self.hooks.modify_config.call(config).await;
        validate_config(&config)?;

        let taxonomy = LabelTaxonomy::new(config.labels.clone());
        let ctx = ReleaseContext::new(
            Arc::new(config),
            vcs,
            provider,
            taxonomy.version_labels().clone(),
            self.root.clone(),
        );

        let mut hooks = self.hooks.clone();
        for name in &ctx.config.plugins {
            let plugin = plugins::builtin(name).ok_or_else(|| ConfigError::InvalidValue {
                field: "plugins".to_string(),
                message: format!("unknown plugin '{}'", name),
            })?;
            debug!(plugin = plugin.name(), "applying plugin");
            plugin.apply(&ctx, &mut hooks);
        }
        for plugin in &self.plugins {
            debug!(plugin = plugin.name(), "applying plugin");
            plugin.apply(&ctx, &mut hooks);
        }

        let project = ctx.provider.get_project().await?;
        let release = Release::new(ctx.clone(), taxonomy, &project, &hooks);

        first_error(hooks.before_run.call(Arc::clone(&ctx.config)).await)?;

        info!(
            owner = %project.owner,
            repo = %project.repo,
            plugins = ?ctx.config.plugins,
            "loaded project"
        );
        self.state = Some(Loaded {
            ctx,
            hooks,
            release,
        });
        Ok(())
    }

    /// Latest release tag, else latest git tag, else the first commit
    pub async fn latest_release(&self) -> Result<String> {
        self.loaded("latest_release")?.latest_release().await
    }

    /// Bump for the commits since `from` (default: latest release)
    pub async fn version(&self, from: Option<&str>) -> Result<SemverBump> {
        let loaded = self.loaded("version")?;
        let from = loaded.resolve_from(from).await?;
        loaded.release.get_semver_bump(&from, None).await
    }

    /// Render notes for `from..to` and, unless a dry run, prepend them to the changelog
    pub async fn changelog(
        &self,
        from: Option<&str>,
        to: Option<&str>,
        dry_run: bool,
    ) -> Result<String> {
        self.loaded("changelog")?.changelog(from, to, dry_run).await
    }

    /// Publish a release on the provider
    pub async fn run_release(&self, options: ReleaseOptions) -> Result<Option<String>> {
        self.loaded("release")?.run_release(options).await
    }

    /// Publish a prerelease from the current branch
    pub async fn next(&self, dry_run: bool) -> Result<Option<String>> {
        Ok(self.loaded("next")?.next(dry_run).await?.0)
    }

    /// Publish a canary through the `canary` hook
    pub async fn canary(&self, options: CanaryOptions) -> Result<Option<String>> {
        Ok(self.loaded("canary")?.canary(options).await?.0)
    }

    /// Release whatever the current branch calls for
    pub async fn shipit(&self, dry_run: bool) -> Result<ShipitOutcome> {
        self.loaded("shipit")?.shipit(dry_run).await
    }

    /// Create or update the configured labels on the provider
    pub async fn create_labels(&self, dry_run: bool) -> Result<Vec<String>> {
        self.loaded("create_labels")?
            .release
            .add_labels_to_project(dry_run)
            .await
    }

    /// Labels of a pull request, or of the most recently merged one
    pub async fn label(&self, pr: Option<u64>) -> Result<Vec<String>> {
        self.loaded("label")?.label(pr).await
    }

    /// Report on a pull request's labels with a commit status
    pub async fn pr_check(
        &self,
        pr: u64,
        url: Option<&str>,
        dry_run: bool,
    ) -> Result<CommitStatus> {
        self.loaded("pr_check")?.pr_check(pr, url, dry_run).await
    }
}

impl Default for Liftoff {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Liftoff {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Liftoff")
            .field("root", &self.root)
            .field("hooks", &self.hooks)
            .field("loaded", &self.is_loaded())
            .finish_non_exhaustive()
    }
}

impl Loaded {
    async fn latest_release(&self) -> Result<String> {
        if let Some(info) = self.ctx.provider.get_latest_release_info().await? {
            debug!(tag = %info.tag_name, "latest release from provider");
            return Ok(info.tag_name);
        }
        if let Some(tag) = self.ctx.vcs.latest_tag().await? {
            debug!(%tag, "latest release from git tags");
            return Ok(tag);
        }
        debug!("no releases yet, starting from the first commit");
        self.ctx.vcs.first_commit().await
    }

    async fn resolve_from(&self, from: Option<&str>) -> Result<String> {
        match from {
            Some(from) => Ok(from.to_string()),
            None => self.latest_release().await,
        }
    }

    /// Version the project is at: `get_previous_version`, else the last release
    async fn current_version(&self, last_release: &str) -> String {
        let version = self
            .hooks
            .get_previous_version
            .call(())
            .await
            .unwrap_or_else(|| last_release.to_string());
        self.ctx.prefix_release(&version)
    }

    /// The version after `current`, which may still be a commit hash
    fn bumped_version(&self, current: &str, bump: SemverBump) -> Result<String> {
        let base = if parse_version(current).is_ok() {
            current
        } else {
            INITIAL_VERSION
        };
        if !bump.is_releasable() {
            return Ok(self.ctx.prefix_release(base));
        }
        Ok(self.ctx.prefix_release(&increment_str(base, bump)?))
    }

    #[instrument(skip(self))]
    async fn changelog(&self, from: Option<&str>, to: Option<&str>, dry_run: bool) -> Result<String> {
        let from = self.resolve_from(from).await?;
        let commits = self.release.get_commits_in_release(&from, to).await?;
        let notes = self.release.release_notes_for(&commits).await;
        if notes.is_empty() {
            info!("no commits to add to the changelog");
            return Ok(notes);
        }

        let current = self.current_version(&from).await;
        let version = self.bumped_version(&current, self.release.semver_bump_for(&commits))?;
        if dry_run {
            info!(%version, path = %self.release.changelog_path().display(), "would update changelog");
        } else {
            self.release.add_to_changelog(&notes, &version).await?;
        }
        Ok(notes)
    }

    #[instrument(skip(self))]
    async fn run_release(&self, options: ReleaseOptions) -> Result<Option<String>> {
        let last_release = match options.from {
            Some(from) => from,
            None if options.prerelease => match self.ctx.vcs.previous_tag_in_branch().await? {
                Some(tag) => tag,
                None => self.latest_release().await?,
            },
            None => self.latest_release().await?,
        };

        let commits = self.release.get_commits_in_release(&last_release, None).await?;
        let notes = self.release.release_notes_for(&commits).await;

        let new_version = match options.use_version {
            Some(version) => self.ctx.prefix_release(&version),
            None => self.current_version(&last_release).await,
        };
        if new_version == self.ctx.prefix_release(&last_release) {
            info!(version = %new_version, "no new version to release");
            return Ok(None);
        }

        if options.dry_run {
            info!(version = %new_version, prerelease = options.prerelease, "would publish release");
            return Ok(Some(new_version));
        }

        self.publish(&new_version, &notes, options.prerelease).await?;
        first_error(
            self.hooks
                .after_release
                .call(AfterReleaseArgs {
                    last_release,
                    new_version: new_version.clone(),
                    commits,
                    release_notes: notes,
                    prerelease: options.prerelease,
                })
                .await,
        )?;
        Ok(Some(new_version))
    }

    async fn publish(&self, version: &str, notes: &str, prerelease: bool) -> Result<()> {
        let release = NewRelease {
            tag_name: version.to_string(),
            body: notes.to_string(),
            prerelease,
        };
        self.ctx
            .provider
            .publish(&release)
            .await
            .map_err(|e| PublishError::provider("publish release", version, e))?;
        info!(version, prerelease, "published release");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn next(&self, dry_run: bool) -> Result<(Option<String>, Vec<Commit>)> {
        let branch = self.ctx.vcs.current_branch().await?;
        let last_release = self.latest_release().await?;
        let commits = self.release.get_commits_in_release(&last_release, None).await?;
        let bump = self.release.semver_bump_for(&commits);
        if !bump.is_releasable() {
            info!(%bump, "no prerelease necessary");
            return Ok((None, commits));
        }

        let notes = self.release.release_notes_for(&commits).await;
        let next = self
            .hooks
            .next
            .call(Ok(NextContext {
                versions: Vec::new(),
                bump,
                dry_run,
                commits: commits.clone(),
                release_notes: notes.clone(),
                last_release: last_release.clone(),
                branch,
            }))
            .await?;

        let Some(version) = next.versions.last().cloned() else {
            warn!("no plugin published a prerelease");
            return Ok((None, commits));
        };
        if dry_run {
            info!(%version, "would publish prerelease");
            return Ok((Some(version), commits));
        }

        self.publish(&version, &notes, true).await?;
        first_error(
            self.hooks
                .after_release
                .call(AfterReleaseArgs {
                    last_release,
                    new_version: version.clone(),
                    commits: commits.clone(),
                    release_notes: notes,
                    prerelease: true,
                })
                .await,
        )?;
        Ok((Some(version), commits))
    }

    #[instrument(skip(self))]
    async fn canary(&self, options: CanaryOptions) -> Result<(Option<String>, Vec<Commit>)> {
        let suffix = match (options.pr, options.build.as_deref()) {
            (Some(pr), Some(build)) => format!(".{}.{}", pr, build),
            (Some(pr), None) => format!(".{}", pr),
            (None, _) => {
                let head = self.ctx.vcs.head_sha().await?;
                format!(".{}", &head[..head.len().min(SHORT_SHA_LEN)])
            }
        };

        let first = self.ctx.vcs.first_commit().await?;
        let mut from = self
            .ctx
            .vcs
            .latest_tag_in_branch()
            .await?
            .unwrap_or_else(|| first.clone());
        let mut commits = self.release.get_commits_in_release(&from, None).await?;
        if commits.is_empty() && from != first {
            debug!("no commits since the latest tag, using the whole history");
            from = first;
            commits = self.release.get_commits_in_release(&from, None).await?;
        }

        let bump = match self.release.semver_bump_for(&commits) {
            bump if bump.is_releasable() => bump,
            _ => SemverBump::Patch,
        };

        if options.dry_run {
            info!(%bump, %suffix, "would publish canary");
            return Ok((None, commits));
        }

        let last_release = if parse_version(&from).is_ok() {
            from
        } else {
            INITIAL_VERSION.to_string()
        };
        let answer = self
            .hooks
            .canary
            .call(CanaryArgs {
                bump,
                suffix,
                last_release,
                commits: commits.clone(),
            })
            .await;
        let Some(version) = answer else {
            warn!("no plugin published a canary");
            return Ok((None, commits));
        };
        let version = version?;

        if let Some(pr) = options.pr {
            let message = options
                .message
                .as_deref()
                .unwrap_or(DEFAULT_CANARY_MESSAGE)
                .replace("%v", &version);
            self.ctx
                .provider
                .create_comment(pr, &message)
                .await
                .map_err(|e| PublishError::provider("comment on", format!("#{}", pr), e))?;
        }

        info!(%version, "published canary");
        Ok((Some(version), commits))
    }

    #[instrument(skip(self))]
    async fn shipit(&self, dry_run: bool) -> Result<ShipitOutcome> {
        let branch = self.ctx.vcs.current_branch().await?;
        let context = if branch == self.ctx.config.base_branch {
            ShipitContext::Latest
        } else if self.ctx.config.is_prerelease_branch(&branch) {
            ShipitContext::Next
        } else {
            ShipitContext::Canary
        };
        info!(%branch, %context, dry_run, "shipping");

        let (new_version, commits) = match context {
            ShipitContext::Latest => self.ship_latest(dry_run).await?,
            ShipitContext::Next => self.next(dry_run).await?,
            ShipitContext::Canary => {
                self.canary(CanaryOptions {
                    dry_run,
                    ..CanaryOptions::default()
                })
                .await?
            }
        };

        let outcome = ShipitOutcome {
            context,
            new_version,
            commits,
        };
        if outcome.new_version.is_some() && !dry_run {
            first_error(self.hooks.after_ship_it.call(outcome.clone()).await)?;
        }
        Ok(outcome)
    }

    async fn ship_latest(&self, dry_run: bool) -> Result<(Option<String>, Vec<Commit>)> {
        let last_release = self.latest_release().await?;
        let commits = self.release.get_commits_in_release(&last_release, None).await?;
        let bump = self.release.semver_bump_for(&commits);
        if !bump.is_releasable() {
            info!(%bump, "no release necessary");
            return Ok((None, commits));
        }

        let notes = self.release.release_notes_for(&commits).await;
        let current = self.current_version(&last_release).await;
        let next_version = self.bumped_version(&current, bump)?;
        info!(from = %current, to = %next_version, %bump, "releasing");

        first_error(self.hooks.version.call(VersionArgs { bump, dry_run }).await)?;

        if self.ctx.config.changelog.enabled && !notes.is_empty() {
            if dry_run {
                info!(version = %next_version, "would update changelog");
            } else {
                self.release.add_to_changelog(&notes, &next_version).await?;
            }
        }

        if !dry_run {
            first_error(self.hooks.publish.call(bump).await)?;
        }

        let new_version = self
            .run_release(ReleaseOptions {
                from: Some(last_release),
                use_version: dry_run.then_some(next_version),
                prerelease: false,
                dry_run,
            })
            .await?;
        Ok((new_version, commits))
    }

    async fn label(&self, pr: Option<u64>) -> Result<Vec<String>> {
        let pull = match pr {
            Some(number) => self.ctx.provider.get_pull_request(number).await?,
            None => {
                let recent = self.ctx.provider.get_pull_requests().await?;
                let Some(pull) = recent
                    .into_iter()
                    .filter(|p| p.merged_at.is_some())
                    .max_by_key(|p| p.merged_at)
                else {
                    info!("no merged pull requests found");
                    return Ok(Vec::new());
                };
                pull
            }
        };
        debug!(pr = pull.number, labels = ?pull.labels, "read pull request labels");
        Ok(pull.labels)
    }

    #[instrument(skip(self))]
    async fn pr_check(&self, pr: u64, url: Option<&str>, dry_run: bool) -> Result<CommitStatus> {
        let pull = self.ctx.provider.get_pull_request(pr).await?;
        let labels = &self.ctx.version_labels;
        let has = |release_type: ReleaseType| pull.labels.iter().any(|l| labels.is(l, release_type));

        let has_semver = has(ReleaseType::Major) || has(ReleaseType::Minor) || has(ReleaseType::Patch);
        let bump = calculate_semver_bump(&[pull.labels.clone()], labels, BumpOptions::default());

        let (state, description) = if has(ReleaseType::Skip) {
            (StatusState::Success, "PR will not create a release".to_string())
        } else if !has_semver {
            (StatusState::Error, "No semver label!".to_string())
        } else if has(ReleaseType::Release) {
            (
                StatusState::Success,
                format!("PR will create release once merged - {}", bump),
            )
        } else {
            (StatusState::Success, format!("CI - {}", bump))
        };

        let status = CommitStatus {
            sha: pull.head_sha.clone(),
            state,
            description,
            context: self.ctx.config.github.status_context.clone(),
            target_url: url.map(str::to_string),
        };

        if dry_run {
            info!(state = status.state.as_str(), description = %status.description, "would post status");
            return Ok(status);
        }

        self.ctx
            .provider
            .create_status(&status)
            .await
            .map_err(|e| PublishError::provider("post status", format!("#{}", pr), e))?;
        info!(pr, state = status.state.as_str(), "posted status");
        Ok(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{date, raw, MockProvider, MockVcs};
    use liftoff_core::error::LiftoffError;
    use liftoff_core::provider::{PullRequest, ReleaseInfo};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    struct Harness {
        liftoff: Liftoff,
        vcs: Arc<MockVcs>,
        provider: Arc<MockProvider>,
        temp: TempDir,
    }

    async fn harness_with(
        liftoff: Liftoff,
        config: Config,
        vcs: MockVcs,
        provider: MockProvider,
    ) -> Harness {
        let temp = TempDir::new().unwrap();
        let vcs = Arc::new(vcs);
        let provider = Arc::new(provider);
        let mut liftoff = liftoff.with_root(temp.path());
        liftoff
            .load(config, vcs.clone(), provider.clone())
            .await
            .unwrap();
        Harness {
            liftoff,
            vcs,
            provider,
            temp,
        }
    }

    async fn harness(vcs: MockVcs, provider: MockProvider) -> Harness {
        harness_with(Liftoff::new(), Config::default(), vcs, provider).await
    }

    fn minor_log() -> MockVcs {
        MockVcs::new()
            .with_tags(&["v1.0.0"])
            .with_log(vec![raw("m1", "Add rockets (#5)").with_pull_request(5, None)])
    }

    fn minor_pr() -> MockProvider {
        MockProvider::new().with_pr(
            PullRequest::new(5, "Add rockets")
                .with_labels(["minor"])
                .with_head_sha("feed5"),
        )
    }

    fn counter(hooks: &mut LifecycleHooks) -> Arc<AtomicUsize> {
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        hooks.after_ship_it.tap("count", move |_| {
            c.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        count
    }

    #[tokio::test]
    async fn test_operations_require_load() {
        let liftoff = Liftoff::new();
        let err = liftoff.version(None).await.unwrap_err();
        assert!(matches!(
            err,
            LiftoffError::Precondition(PreconditionError::NotLoaded(_))
        ));
        assert!(liftoff.shipit(true).await.is_err());
        assert!(liftoff.release().is_err());
    }

    #[tokio::test]
    async fn test_load_runs_config_and_before_run_hooks() {
        let mut liftoff = Liftoff::new();
        liftoff.hooks.modify_config.tap("base", |mut config: Config| {
            config.base_branch = "trunk".to_string();
            config
        });
        let ran = Arc::new(AtomicUsize::new(0));
        let r = Arc::clone(&ran);
        liftoff.hooks.before_run.tap("count", move |config: Arc<Config>| {
            assert_eq!(config.base_branch, "trunk");
            r.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        let h = harness_with(liftoff, Config::default(), MockVcs::new(), MockProvider::new()).await;
        assert_eq!(ran.load(Ordering::SeqCst), 1);
        assert_eq!(h.liftoff.config().unwrap().base_branch, "trunk");
        assert_eq!(h.provider.call_count("get_project"), 1);
    }

    #[tokio::test]
    async fn test_load_rejects_invalid_config() {
        let mut liftoff = Liftoff::new();
        let config = Config {
            plugins: vec!["npm".to_string()],
            ..Config::default()
        };
        let result = liftoff
            .load(config, Arc::new(MockVcs::new()), Arc::new(MockProvider::new()))
            .await;
        assert!(matches!(result, Err(LiftoffError::Config(_))));
        assert!(!liftoff.is_loaded());
    }

    #[tokio::test]
    async fn test_latest_release_fallbacks() {
        let mut provider = MockProvider::new();
        provider.latest_release = Some(ReleaseInfo {
            tag_name: "v2.0.0".to_string(),
            published_at: Some(date(3)),
        });
        let h = harness(MockVcs::new().with_tags(&["v1.0.0"]), provider).await;
        assert_eq!(h.liftoff.latest_release().await.unwrap(), "v2.0.0");

        let h = harness(MockVcs::new().with_tags(&["v1.0.0"]), MockProvider::new()).await;
        assert_eq!(h.liftoff.latest_release().await.unwrap(), "v1.0.0");

        let h = harness(MockVcs::new(), MockProvider::new()).await;
        assert_eq!(h.liftoff.latest_release().await.unwrap(), "root000");
    }

    #[tokio::test]
    async fn test_version() {
        let h = harness(minor_log(), minor_pr()).await;
        assert_eq!(h.liftoff.version(None).await.unwrap(), SemverBump::Minor);
        assert_eq!(h.vcs.log_requests(), vec!["v1.0.0"]);
    }

    #[tokio::test]
    async fn test_changelog_dry_run_and_write() {
        let h = harness(minor_log(), minor_pr()).await;
        let path = h.temp.path().join("CHANGELOG.md");

        let notes = h.liftoff.changelog(None, None, true).await.unwrap();
        assert!(notes.contains("#### 🚀  Enhancement"));
        assert!(!path.exists());

        h.liftoff.changelog(None, None, false).await.unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("# v1.1.0 ("));
        assert!(content.contains("- Add rockets (#5)"));
        assert_eq!(h.vcs.staged(), vec![path]);
    }

    #[tokio::test]
    async fn test_shipit_full_release() {
        let mut liftoff = Liftoff::new();
        let shipped = counter(&mut liftoff.hooks);
        let h = harness_with(liftoff, Config::default(), minor_log(), minor_pr()).await;

        let outcome = h.liftoff.shipit(false).await.unwrap();
        assert_eq!(outcome.context, ShipitContext::Latest);
        assert_eq!(outcome.new_version.as_deref(), Some("v1.1.0"));
        assert_eq!(outcome.commits.len(), 1);

        assert_eq!(h.vcs.created_tags(), vec!["v1.1.0"]);
        assert_eq!(h.vcs.pushes(), vec![("origin".to_string(), "main".to_string())]);
        let published = h.provider.published();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].tag_name, "v1.1.0");
        assert!(!published[0].prerelease);
        assert!(published[0].body.contains("Add rockets"));
        assert!(h.temp.path().join("CHANGELOG.md").exists());
        assert_eq!(shipped.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_shipit_without_releasable_bump() {
        let mut liftoff = Liftoff::new();
        let shipped = counter(&mut liftoff.hooks);
        let provider = MockProvider::new()
            .with_pr(PullRequest::new(5, "Docs").with_labels(["documentation"]));
        let h = harness_with(liftoff, Config::default(), minor_log(), provider).await;

        let outcome = h.liftoff.shipit(false).await.unwrap();
        assert_eq!(outcome.new_version, None);
        assert!(h.vcs.created_tags().is_empty());
        assert!(h.provider.published().is_empty());
        assert_eq!(shipped.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_shipit_dry_run_writes_nothing() {
        let mut liftoff = Liftoff::new();
        let shipped = counter(&mut liftoff.hooks);
        let h = harness_with(liftoff, Config::default(), minor_log(), minor_pr()).await;

        let outcome = h.liftoff.shipit(true).await.unwrap();
        assert_eq!(outcome.new_version.as_deref(), Some("v1.1.0"));
        assert!(h.vcs.created_tags().is_empty());
        assert!(h.vcs.pushes().is_empty());
        assert!(h.provider.published().is_empty());
        assert!(!h.temp.path().join("CHANGELOG.md").exists());
        assert_eq!(shipped.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_run_release_same_version_is_noop() {
        let mut liftoff = Liftoff::new();
        let after = Arc::new(AtomicUsize::new(0));
        let a = Arc::clone(&after);
        liftoff.hooks.after_release.tap("count", move |_| {
            a.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        let h = harness_with(liftoff, Config::default(), minor_log(), minor_pr()).await;

        assert_eq!(h.liftoff.run_release(ReleaseOptions::default()).await.unwrap(), None);
        assert!(h.provider.published().is_empty());

        let version = h
            .liftoff
            .run_release(ReleaseOptions {
                use_version: Some("1.5.0".to_string()),
                ..ReleaseOptions::default()
            })
            .await
            .unwrap();
        assert_eq!(version.as_deref(), Some("v1.5.0"));
        assert_eq!(after.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_publish_failure_is_wrapped() {
        let h = harness(minor_log(), minor_pr().failing("publish")).await;
        let err = h.liftoff.shipit(false).await.unwrap_err();
        assert!(matches!(
            err,
            LiftoffError::Publish(PublishError::Provider { ref stage, .. }) if stage == "publish release"
        ));
    }

    #[tokio::test]
    async fn test_next_publishes_prerelease() {
        let vcs = minor_log().on_branch("next");
        let h = harness(vcs, minor_pr()).await;

        let outcome = h.liftoff.shipit(false).await.unwrap();
        assert_eq!(outcome.context, ShipitContext::Next);
        assert_eq!(outcome.new_version.as_deref(), Some("v1.1.0-next.0"));
        assert_eq!(h.vcs.created_tags(), vec!["v1.1.0-next.0"]);
        let published = h.provider.published();
        assert_eq!(published.len(), 1);
        assert!(published[0].prerelease);
    }

    #[tokio::test]
    async fn test_canary_without_publisher() {
        let h = harness(minor_log().on_branch("feature"), minor_pr()).await;
        let outcome = h.liftoff.shipit(false).await.unwrap();
        assert_eq!(outcome.context, ShipitContext::Canary);
        assert_eq!(outcome.new_version, None);
        assert!(h.provider.comments().is_empty());
    }

    #[tokio::test]
    async fn test_canary_publishes_and_comments() {
        let mut liftoff = Liftoff::new();
        liftoff.hooks.canary.tap("publish", |args: CanaryArgs| {
            Some(liftoff_core::version::canary_version(
                &args.last_release,
                args.bump,
                &args.suffix,
            ))
        });
        let h = harness_with(liftoff, Config::default(), minor_log(), minor_pr()).await;

        let version = h
            .liftoff
            .canary(CanaryOptions {
                pr: Some(5),
                build: Some("42".to_string()),
                ..CanaryOptions::default()
            })
            .await
            .unwrap();
        assert_eq!(version.as_deref(), Some("1.1.0-canary.5.42"));
        assert_eq!(
            h.provider.comments(),
            vec![(5, "Published canary version: `1.1.0-canary.5.42`".to_string())]
        );
    }

    #[tokio::test]
    async fn test_canary_suffix_and_dry_run() {
        let mut liftoff = Liftoff::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&calls);
        liftoff.hooks.canary.tap("publish", move |args: CanaryArgs| {
            c.fetch_add(1, Ordering::SeqCst);
            Some(Ok(args.suffix))
        });
        // Documentation-only changes still produce a patch canary.
        let provider = MockProvider::new()
            .with_pr(PullRequest::new(5, "Docs").with_labels(["documentation"]));
        let h = harness_with(liftoff, Config::default(), minor_log(), provider).await;

        let dry = h
            .liftoff
            .canary(CanaryOptions {
                dry_run: true,
                ..CanaryOptions::default()
            })
            .await
            .unwrap();
        assert_eq!(dry, None);
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        let suffix = h.liftoff.canary(CanaryOptions::default()).await.unwrap();
        assert_eq!(suffix.as_deref(), Some(".head123"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_create_labels() {
        let h = harness(MockVcs::new(), MockProvider::new()).await;
        let written = h.liftoff.create_labels(false).await.unwrap();
        assert!(written.contains(&"major".to_string()));
        assert_eq!(h.provider.created_labels(), written);
    }

    #[tokio::test]
    async fn test_label_latest_merged() {
        let mut provider = MockProvider::new()
            .with_pr(PullRequest::new(3, "Three").with_labels(["patch"]));
        provider.recent_prs = vec![
            PullRequest::new(1, "Old").with_labels(["minor"]).with_merge_commit("a", date(1)),
            PullRequest::new(2, "New").with_labels(["major"]).with_merge_commit("b", date(4)),
            PullRequest::new(4, "Open").with_labels(["patch"]),
        ];
        let h = harness(MockVcs::new(), provider).await;

        assert_eq!(h.liftoff.label(None).await.unwrap(), vec!["major"]);
        assert_eq!(h.liftoff.label(Some(3)).await.unwrap(), vec!["patch"]);
    }

    #[tokio::test]
    async fn test_pr_check_statuses() {
        let provider = MockProvider::new()
            .with_pr(PullRequest::new(1, "None").with_head_sha("s1"))
            .with_pr(PullRequest::new(2, "Skip").with_labels(["skip-release"]).with_head_sha("s2"))
            .with_pr(
                PullRequest::new(3, "Release")
                    .with_labels(["minor", "release"])
                    .with_head_sha("s3"),
            )
            .with_pr(PullRequest::new(4, "Patch").with_labels(["patch"]).with_head_sha("s4"));
        let h = harness(MockVcs::new(), provider).await;

        let status = h.liftoff.pr_check(1, None, false).await.unwrap();
        assert_eq!(status.state, StatusState::Error);
        assert_eq!(status.description, "No semver label!");
        assert_eq!(status.context, "ci/pr-check");

        let status = h.liftoff.pr_check(2, None, false).await.unwrap();
        assert_eq!(status.state, StatusState::Success);
        assert_eq!(status.description, "PR will not create a release");

        let status = h.liftoff.pr_check(3, None, false).await.unwrap();
        assert_eq!(status.description, "PR will create release once merged - minor");

        let status = h
            .liftoff
            .pr_check(4, Some("https://ci.example.com/4"), false)
            .await
            .unwrap();
        assert_eq!(status.description, "CI - patch");
        assert_eq!(status.sha, "s4");
        assert_eq!(status.target_url.as_deref(), Some("https://ci.example.com/4"));

        assert_eq!(h.provider.statuses().len(), 4);
    }

    #[tokio::test]
    async fn test_pr_check_dry_run_and_failure() {
        let provider = MockProvider::new()
            .with_pr(PullRequest::new(4, "Patch").with_labels(["patch"]))
            .failing("create_status");
        let h = harness(MockVcs::new(), provider).await;

        assert!(h.liftoff.pr_check(4, None, true).await.is_ok());
        assert!(matches!(
            h.liftoff.pr_check(4, None, false).await,
            Err(LiftoffError::Publish(PublishError::Provider { .. }))
        ));
    }
}
