//! The commit-to-release pipeline for one loaded project
//!
//! [`Release`] reads a commit range, normalizes and enriches it, classifies
//! the result into a bump and renders the notes. It also owns the writes
//! that belong to the pipeline itself: the changelog file and the project
//! labels.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use futures::future::{join_all, try_join_all};
use tracing::{debug, info, instrument, warn};

use liftoff_changelog::{prepend_changelog, Changelog, ChangelogOptions};
use liftoff_core::classify::{calculate_semver_bump, BumpOptions};
use liftoff_core::commit::Commit;
use liftoff_core::error::{PublishError, Result};
use liftoff_core::hooks::BailHook;
use liftoff_core::labels::{LabelDefinition, LabelTaxonomy};
use liftoff_core::provider::Project;
use liftoff_core::types::{ReleaseType, SemverBump};
use liftoff_core::version::increment_str;

use crate::context::ReleaseContext;
use crate::enrich::Enricher;
use crate::hooks::LifecycleHooks;
use crate::log_parse::{LogParse, LogParseHooks};

/// Subject marker for commits that never belong in a release
const SKIP_CI_MARKER: &str = "[skip ci]";

/// Date format used in changelog headings
const CHANGELOG_DATE_FORMAT: &str = "%a %b %d %Y";

/// Release pipeline bound to a context and a label taxonomy
pub struct Release {
    ctx: ReleaseContext,
    taxonomy: LabelTaxonomy,
    enricher: Arc<Enricher>,
    log_parse: LogParse,
    changelog: Changelog,
    create_changelog_title: BailHook<(), String>,
}

impl Release {
    /// Build the pipeline.
    ///
    /// The commit parser runs the enrichment stages, then the default
    /// omission rule, then the taps in `hooks.log_parse`. The changelog uses
    /// `hooks.changelog`.
    pub fn new(
        ctx: ReleaseContext,
        taxonomy: LabelTaxonomy,
        project: &Project,
        hooks: &LifecycleHooks,
    ) -> Self {
        let enricher = Enricher::new(Arc::clone(&ctx.provider), Arc::clone(&ctx.vcs));

        let mut log_parse = LogParse::new();
        let mut parse_hooks = LogParseHooks::new();
        enricher.register(&mut parse_hooks);
        parse_hooks.extend(&log_parse.hooks);
        parse_hooks.extend(&hooks.log_parse);
        log_parse.hooks = parse_hooks;

        let options = ChangelogOptions::new(
            project.owner.clone(),
            project.repo.clone(),
            project.html_url.clone(),
            taxonomy.labels().to_vec(),
            ctx.config.base_branch.clone(),
            ctx.config.prerelease_branches.clone(),
        );
        let mut changelog = Changelog::new(options);
        changelog.hooks = hooks.changelog.clone();

        Self {
            ctx,
            taxonomy,
            enricher,
            log_parse,
            changelog,
            create_changelog_title: hooks.create_changelog_title.clone(),
        }
    }

    /// The context the pipeline runs in
    pub fn context(&self) -> &ReleaseContext {
        &self.ctx
    }

    /// The effective labels
    pub fn taxonomy(&self) -> &LabelTaxonomy {
        &self.taxonomy
    }

    /// The changelog renderer
    pub fn changelog(&self) -> &Changelog {
        &self.changelog
    }

    /// The commit parser
    pub fn log_parse(&self) -> &LogParse {
        &self.log_parse
    }

    /// Forget cached provider reads
    pub fn invalidate(&self) {
        self.enricher.invalidate();
    }

    /// Normalized commits in `from..to`, minus those already reachable from `from`
    #[instrument(skip(self))]
    pub async fn get_commits(&self, from: &str, to: Option<&str>) -> Result<Vec<Commit>> {
        let raws = self.ctx.vcs.get_log(from, to).await?;
        debug!(count = raws.len(), "read commit log");

        let commits = self.log_parse.normalize_commits(raws).await;
        let released =
            try_join_all(commits.iter().map(|c| self.ctx.vcs.is_ancestor(&c.hash, from))).await?;

        Ok(commits
            .into_iter()
            .zip(released)
            .filter_map(|(commit, released)| {
                if released {
                    debug!(hash = %commit.hash, "commit already released");
                }
                (!released).then_some(commit)
            })
            .collect())
    }

    /// Commits that make up a release.
    ///
    /// Commits that arrived through a pull request already represented by its
    /// merge commit are dropped, as are commits marked `[skip ci]`.
    #[instrument(skip(self))]
    pub async fn get_commits_in_release(
        &self,
        from: &str,
        to: Option<&str>,
    ) -> Result<Vec<Commit>> {
        let commits = self.get_commits(from, to).await?;

        let mut numbers: Vec<u64> = commits.iter().filter_map(Commit::pr_number).collect();
        numbers.sort_unstable();
        numbers.dedup();

        let pr_hashes: HashSet<String> = join_all(numbers.iter().map(|&number| async move {
            match self.ctx.provider.get_commits_for_pr(number).await {
                Ok(pr_commits) => pr_commits.into_iter().map(|c| c.sha).collect(),
                Err(e) => {
                    warn!(pr = number, error = %e, "could not fetch pull request commits");
                    Vec::new()
                }
            }
        }))
        .await
        .into_iter()
        .flatten()
        .collect();

        Ok(commits
            .into_iter()
            .filter(|commit| {
                let in_merged_pr = commit.pull_request.is_none() && pr_hashes.contains(&commit.hash);
                !in_merged_pr && !commit.subject.contains(SKIP_CI_MARKER)
            })
            .collect())
    }

    /// Bump for a list of commits
    pub fn semver_bump_for(&self, commits: &[Commit]) -> SemverBump {
        let label_sets: Vec<Vec<String>> = commits.iter().map(|c| c.labels.clone()).collect();
        calculate_semver_bump(
            &label_sets,
            &self.ctx.version_labels,
            BumpOptions {
                only_publish_with_release_label: self.ctx.config.only_publish_with_release_label,
            },
        )
    }

    /// Bump for the commits released between `from` and `to`
    pub async fn get_semver_bump(&self, from: &str, to: Option<&str>) -> Result<SemverBump> {
        let commits = self.get_commits_in_release(from, to).await?;
        let bump = self.semver_bump_for(&commits);
        info!(from, %bump, commits = commits.len(), "calculated version bump");
        Ok(bump)
    }

    /// Next version after `last_release`, `None` when nothing warrants one
    pub async fn calc_next_version(&self, last_release: &str) -> Result<Option<String>> {
        let bump = self.get_semver_bump(last_release, None).await?;
        if !bump.is_releasable() {
            return Ok(None);
        }
        let next = increment_str(last_release, bump)?;
        Ok(Some(self.ctx.prefix_release(&next)))
    }

    /// Render the notes for a list of commits
    pub async fn release_notes_for(&self, commits: &[Commit]) -> String {
        self.changelog.generate_release_notes(commits).await
    }

    /// Render the notes for the commits released between `from` and `to`
    pub async fn generate_release_notes(&self, from: &str, to: Option<&str>) -> Result<String> {
        let commits = self.get_commits_in_release(from, to).await?;
        Ok(self.release_notes_for(&commits).await)
    }

    /// Path of the changelog file
    pub fn changelog_path(&self) -> PathBuf {
        self.ctx.root.join(&self.ctx.config.changelog.file)
    }

    /// Prepend the notes to the changelog file and stage it.
    ///
    /// The entry title comes from `create_changelog_title`, falling back to
    /// the version being released.
    #[instrument(skip(self, notes))]
    pub async fn add_to_changelog(&self, notes: &str, version: &str) -> Result<PathBuf> {
        let title = match self.create_changelog_title.call(()).await {
            Some(title) => title,
            None => self.ctx.prefix_release(version),
        };
        let date = chrono::Local::now().format(CHANGELOG_DATE_FORMAT).to_string();
        let path = self.changelog_path();

        prepend_changelog(&path, &title, &date, notes).await?;
        self.ctx.vcs.stage_file(&path).await?;
        Ok(path)
    }

    /// Labels that belong on the project for the current configuration
    pub fn project_labels(&self) -> Vec<&LabelDefinition> {
        let only_publish = self.ctx.config.only_publish_with_release_label;
        self.taxonomy
            .labels()
            .iter()
            .filter(|label| match label.release_type {
                Some(ReleaseType::Release) => only_publish,
                Some(ReleaseType::Skip) => !only_publish,
                _ => true,
            })
            .collect()
    }

    /// Create missing labels on the provider and update existing ones.
    ///
    /// Existence is checked case-insensitively. Returns the label names that
    /// were (or in a dry run would be) written.
    #[instrument(skip(self))]
    pub async fn add_labels_to_project(&self, dry_run: bool) -> Result<Vec<String>> {
        let existing: HashSet<String> = self
            .ctx
            .provider
            .get_project_labels()
            .await?
            .into_iter()
            .map(|name| name.to_lowercase())
            .collect();

        let mut written = Vec::new();
        for label in self.project_labels() {
            let exists = existing.contains(&label.name.to_lowercase());
            if dry_run {
                info!(label = %label.name, exists, "would write label");
            } else if exists {
                self.ctx
                    .provider
                    .update_label(label)
                    .await
                    .map_err(|e| PublishError::provider("update label", &label.name, e))?;
            } else {
                self.ctx
                    .provider
                    .create_label(label)
                    .await
                    .map_err(|e| PublishError::provider("create label", &label.name, e))?;
            }
            written.push(label.name.clone());
        }

        info!(count = written.len(), dry_run, "synced project labels");
        Ok(written)
    }
}

impl std::fmt::Debug for Release {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Release")
            .field("ctx", &self.ctx)
            .field("log_parse", &self.log_parse)
            .finish_non_exhaustive()
    }
}
