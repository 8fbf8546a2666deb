//! Version labels from conventional commit subjects

use std::sync::{Arc, OnceLock};

use regex::Regex;
use tracing::{debug, warn};

use liftoff_core::commit::Commit;
use liftoff_core::labels::{LabelTaxonomy, VersionLabels};
use liftoff_core::types::ReleaseType;

use crate::context::ReleaseContext;
use crate::hooks::LifecycleHooks;
use crate::log_parse::is_branch_merge_marker;
use crate::plugins::Plugin;

fn header_regex() -> &'static Regex {
    static HEADER: OnceLock<Regex> = OnceLock::new();
    HEADER.get_or_init(|| Regex::new(r"^(\w+)(\([^)]*\))?(!)?: ").expect("valid regex"))
}

/// Labels commits that have no version label from their conventional header
#[derive(Debug, Clone, Copy, Default)]
pub struct ConventionalCommitsPlugin;

/// Release type implied by a conventional commit
fn release_type_of(commit: &Commit) -> Option<ReleaseType> {
    classify(&commit.subject, &commit.body)
}

/// Release type implied by a full commit message
fn message_release_type(message: &str) -> Option<ReleaseType> {
    let (subject, body) = message.split_once('\n').unwrap_or((message, ""));
    classify(subject.trim_end(), body)
}

fn classify(subject: &str, body: &str) -> Option<ReleaseType> {
    let captures = header_regex().captures(subject)?;

    if captures.get(3).is_some() || body.contains("BREAKING CHANGE") {
        return Some(ReleaseType::Major);
    }
    match captures.get(1).map(|m| m.as_str()) {
        Some("feat") => Some(ReleaseType::Minor),
        Some("fix") => Some(ReleaseType::Patch),
        _ => None,
    }
}

fn has_semver_label(commit: &Commit, version_labels: &VersionLabels) -> bool {
    commit.labels.iter().any(|label| {
        version_labels
            .release_type_of(label)
            .is_some_and(|t| t.is_semver())
    })
}

impl Plugin for ConventionalCommitsPlugin {
    fn name(&self) -> &'static str {
        "conventional-commits"
    }

    fn apply(&self, ctx: &ReleaseContext, hooks: &mut LifecycleHooks) {
        let version_labels = ctx.version_labels.clone();
        hooks
            .log_parse
            .parse_commit
            .tap(self.name(), move |mut commit: Commit| {
                if has_semver_label(&commit, &version_labels) {
                    return commit;
                }
                let label = release_type_of(&commit)
                    .and_then(|t| version_labels.get(t).first().cloned());
                if let Some(label) = label {
                    debug!(hash = %commit.hash, %label, "labelled from conventional commit");
                    commit.add_labels([label]);
                }
                commit
            });

        // Merge commits of pull requests with conventional commits are dropped.
        let version_labels = ctx.version_labels.clone();
        let titled: Vec<String> = LabelTaxonomy::new(ctx.config.labels.clone())
            .labels()
            .iter()
            .filter(|l| l.changelog_title.is_some())
            .map(|l| l.name.clone())
            .collect();
        let provider = Arc::clone(&ctx.provider);
        hooks
            .log_parse
            .omit_commit
            .tap_async(self.name(), move |commit: Commit| {
                let provider = Arc::clone(&provider);
                let keep = !is_merge_commit(&commit)
                    || has_semver_label(&commit, &version_labels)
                    || commit.labels.iter().any(|l| titled.contains(l));
                async move {
                    if keep {
                        return None;
                    }
                    let number = commit.pr_number()?;
                    let children = match provider.get_commits_for_pr(number).await {
                        Ok(children) => children,
                        Err(err) => {
                            warn!(pr = number, error = %err, "could not list pull request commits");
                            return None;
                        }
                    };
                    children
                        .iter()
                        .filter(|c| c.sha != commit.hash)
                        .any(|c| message_release_type(&c.message).is_some())
                        .then_some(true)
                }
            });
    }
}

/// Whether a subject is one of git's or the platform's merge messages
fn is_merge_marker(subject: &str) -> bool {
    subject.starts_with("Merge pull request #") || is_branch_merge_marker(subject)
}

/// Merge markers, plus pull request merges whose subject was taken from the
/// message body (only those record the merged `owner/branch`)
fn is_merge_commit(commit: &Commit) -> bool {
    is_merge_marker(&commit.subject)
        || commit
            .pull_request
            .as_ref()
            .is_some_and(|pr| pr.base.is_some())
}
