//! Commit normalization: raw git commits into labelled, attributed commits

use futures::future::join_all;
use tracing::{debug, instrument};

use liftoff_core::commit::{Commit, CommitAuthor, RawCommit};
use liftoff_core::hooks::{BailHook, WaterfallHook};

/// Extension points of commit normalization
#[derive(Debug, Clone)]
pub struct LogParseHooks {
    /// Transform a commit; taps run in registration order
    pub parse_commit: WaterfallHook<Commit>,
    /// Return `Some(true)` to drop a commit from the release
    pub omit_commit: BailHook<Commit, bool>,
}

impl LogParseHooks {
    /// Create untapped hooks
    pub fn new() -> Self {
        Self {
            parse_commit: WaterfallHook::new("parseCommit"),
            omit_commit: BailHook::new("omitCommit"),
        }
    }

    /// Append the taps of another bundle
    pub fn extend(&mut self, other: &LogParseHooks) {
        self.parse_commit.extend(&other.parse_commit);
        self.omit_commit.extend(&other.omit_commit);
    }
}

impl Default for LogParseHooks {
    fn default() -> Self {
        Self::new()
    }
}

/// Whether a subject is git's default message for merging a branch
pub fn is_branch_merge_marker(subject: &str) -> bool {
    subject.starts_with("Merge branch '") || subject.starts_with("Merge remote-tracking branch '")
}

/// Turns raw log entries into normalized commits
#[derive(Debug, Clone)]
pub struct LogParse {
    /// Normalization extension points
    pub hooks: LogParseHooks,
}

impl LogParse {
    /// Create a parser with the default omission rule tapped
    pub fn new() -> Self {
        let mut hooks = LogParseHooks::new();
        hooks.omit_commit.tap("Merge markers", |commit: Commit| {
            let bare_merge = is_branch_merge_marker(&commit.subject)
                && commit.pull_request.is_none()
                && commit.labels.is_empty();
            bare_merge.then_some(true)
        });
        Self { hooks }
    }

    /// Normalize one commit, `None` when an omission rule drops it
    #[instrument(skip_all, fields(hash = %raw.hash))]
    pub async fn normalize_commit(&self, raw: RawCommit) -> Option<Commit> {
        let mut commit = Commit::from(raw);
        let git_author = CommitAuthor::from_git(&commit.author_name, &commit.author_email)
            .with_hash(commit.hash.clone());
        if git_author.has_identity() {
            commit.authors.push(git_author);
        }

        let commit = self.hooks.parse_commit.call(commit).await;

        if self.hooks.omit_commit.call(commit.clone()).await == Some(true) {
            debug!(subject = %commit.subject, "omitting commit");
            return None;
        }

        Some(commit)
    }

    /// Normalize a batch concurrently, keeping input order
    #[instrument(skip_all, fields(count = raws.len()))]
    pub async fn normalize_commits(&self, raws: Vec<RawCommit>) -> Vec<Commit> {
        join_all(raws.into_iter().map(|raw| self.normalize_commit(raw)))
            .await
            .into_iter()
            .flatten()
            .collect()
    }
}

impl Default for LogParse {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(hash: &str, subject: &str) -> RawCommit {
        RawCommit::new(hash, subject, "Jane Doe", "jane@example.com")
    }

    #[tokio::test]
    async fn test_normalize_attaches_git_author() {
        let parse = LogParse::new();
        let commit = parse
            .normalize_commit(raw("abc", "Fix bug").with_pull_request(3, None))
            .await
            .unwrap();

        assert_eq!(commit.pr_number(), Some(3));
        assert_eq!(commit.authors.len(), 1);
        assert_eq!(commit.authors[0].email.as_deref(), Some("jane@example.com"));
        assert_eq!(commit.authors[0].hash.as_deref(), Some("abc"));
    }

    #[tokio::test]
    async fn test_branch_merge_marker_omitted() {
        let parse = LogParse::new();
        assert!(parse
            .normalize_commit(raw("a", "Merge branch 'main' into feature"))
            .await
            .is_none());
        assert!(parse
            .normalize_commit(raw("b", "Merge remote-tracking branch 'origin/main'"))
            .await
            .is_none());

        let with_pr = raw("c", "Merge branch 'main' into feature").with_pull_request(4, None);
        assert!(parse.normalize_commit(with_pr).await.is_some());
    }

    #[tokio::test]
    async fn test_merge_marker_with_labels_kept() {
        let mut parse = LogParse::new();
        parse
            .hooks
            .parse_commit
            .tap("label", |c: Commit| c.with_labels(["patch"]));
        assert!(parse
            .normalize_commit(raw("a", "Merge branch 'hotfix'"))
            .await
            .is_some());
    }

    #[tokio::test]
    async fn test_taps_run_in_order_and_order_is_kept() {
        let mut parse = LogParse::new();
        parse.hooks.parse_commit.tap("first", |mut c: Commit| {
            c.subject.push_str(" 1");
            c
        });
        parse.hooks.parse_commit.tap_async("second", |mut c: Commit| async move {
            c.subject.push_str(" 2");
            c
        });
        parse.hooks.omit_commit.tap("drop-b", |c: Commit| (c.hash == "b").then_some(true));

        let commits = parse
            .normalize_commits(vec![raw("a", "A"), raw("b", "B"), raw("c", "C")])
            .await;
        let subjects: Vec<_> = commits.iter().map(|c| c.subject.as_str()).collect();
        assert_eq!(subjects, vec!["A 1 2", "C 1 2"]);
    }
}
