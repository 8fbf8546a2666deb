//! Provider-backed commit enrichment
//!
//! Three stages are tapped onto the `parse_commit` waterfall:
//! - **Author Info**: resolve everyone who contributed to the commit
//! - **PR Information**: merge pull request labels, body and opener
//! - **PR Commits**: find the pull request of rebased commits
//!
//! A provider failure inside a stage is logged and the commit continues with
//! the metadata it had before the stage.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use tracing::{debug, instrument, warn};

use liftoff_core::commit::{normalize_label_set, Commit, CommitAuthor, PullRequestRef};
use liftoff_core::error::{LiftoffError, Result};
use liftoff_core::memo::Memo;
use liftoff_core::provider::{PrCommit, Provider, PullRequest, ReleaseInfo, User};
use liftoff_core::vcs::Vcs;

use crate::log_parse::LogParseHooks;

/// Author identity from a platform user
fn author_from_user(user: User) -> CommitAuthor {
    CommitAuthor {
        name: user.name,
        email: user.email,
        username: Some(user.login),
        hash: None,
    }
}

/// Pull request labels first, then the commit's own
fn merge_labels(commit: &mut Commit, pr_labels: &[String]) {
    let existing = std::mem::take(&mut commit.labels);
    commit.labels = normalize_label_set(pr_labels.iter().chain(existing.iter()));
}

/// Enriches commits with data from the code-hosting platform
pub struct Enricher {
    provider: Arc<dyn Provider>,
    vcs: Arc<dyn Vcs>,
    prs_since_release: Memo<Vec<PullRequest>>,
}

impl Enricher {
    /// Create an enricher
    pub fn new(provider: Arc<dyn Provider>, vcs: Arc<dyn Vcs>) -> Arc<Self> {
        Arc::new(Self {
            provider,
            vcs,
            prs_since_release: Memo::new(),
        })
    }

    /// Tap the enrichment stages onto `parse_commit`, in order
    pub fn register(self: &Arc<Self>, hooks: &mut LogParseHooks) {
        let this = Arc::clone(self);
        hooks.parse_commit.tap_async("Author Info", move |commit| {
            let this = Arc::clone(&this);
            async move { this.attach_author(commit).await }
        });

        let this = Arc::clone(self);
        hooks.parse_commit.tap_async("PR Information", move |commit| {
            let this = Arc::clone(&this);
            async move { this.add_pr_info(commit).await }
        });

        let this = Arc::clone(self);
        hooks.parse_commit.tap_async("PR Commits", move |commit| {
            let this = Arc::clone(&this);
            async move { this.attach_rebased_pr(commit).await }
        });
    }

    /// Forget the cached pull requests merged since the last release
    pub fn invalidate(&self) {
        self.prs_since_release.invalidate();
    }

    /// Resolve the commit's authors.
    ///
    /// With a pull request every PR commit contributes its author; otherwise
    /// the commit itself is looked up by login, then by email.
    #[instrument(skip_all, fields(hash = %commit.hash))]
    pub async fn attach_author(&self, mut commit: Commit) -> Commit {
        let resolved = match commit.pr_number() {
            Some(number) => match self.provider.get_commits_for_pr(number).await {
                Ok(pr_commits) => {
                    join_all(pr_commits.iter().map(|c| self.resolve_pr_commit_author(c))).await
                }
                Err(e) => {
                    warn!(pr = number, error = %e, "could not fetch pull request commits");
                    return commit;
                }
            },
            None => vec![self.resolve_commit_author(&commit).await],
        };

        let resolved: Vec<CommitAuthor> =
            resolved.into_iter().filter(|a| a.has_identity()).collect();
        if resolved.is_empty() {
            return commit;
        }

        commit.authors.clear();
        for author in resolved {
            debug!(
                username = ?author.username,
                email = ?author.email,
                name = ?author.name,
                "found author"
            );
            commit.add_author(author);
        }
        commit
    }

    async fn resolve_pr_commit_author(&self, pr_commit: &PrCommit) -> CommitAuthor {
        let git = CommitAuthor::from_git(
            pr_commit.author_name.as_deref().unwrap_or_default(),
            pr_commit.author_email.as_deref().unwrap_or_default(),
        )
        .with_hash(pr_commit.sha.clone());

        let Some(login) = &pr_commit.author_login else {
            return git;
        };
        match self.provider.get_user_by_username(login).await {
            Ok(user) => author_from_user(user).merge(&git),
            Err(e) => {
                warn!(login = %login, error = %e, "could not look up user");
                git.with_username(login.clone())
            }
        }
    }

    async fn resolve_commit_author(&self, commit: &Commit) -> CommitAuthor {
        let git = CommitAuthor::from_git(&commit.author_name, &commit.author_email)
            .with_hash(commit.hash.clone());

        let login = match self.provider.get_commit(&commit.hash).await {
            Ok(found) => found.author_login,
            Err(e) => {
                debug!(error = %e, "commit not known to the provider");
                None
            }
        };

        if let Some(login) = login {
            return match self.provider.get_user_by_username(&login).await {
                Ok(user) => author_from_user(user).merge(&git),
                Err(e) => {
                    warn!(login = %login, error = %e, "could not look up user");
                    git.with_username(login)
                }
            };
        }

        if commit.author_email.is_empty() {
            return git;
        }
        match self.provider.get_user_by_email(&commit.author_email).await {
            Ok(Some(user)) => author_from_user(user).merge(&git),
            Ok(None) => git,
            Err(e) => {
                warn!(error = %e, "could not look up user by email");
                git
            }
        }
    }

    /// Merge pull request labels and body, and add the opener as an author
    #[instrument(skip_all, fields(hash = %commit.hash))]
    pub async fn add_pr_info(&self, mut commit: Commit) -> Commit {
        let Some(number) = commit.pr_number() else {
            return commit;
        };

        let pr = match self.provider.get_pull_request(number).await {
            Ok(pr) => pr,
            Err(e) => {
                warn!(pr = number, error = %e, "could not fetch pull request");
                return commit;
            }
        };

        merge_labels(&mut commit, &pr.labels);
        if let Some(pr_ref) = commit.pull_request.as_mut() {
            pr_ref.body = pr.body.clone();
        }

        if let Some(opener) = &pr.user {
            let listed = commit
                .authors
                .iter()
                .any(|a| a.username.as_deref() == Some(opener.as_str()));
            if !listed {
                match self.provider.get_user_by_username(opener).await {
                    Ok(user) => commit.add_author(author_from_user(user)),
                    Err(e) => warn!(login = %opener, error = %e, "could not look up PR opener"),
                }
            }
        }

        commit
    }

    /// Attach the pull request whose merge commit is this commit
    #[instrument(skip_all, fields(hash = %commit.hash))]
    pub async fn attach_rebased_pr(&self, mut commit: Commit) -> Commit {
        if commit.pull_request.is_some() {
            return commit;
        }

        let prs = match self.prs_since_last_release().await {
            Ok(prs) => prs,
            Err(e) => {
                warn!(error = %e, "could not search merged pull requests");
                return commit;
            }
        };

        if let Some(pr) = prs
            .iter()
            .find(|pr| pr.merge_commit_sha.as_deref() == Some(commit.hash.as_str()))
        {
            debug!(pr = pr.number, "matched rebased commit to pull request");
            merge_labels(&mut commit, &pr.labels);
            commit.pull_request = Some(PullRequestRef::new(pr.number));
        }

        commit
    }

    /// Pull requests merged since the latest release, fetched once
    async fn prs_since_last_release(&self) -> Result<Vec<PullRequest>> {
        self.prs_since_release
            .get_or_try_init(|| async {
                let since = self.last_release_date().await?;
                debug!(%since, "searching pull requests merged since last release");
                self.provider
                    .search_merged_prs_since(since)
                    .await
                    .map_err(LiftoffError::from)
            })
            .await
    }

    /// Publish date of the latest release, or the date of the first commit
    async fn last_release_date(&self) -> Result<DateTime<Utc>> {
        match self.provider.get_latest_release_info().await {
            Ok(Some(ReleaseInfo {
                published_at: Some(published_at),
                ..
            })) => Ok(published_at),
            Ok(_) => self.first_commit_date().await,
            Err(e) => {
                debug!(error = %e, "no latest release, falling back to first commit");
                self.first_commit_date().await
            }
        }
    }

    async fn first_commit_date(&self) -> Result<DateTime<Utc>> {
        let first = self.vcs.first_commit().await?;
        self.vcs.commit_date(&first).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log_parse::LogParse;
    use crate::testing::{raw, MockProvider, MockVcs};

    fn pr_commit(sha: &str, login: Option<&str>, name: &str, email: &str) -> PrCommit {
        PrCommit {
            sha: sha.to_string(),
            author_name: Some(name.to_string()),
            author_email: Some(email.to_string()),
            author_login: login.map(str::to_string),
            message: String::new(),
        }
    }

    fn parser(provider: MockProvider) -> (LogParse, Arc<MockProvider>) {
        let provider = Arc::new(provider);
        let enricher = Enricher::new(provider.clone(), Arc::new(MockVcs::new()));
        let mut parse = LogParse::new();
        let mut hooks = LogParseHooks::new();
        enricher.register(&mut hooks);
        hooks.extend(&parse.hooks);
        parse.hooks = hooks;
        (parse, provider)
    }

    #[tokio::test]
    async fn test_stage_order() {
        let (parse, _) = parser(MockProvider::new());
        assert_eq!(
            parse.hooks.parse_commit.tap_names(),
            vec!["Author Info", "PR Information", "PR Commits"]
        );
    }

    #[tokio::test]
    async fn test_pr_commit_authors_and_labels() {
        let provider = MockProvider::new()
            .with_user("jane", "Jane Doe", "jane@example.com")
            .with_user("bob", "Bob", "bob@example.com")
            .with_pr_commits(
                7,
                vec![
                    pr_commit("s1", Some("jane"), "Jane Doe", "jane@example.com"),
                    pr_commit("s2", None, "Ann", "ann@example.com"),
                    pr_commit("s3", Some("jane"), "Jane Doe", "jane@example.com"),
                ],
            )
            .with_pr(
                PullRequest::new(7, "Add rockets")
                    .with_labels(["minor", "documentation"])
                    .with_body("# Release Notes\nFly")
                    .with_user("bob"),
            );
        let (parse, _) = parser(provider);

        let commit = parse
            .normalize_commit(raw("m1", "Add rockets").with_pull_request(7, None))
            .await
            .unwrap();

        let usernames: Vec<_> = commit.authors.iter().map(|a| a.username.clone()).collect();
        assert_eq!(
            usernames,
            vec![Some("jane".to_string()), None, Some("bob".to_string())]
        );
        assert_eq!(commit.labels, vec!["minor", "documentation"]);
        assert_eq!(
            commit.pull_request.unwrap().body.as_deref(),
            Some("# Release Notes\nFly")
        );
    }

    #[tokio::test]
    async fn test_commit_author_by_login_then_email() {
        let provider = MockProvider::new()
            .with_user("jane", "Jane Doe", "jane@example.com")
            .with_commit_login("c1", "jane");
        let (parse, _) = parser(provider);

        let commit = parse.normalize_commit(raw("c1", "Direct")).await.unwrap();
        assert_eq!(commit.authors.len(), 1);
        assert_eq!(commit.authors[0].username.as_deref(), Some("jane"));
        assert_eq!(commit.authors[0].hash.as_deref(), Some("c1"));

        // Not known by hash, found by email
        let commit = parse.normalize_commit(raw("c2", "Other")).await.unwrap();
        assert_eq!(commit.authors[0].username.as_deref(), Some("jane"));
    }

    #[tokio::test]
    async fn test_provider_failure_passes_commit_through() {
        let provider = MockProvider::new()
            .failing("get_commits_for_pr")
            .failing("get_pull_request")
            .failing("search_merged_prs_since");
        let (parse, _) = parser(provider);

        let commit = parse
            .normalize_commit(raw("m1", "Fix").with_pull_request(3, None))
            .await
            .unwrap();
        assert_eq!(commit.pr_number(), Some(3));
        assert!(commit.labels.is_empty());
        assert_eq!(commit.authors[0].email.as_deref(), Some("jane@example.com"));

        let commit = parse.normalize_commit(raw("c1", "Direct")).await.unwrap();
        assert!(commit.pull_request.is_none());
    }

    #[tokio::test]
    async fn test_rebased_commit_matched_once() {
        let mut provider = MockProvider::new();
        provider.merged_prs = vec![PullRequest::new(9, "Rebased")
            .with_labels(["patch"])
            .with_merge_commit("r2", crate::testing::date(2))];
        let (parse, provider) = parser(provider);

        let commits = parse
            .normalize_commits(vec![raw("r1", "One"), raw("r2", "Two"), raw("r3", "Three")])
            .await;

        assert_eq!(commits.len(), 3);
        assert_eq!(commits[1].pr_number(), Some(9));
        assert_eq!(commits[1].labels, vec!["patch"]);
        assert!(commits[0].pull_request.is_none());
        assert_eq!(provider.call_count("search_merged_prs_since"), 1);
    }
}
