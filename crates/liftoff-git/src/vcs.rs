//! [`Vcs`] implementation backed by a local git repository

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::debug;

use liftoff_core::commit::RawCommit;
use liftoff_core::error::{GitError, Result};
use liftoff_core::vcs::Vcs;

use crate::remote::git_push_with_tags;
use crate::repository::GitRepo;

/// Shares one [`GitRepo`] with the async release pipeline.
///
/// libgit2 handles are not `Sync`, so access is serialized through a mutex.
pub struct GitVcs {
    repo: Mutex<GitRepo>,
    workdir: PathBuf,
}

impl GitVcs {
    /// Wrap an opened repository
    pub fn new(repo: GitRepo) -> Self {
        let workdir = repo.path().to_path_buf();
        Self {
            repo: Mutex::new(repo),
            workdir,
        }
    }

    /// Discover the repository containing `path`
    pub fn discover(path: &Path) -> Result<Self> {
        Ok(Self::new(GitRepo::discover(path)?))
    }

    /// Repository working directory
    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    /// URL of a remote
    pub fn remote_url(&self, name: &str) -> Result<Option<String>> {
        Ok(self.lock().remote_url(name)?)
    }

    fn lock(&self) -> MutexGuard<'_, GitRepo> {
        match self.repo.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[async_trait]
impl Vcs for GitVcs {
    async fn get_log(&self, from: &str, to: Option<&str>) -> Result<Vec<RawCommit>> {
        Ok(self.lock().log(from, to)?)
    }

    async fn is_ancestor(&self, hash: &str, rev: &str) -> Result<bool> {
        Ok(self.lock().is_ancestor(hash, rev)?)
    }

    async fn first_commit(&self) -> Result<String> {
        Ok(self.lock().first_commit()?)
    }

    async fn commit_date(&self, rev: &str) -> Result<DateTime<Utc>> {
        Ok(self.lock().commit_date(rev)?)
    }

    async fn head_sha(&self) -> Result<String> {
        Ok(self.lock().head_sha()?)
    }

    async fn current_branch(&self) -> Result<String> {
        self.lock()
            .current_branch()?
            .ok_or_else(|| GitError::UnknownRevision("HEAD is not on a branch".to_string()).into())
    }

    async fn latest_tag(&self) -> Result<Option<String>> {
        Ok(self.lock().find_latest_tag()?.map(|t| t.name))
    }

    async fn latest_tag_in_branch(&self) -> Result<Option<String>> {
        Ok(self
            .lock()
            .latest_tag_reachable_from("HEAD")?
            .map(|t| t.name))
    }

    async fn previous_tag_in_branch(&self) -> Result<Option<String>> {
        let repo = self.lock();
        let head = repo.head_sha()?;
        let latest = repo.latest_tag_reachable_from("HEAD")?;
        // A tag on HEAD itself is the release being made; look behind it.
        let rev = match &latest {
            Some(tag) if tag.commit_hash == head => "HEAD^",
            _ => "HEAD",
        };
        let tag = repo.latest_tag_reachable_from(rev)?.map(|t| t.name);
        debug!(previous = ?tag, "previous tag in branch");
        Ok(tag)
    }

    async fn create_tag(&self, name: &str, message: &str) -> Result<()> {
        self.lock().create_tag(name, message)?;
        Ok(())
    }

    async fn stage_file(&self, path: &Path) -> Result<()> {
        Ok(self.lock().stage_file(path)?)
    }

    async fn push_tags(&self, remote: &str, branch: &str) -> Result<()> {
        Ok(git_push_with_tags(&self.workdir, remote, branch).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{commit_file, repo_with_commits};

    #[tokio::test]
    async fn test_vcs_log_and_tags() {
        let (temp, repo) = repo_with_commits(&["one"]);
        repo.create_tag("v1.0.0", "first").unwrap();
        commit_file(&temp, &repo, "two.txt", "Add two (#3)");

        let vcs = GitVcs::new(repo);
        let log = vcs.get_log("v1.0.0", None).await.unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].pr_number, Some(3));

        assert_eq!(vcs.latest_tag().await.unwrap().as_deref(), Some("v1.0.0"));
        assert_eq!(
            vcs.latest_tag_in_branch().await.unwrap().as_deref(),
            Some("v1.0.0")
        );
    }

    #[tokio::test]
    async fn test_previous_tag_skips_tag_on_head() {
        let (temp, repo) = repo_with_commits(&["one"]);
        repo.create_tag("v1.0.0", "first").unwrap();
        commit_file(&temp, &repo, "two.txt", "two");
        repo.create_tag("v1.1.0", "second").unwrap();

        let vcs = GitVcs::new(repo);
        assert_eq!(
            vcs.previous_tag_in_branch().await.unwrap().as_deref(),
            Some("v1.0.0")
        );
    }

    #[tokio::test]
    async fn test_create_tag_through_vcs() {
        let (_temp, repo) = repo_with_commits(&["one"]);
        let vcs = GitVcs::new(repo);
        vcs.create_tag("v0.1.0", "Release v0.1.0").await.unwrap();
        assert_eq!(vcs.latest_tag().await.unwrap().as_deref(), Some("v0.1.0"));
        assert!(vcs.create_tag("v0.1.0", "again").await.is_err());
    }
}
