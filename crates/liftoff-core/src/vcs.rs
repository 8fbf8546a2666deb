//! Version control interface used by the release pipeline

use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::commit::RawCommit;
use crate::error::Result;

/// Read and write access to the project's version control history
#[async_trait]
pub trait Vcs: Send + Sync {
    /// Commits reachable from `to` (default `HEAD`) but not from `from`, newest first
    async fn get_log(&self, from: &str, to: Option<&str>) -> Result<Vec<RawCommit>>;

    /// Whether `hash` is reachable from `rev`
    async fn is_ancestor(&self, hash: &str, rev: &str) -> Result<bool>;

    /// Hash of the root commit of the current branch
    async fn first_commit(&self) -> Result<String>;

    /// Commit time of a revision
    async fn commit_date(&self, rev: &str) -> Result<DateTime<Utc>>;

    /// Hash of `HEAD`
    async fn head_sha(&self) -> Result<String>;

    /// Name of the checked out branch
    async fn current_branch(&self) -> Result<String>;

    /// Highest version tag in the repository
    async fn latest_tag(&self) -> Result<Option<String>>;

    /// Most recent tag reachable from `HEAD`
    async fn latest_tag_in_branch(&self) -> Result<Option<String>>;

    /// Most recent tag reachable from `HEAD`'s parent
    async fn previous_tag_in_branch(&self) -> Result<Option<String>>;

    /// Create an annotated tag on `HEAD`
    async fn create_tag(&self, name: &str, message: &str) -> Result<()>;

    /// Stage a file for the next commit
    async fn stage_file(&self, path: &Path) -> Result<()>;

    /// Push the branch and tags to a remote
    async fn push_tags(&self, remote: &str, branch: &str) -> Result<()>;
}
