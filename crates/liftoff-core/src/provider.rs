//! Code-hosting platform interface and the data it returns

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;
use crate::labels::LabelDefinition;

/// Result type for provider calls
pub type ProviderResult<T> = std::result::Result<T, ProviderError>;

/// Repository metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    /// Repository owner
    pub owner: String,
    /// Repository name
    pub repo: String,
    /// Web URL of the repository, used for links in the changelog
    pub html_url: String,
    /// Default branch
    pub default_branch: Option<String>,
}

/// A platform user
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Login
    pub login: String,
    /// Display name
    pub name: Option<String>,
    /// Public email
    pub email: Option<String>,
}

/// A pull request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequest {
    /// Number
    pub number: u64,
    /// Title
    pub title: String,
    /// Description
    pub body: Option<String>,
    /// Label names
    pub labels: Vec<String>,
    /// Login of whoever opened it
    pub user: Option<String>,
    /// Hash of the head commit
    pub head_sha: String,
    /// Branch the pull request targets
    pub base_ref: String,
    /// Hash of the merge commit, once merged
    pub merge_commit_sha: Option<String>,
    /// When it was merged
    pub merged_at: Option<DateTime<Utc>>,
}

impl PullRequest {
    /// Create an open pull request
    pub fn new(number: u64, title: impl Into<String>) -> Self {
        Self {
            number,
            title: title.into(),
            body: None,
            labels: Vec::new(),
            user: None,
            head_sha: String::new(),
            base_ref: String::new(),
            merge_commit_sha: None,
            merged_at: None,
        }
    }

    /// Set the body
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Set the labels
    pub fn with_labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.labels = labels.into_iter().map(Into::into).collect();
        self
    }

    /// Set the opener's login
    pub fn with_user(mut self, login: impl Into<String>) -> Self {
        self.user = Some(login.into());
        self
    }

    /// Set the head commit hash
    pub fn with_head_sha(mut self, sha: impl Into<String>) -> Self {
        self.head_sha = sha.into();
        self
    }

    /// Mark as merged through the given commit
    pub fn with_merge_commit(mut self, sha: impl Into<String>, merged_at: DateTime<Utc>) -> Self {
        self.merge_commit_sha = Some(sha.into());
        self.merged_at = Some(merged_at);
        self
    }
}

/// A commit as listed in a pull request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrCommit {
    /// Hash
    pub sha: String,
    /// Git author name
    pub author_name: Option<String>,
    /// Git author email
    pub author_email: Option<String>,
    /// Platform login of the author, when the platform could attribute it
    pub author_login: Option<String>,
    /// Full commit message
    #[serde(default)]
    pub message: String,
}

/// A commit as the platform knows it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderCommit {
    /// Hash
    pub sha: String,
    /// Platform login of the author
    pub author_login: Option<String>,
}

/// The latest published release
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseInfo {
    /// Tag the release points at
    pub tag_name: String,
    /// When it was published
    pub published_at: Option<DateTime<Utc>>,
}

/// A release to publish
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRelease {
    /// Tag name
    pub tag_name: String,
    /// Release notes
    pub body: String,
    /// Whether this is a prerelease
    pub prerelease: bool,
}

/// Commit status state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusState {
    Pending,
    Success,
    Error,
    Failure,
}

impl StatusState {
    /// Returns the string representation of the state
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Success => "success",
            Self::Error => "error",
            Self::Failure => "failure",
        }
    }
}

/// A commit status to report on a pull request head
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitStatus {
    /// Commit the status is attached to
    pub sha: String,
    /// State
    pub state: StatusState,
    /// Short description
    pub description: String,
    /// Status context name
    pub context: String,
    /// Link shown next to the status
    pub target_url: Option<String>,
}

/// Read and write access to the code-hosting platform
#[async_trait]
pub trait Provider: Send + Sync {
    /// Repository metadata
    async fn get_project(&self) -> ProviderResult<Project>;

    /// A single pull request
    async fn get_pull_request(&self, number: u64) -> ProviderResult<PullRequest>;

    /// Commits that make up a pull request
    async fn get_commits_for_pr(&self, number: u64) -> ProviderResult<Vec<PrCommit>>;

    /// A single commit
    async fn get_commit(&self, sha: &str) -> ProviderResult<ProviderCommit>;

    /// A user by login
    async fn get_user_by_username(&self, login: &str) -> ProviderResult<User>;

    /// A user by public email
    async fn get_user_by_email(&self, email: &str) -> ProviderResult<Option<User>>;

    /// Pull requests merged at or after a point in time
    async fn search_merged_prs_since(&self, since: DateTime<Utc>)
        -> ProviderResult<Vec<PullRequest>>;

    /// The latest published release, if any
    async fn get_latest_release_info(&self) -> ProviderResult<Option<ReleaseInfo>>;

    /// Recently closed pull requests, newest first
    async fn get_pull_requests(&self) -> ProviderResult<Vec<PullRequest>>;

    /// Label names defined on the repository
    async fn get_project_labels(&self) -> ProviderResult<Vec<String>>;

    /// Create a label
    async fn create_label(&self, label: &LabelDefinition) -> ProviderResult<()>;

    /// Update an existing label
    async fn update_label(&self, label: &LabelDefinition) -> ProviderResult<()>;

    /// Publish a release
    async fn publish(&self, release: &NewRelease) -> ProviderResult<()>;

    /// Report a commit status
    async fn create_status(&self, status: &CommitStatus) -> ProviderResult<()>;

    /// Comment on a pull request
    async fn create_comment(&self, number: u64, message: &str) -> ProviderResult<()>;
}
