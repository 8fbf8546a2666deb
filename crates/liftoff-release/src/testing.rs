//! In-memory VCS and provider doubles for pipeline tests

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};

use liftoff_core::commit::RawCommit;
use liftoff_core::config::Config;
use liftoff_core::error::{GitError, ProviderError, Result};
use liftoff_core::labels::{LabelDefinition, LabelTaxonomy};
use liftoff_core::provider::{
    CommitStatus, NewRelease, PrCommit, Project, Provider, ProviderCommit, ProviderResult,
    PullRequest, ReleaseInfo, User,
};
use liftoff_core::vcs::Vcs;

use crate::context::ReleaseContext;

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap()
}

pub fn date(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, day, 12, 0, 0).unwrap()
}

pub fn raw(hash: &str, subject: &str) -> RawCommit {
    RawCommit::new(hash, subject, "Jane Doe", "jane@example.com")
}

pub struct MockVcs {
    pub log: Vec<RawCommit>,
    pub released: HashSet<String>,
    pub first: String,
    pub head: String,
    pub branch: String,
    pub tags: Mutex<Vec<String>>,
    pub created_tags: Mutex<Vec<(String, String)>>,
    pub staged: Mutex<Vec<PathBuf>>,
    pub pushes: Mutex<Vec<(String, String)>>,
    pub log_requests: Mutex<Vec<String>>,
}

impl MockVcs {
    pub fn new() -> Self {
        Self {
            log: Vec::new(),
            released: HashSet::new(),
            first: "root000".to_string(),
            head: "head1234567890".to_string(),
            branch: "main".to_string(),
            tags: Mutex::new(Vec::new()),
            created_tags: Mutex::new(Vec::new()),
            staged: Mutex::new(Vec::new()),
            pushes: Mutex::new(Vec::new()),
            log_requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_log(mut self, log: Vec<RawCommit>) -> Self {
        self.log = log;
        self
    }

    pub fn with_tags(self, tags: &[&str]) -> Self {
        *lock(&self.tags) = tags.iter().map(|t| t.to_string()).collect();
        self
    }

    pub fn with_released(mut self, hash: &str) -> Self {
        self.released.insert(hash.to_string());
        self
    }

    pub fn on_branch(mut self, branch: &str) -> Self {
        self.branch = branch.to_string();
        self
    }

    pub fn created_tags(&self) -> Vec<String> {
        lock(&self.created_tags).iter().map(|(n, _)| n.clone()).collect()
    }

    pub fn pushes(&self) -> Vec<(String, String)> {
        lock(&self.pushes).clone()
    }

    pub fn staged(&self) -> Vec<PathBuf> {
        lock(&self.staged).clone()
    }

    pub fn log_requests(&self) -> Vec<String> {
        lock(&self.log_requests).clone()
    }
}

#[async_trait]
impl Vcs for MockVcs {
    async fn get_log(&self, from: &str, _to: Option<&str>) -> Result<Vec<RawCommit>> {
        lock(&self.log_requests).push(from.to_string());
        Ok(self.log.clone())
    }

    async fn is_ancestor(&self, hash: &str, _rev: &str) -> Result<bool> {
        Ok(self.released.contains(hash))
    }

    async fn first_commit(&self) -> Result<String> {
        Ok(self.first.clone())
    }

    async fn commit_date(&self, _rev: &str) -> Result<DateTime<Utc>> {
        Ok(date(1))
    }

    async fn head_sha(&self) -> Result<String> {
        Ok(self.head.clone())
    }

    async fn current_branch(&self) -> Result<String> {
        Ok(self.branch.clone())
    }

    async fn latest_tag(&self) -> Result<Option<String>> {
        Ok(lock(&self.tags).last().cloned())
    }

    async fn latest_tag_in_branch(&self) -> Result<Option<String>> {
        Ok(lock(&self.tags).last().cloned())
    }

    async fn previous_tag_in_branch(&self) -> Result<Option<String>> {
        let tags = lock(&self.tags);
        Ok(tags.iter().rev().nth(1).cloned())
    }

    async fn create_tag(&self, name: &str, message: &str) -> Result<()> {
        let mut tags = lock(&self.tags);
        if tags.iter().any(|t| t == name) {
            return Err(GitError::TagExists(name.to_string()).into());
        }
        tags.push(name.to_string());
        lock(&self.created_tags).push((name.to_string(), message.to_string()));
        Ok(())
    }

    async fn stage_file(&self, path: &Path) -> Result<()> {
        lock(&self.staged).push(path.to_path_buf());
        Ok(())
    }

    async fn push_tags(&self, remote: &str, branch: &str) -> Result<()> {
        lock(&self.pushes).push((remote.to_string(), branch.to_string()));
        Ok(())
    }
}

pub struct MockProvider {
    pub project: Project,
    pub pull_requests: HashMap<u64, PullRequest>,
    pub pr_commits: HashMap<u64, Vec<PrCommit>>,
    pub commits: HashMap<String, ProviderCommit>,
    pub users: HashMap<String, User>,
    pub latest_release: Option<ReleaseInfo>,
    pub merged_prs: Vec<PullRequest>,
    pub recent_prs: Vec<PullRequest>,
    pub labels: Vec<String>,
    pub failing: HashSet<&'static str>,
    pub calls: Mutex<Vec<String>>,
    pub published: Mutex<Vec<NewRelease>>,
    pub statuses: Mutex<Vec<CommitStatus>>,
    pub comments: Mutex<Vec<(u64, String)>>,
    pub created_labels: Mutex<Vec<String>>,
    pub updated_labels: Mutex<Vec<String>>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self {
            project: Project {
                owner: "acme".to_string(),
                repo: "rocket".to_string(),
                html_url: "https://github.com/acme/rocket".to_string(),
                default_branch: Some("main".to_string()),
            },
            pull_requests: HashMap::new(),
            pr_commits: HashMap::new(),
            commits: HashMap::new(),
            users: HashMap::new(),
            latest_release: None,
            merged_prs: Vec::new(),
            recent_prs: Vec::new(),
            labels: Vec::new(),
            failing: HashSet::new(),
            calls: Mutex::new(Vec::new()),
            published: Mutex::new(Vec::new()),
            statuses: Mutex::new(Vec::new()),
            comments: Mutex::new(Vec::new()),
            created_labels: Mutex::new(Vec::new()),
            updated_labels: Mutex::new(Vec::new()),
        }
    }

    pub fn with_pr(mut self, pr: PullRequest) -> Self {
        self.pull_requests.insert(pr.number, pr);
        self
    }

    pub fn with_pr_commits(mut self, number: u64, commits: Vec<PrCommit>) -> Self {
        self.pr_commits.insert(number, commits);
        self
    }

    pub fn with_user(mut self, login: &str, name: &str, email: &str) -> Self {
        self.users.insert(
            login.to_string(),
            User {
                login: login.to_string(),
                name: Some(name.to_string()),
                email: Some(email.to_string()),
            },
        );
        self
    }

    pub fn with_commit_login(mut self, sha: &str, login: &str) -> Self {
        self.commits.insert(
            sha.to_string(),
            ProviderCommit {
                sha: sha.to_string(),
                author_login: Some(login.to_string()),
            },
        );
        self
    }

    pub fn failing(mut self, operation: &'static str) -> Self {
        self.failing.insert(operation);
        self
    }

    pub fn call_count(&self, operation: &str) -> usize {
        lock(&self.calls).iter().filter(|c| *c == operation).count()
    }

    pub fn published(&self) -> Vec<NewRelease> {
        lock(&self.published).clone()
    }

    pub fn statuses(&self) -> Vec<CommitStatus> {
        lock(&self.statuses).clone()
    }

    pub fn comments(&self) -> Vec<(u64, String)> {
        lock(&self.comments).clone()
    }

    pub fn created_labels(&self) -> Vec<String> {
        lock(&self.created_labels).clone()
    }

    pub fn updated_labels(&self) -> Vec<String> {
        lock(&self.updated_labels).clone()
    }

    fn record(&self, operation: &'static str) -> ProviderResult<()> {
        lock(&self.calls).push(operation.to_string());
        if self.failing.contains(operation) {
            return Err(ProviderError::Status {
                operation: operation.to_string(),
                status: 500,
                message: "mock failure".to_string(),
            });
        }
        Ok(())
    }
}

fn not_found(operation: &str, entity: impl Into<String>) -> ProviderError {
    ProviderError::NotFound {
        operation: operation.to_string(),
        entity: entity.into(),
    }
}

#[async_trait]
impl Provider for MockProvider {
    async fn get_project(&self) -> ProviderResult<Project> {
        self.record("get_project")?;
        Ok(self.project.clone())
    }

    async fn get_pull_request(&self, number: u64) -> ProviderResult<PullRequest> {
        self.record("get_pull_request")?;
        self.pull_requests
            .get(&number)
            .cloned()
            .ok_or_else(|| not_found("get_pull_request", format!("#{}", number)))
    }

    async fn get_commits_for_pr(&self, number: u64) -> ProviderResult<Vec<PrCommit>> {
        self.record("get_commits_for_pr")?;
        Ok(self.pr_commits.get(&number).cloned().unwrap_or_default())
    }

    async fn get_commit(&self, sha: &str) -> ProviderResult<ProviderCommit> {
        self.record("get_commit")?;
        self.commits
            .get(sha)
            .cloned()
            .ok_or_else(|| not_found("get_commit", sha))
    }

    async fn get_user_by_username(&self, login: &str) -> ProviderResult<User> {
        self.record("get_user_by_username")?;
        self.users
            .get(login)
            .cloned()
            .ok_or_else(|| not_found("get_user_by_username", login))
    }

    async fn get_user_by_email(&self, email: &str) -> ProviderResult<Option<User>> {
        self.record("get_user_by_email")?;
        Ok(self
            .users
            .values()
            .find(|u| u.email.as_deref() == Some(email))
            .cloned())
    }

    async fn search_merged_prs_since(
        &self,
        _since: DateTime<Utc>,
    ) -> ProviderResult<Vec<PullRequest>> {
        self.record("search_merged_prs_since")?;
        Ok(self.merged_prs.clone())
    }

    async fn get_latest_release_info(&self) -> ProviderResult<Option<ReleaseInfo>> {
        self.record("get_latest_release_info")?;
        Ok(self.latest_release.clone())
    }

    async fn get_pull_requests(&self) -> ProviderResult<Vec<PullRequest>> {
        self.record("get_pull_requests")?;
        Ok(self.recent_prs.clone())
    }

    async fn get_project_labels(&self) -> ProviderResult<Vec<String>> {
        self.record("get_project_labels")?;
        Ok(self.labels.clone())
    }

    async fn create_label(&self, label: &LabelDefinition) -> ProviderResult<()> {
        self.record("create_label")?;
        lock(&self.created_labels).push(label.name.clone());
        Ok(())
    }

    async fn update_label(&self, label: &LabelDefinition) -> ProviderResult<()> {
        self.record("update_label")?;
        lock(&self.updated_labels).push(label.name.clone());
        Ok(())
    }

    async fn publish(&self, release: &NewRelease) -> ProviderResult<()> {
        self.record("publish")?;
        lock(&self.published).push(release.clone());
        Ok(())
    }

    async fn create_status(&self, status: &CommitStatus) -> ProviderResult<()> {
        self.record("create_status")?;
        lock(&self.statuses).push(status.clone());
        Ok(())
    }

    async fn create_comment(&self, number: u64, message: &str) -> ProviderResult<()> {
        self.record("create_comment")?;
        lock(&self.comments).push((number, message.to_string()));
        Ok(())
    }
}

/// A context over the given doubles with default configuration
pub fn context(
    config: Config,
    vcs: Arc<MockVcs>,
    provider: Arc<MockProvider>,
    root: &Path,
) -> ReleaseContext {
    let taxonomy = LabelTaxonomy::new(config.labels.clone());
    ReleaseContext::new(
        Arc::new(config),
        vcs,
        provider,
        taxonomy.version_labels().clone(),
        root,
    )
}
