//! GitHub REST API client
//!
//! ## Authentication
//!
//! Uses the `GH_TOKEN` or `GITHUB_TOKEN` environment variable.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use futures::future::try_join_all;
use reqwest::header::{HeaderMap, LINK};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, info, instrument};

use liftoff_core::error::{ConfigError, ProviderError};
use liftoff_core::labels::LabelDefinition;
use liftoff_core::provider::{
    CommitStatus, NewRelease, PrCommit, Project, Provider, ProviderCommit, ProviderResult,
    PullRequest, ReleaseInfo, User,
};

use crate::models::{
    GhCommit, GhIssueSearch, GhLabel, GhPullRequest, GhRelease, GhRepository, GhUser,
    GhUserSearch, LabelPayload,
};

const USER_AGENT: &str = concat!("liftoff/", env!("CARGO_PKG_VERSION"));
const TOKEN_VARS: [&str; 2] = ["GH_TOKEN", "GITHUB_TOKEN"];
const PER_PAGE: usize = 100;

/// GitHub client scoped to one repository
pub struct GithubClient {
    client: Client,
    api_url: String,
    owner: String,
    repo: String,
    token: String,
}

impl GithubClient {
    /// Create a client with an explicit token
    pub fn new(
        api_url: impl Into<String>,
        owner: impl Into<String>,
        repo: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Self {
            client: Client::new(),
            api_url: api_url.into().trim_end_matches('/').to_string(),
            owner: owner.into(),
            repo: repo.into(),
            token: token.into(),
        }
    }

    /// Create a client with the token taken from the environment
    pub fn from_env(
        api_url: impl Into<String>,
        owner: impl Into<String>,
        repo: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let token = Self::load_token()
            .ok_or_else(|| ConfigError::MissingField(TOKEN_VARS.join(" or ")))?;
        Ok(Self::new(api_url, owner, repo, token))
    }

    fn load_token() -> Option<String> {
        for var in TOKEN_VARS {
            if let Ok(token) = std::env::var(var) {
                if !token.is_empty() {
                    debug!(var, "Loaded GitHub token");
                    return Some(token);
                }
            }
        }
        None
    }

    /// Repository owner
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Repository name
    pub fn repo(&self) -> &str {
        &self.repo
    }

    fn repo_url(&self, path: &str) -> String {
        format!("{}/repos/{}/{}{}", self.api_url, self.owner, self.repo, path)
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Accept", "application/vnd.github+json")
            .header("User-Agent", USER_AGENT)
    }

    async fn send(&self, operation: &str, builder: RequestBuilder) -> ProviderResult<Response> {
        let response = self
            .authorized(builder)
            .send()
            .await
            .map_err(|e| ProviderError::Request {
                operation: operation.to_string(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ProviderError::Status {
                operation: operation.to_string(),
                status: status.as_u16(),
                message,
            });
        }

        Ok(response)
    }

    async fn get_json<T: DeserializeOwned>(&self, operation: &str, url: &str) -> ProviderResult<T> {
        debug!(url, "GET");
        let response = self.send(operation, self.client.get(url)).await?;
        decode(operation, response).await
    }

    /// Collect every page of a listing, following `Link: rel="next"`
    async fn get_pages<P, T>(
        &self,
        operation: &str,
        first: RequestBuilder,
        items: impl Fn(P) -> Vec<T>,
    ) -> ProviderResult<Vec<T>>
    where
        P: DeserializeOwned,
    {
        let mut all = Vec::new();
        let mut builder = first.query(&[("per_page", PER_PAGE.to_string())]);
        let mut page = 1;

        loop {
            let response = self.send(operation, builder).await?;
            let next = next_page_url(response.headers());
            let batch = items(decode(operation, response).await?);
            let last = batch.len() < PER_PAGE;
            all.extend(batch);

            match next {
                Some(url) if !last => {
                    page += 1;
                    debug!(operation, page, "fetching next page");
                    builder = self.client.get(url);
                }
                _ => break,
            }
        }

        Ok(all)
    }

    async fn post_json(
        &self,
        operation: &str,
        url: &str,
        body: &serde_json::Value,
    ) -> ProviderResult<()> {
        debug!(url, "POST");
        self.send(operation, self.client.post(url).json(body)).await?;
        Ok(())
    }
}

async fn decode<T: DeserializeOwned>(operation: &str, response: Response) -> ProviderResult<T> {
    response.json().await.map_err(|e| ProviderError::Decode {
        operation: operation.to_string(),
        message: e.to_string(),
    })
}

fn next_page_url(headers: &HeaderMap) -> Option<String> {
    headers
        .get(LINK)
        .and_then(|v| v.to_str().ok())
        .and_then(next_link)
}

/// The `rel="next"` target of a `Link` header
fn next_link(header: &str) -> Option<String> {
    header.split(',').find_map(|part| {
        let (target, params) = part.split_once(';')?;
        params
            .split(';')
            .any(|p| p.trim() == r#"rel="next""#)
            .then(|| {
                target
                    .trim()
                    .trim_start_matches('<')
                    .trim_end_matches('>')
                    .to_string()
            })
    })
}

/// Turn a 404 into a typed not-found error
fn not_found(err: ProviderError, entity: impl Into<String>) -> ProviderError {
    match err {
        ProviderError::Status {
            operation, status, ..
        } if status == StatusCode::NOT_FOUND.as_u16() => ProviderError::NotFound {
            operation,
            entity: entity.into(),
        },
        other => other,
    }
}

/// Search query for pull requests merged into a repository since a point in time
fn merged_since_query(owner: &str, repo: &str, since: DateTime<Utc>) -> String {
    format!(
        "repo:{}/{} is:pr is:merged merged:>={}",
        owner,
        repo,
        since.to_rfc3339_opts(SecondsFormat::Secs, true)
    )
}

#[async_trait]
impl Provider for GithubClient {
    #[instrument(skip(self))]
    async fn get_project(&self) -> ProviderResult<Project> {
        let repo: GhRepository = self.get_json("get project", &self.repo_url("")).await?;
        Ok(repo.into())
    }

    #[instrument(skip(self))]
    async fn get_pull_request(&self, number: u64) -> ProviderResult<PullRequest> {
        let url = self.repo_url(&format!("/pulls/{}", number));
        let pr: GhPullRequest = self
            .get_json("get pull request", &url)
            .await
            .map_err(|e| not_found(e, format!("pull request #{}", number)))?;
        Ok(pr.into())
    }

    #[instrument(skip(self))]
    async fn get_commits_for_pr(&self, number: u64) -> ProviderResult<Vec<PrCommit>> {
        let url = self.repo_url(&format!("/pulls/{}/commits", number));
        let commits = self
            .get_pages("get pull request commits", self.client.get(url), |page: Vec<GhCommit>| {
                page
            })
            .await?;
        Ok(commits.into_iter().map(Into::into).collect())
    }

    #[instrument(skip(self))]
    async fn get_commit(&self, sha: &str) -> ProviderResult<ProviderCommit> {
        let url = self.repo_url(&format!("/commits/{}", sha));
        let commit: GhCommit = self
            .get_json("get commit", &url)
            .await
            .map_err(|e| not_found(e, format!("commit {}", sha)))?;
        Ok(commit.into())
    }

    #[instrument(skip(self))]
    async fn get_user_by_username(&self, login: &str) -> ProviderResult<User> {
        let url = format!("{}/users/{}", self.api_url, login);
        let user: GhUser = self
            .get_json("get user", &url)
            .await
            .map_err(|e| not_found(e, format!("user {}", login)))?;
        Ok(user.into())
    }

    #[instrument(skip(self))]
    async fn get_user_by_email(&self, email: &str) -> ProviderResult<Option<User>> {
        let builder = self
            .client
            .get(format!("{}/search/users", self.api_url))
            .query(&[("q", format!("{} in:email", email))]);
        let response = self.send("search users", builder).await?;
        let search: GhUserSearch = decode("search users", response).await?;

        match search.items.into_iter().next() {
            Some(hit) => self.get_user_by_username(&hit.login).await.map(Some),
            None => Ok(None),
        }
    }

    #[instrument(skip(self))]
    async fn search_merged_prs_since(
        &self,
        since: DateTime<Utc>,
    ) -> ProviderResult<Vec<PullRequest>> {
        let builder = self
            .client
            .get(format!("{}/search/issues", self.api_url))
            .query(&[("q", merged_since_query(&self.owner, &self.repo, since))]);
        let hits = self
            .get_pages("search merged pull requests", builder, |search: GhIssueSearch| {
                search.items
            })
            .await?;

        // Search hits lack head/base refs, so fetch each pull request.
        let prs = try_join_all(hits.iter().map(|i| self.get_pull_request(i.number))).await?;
        debug!(count = prs.len(), "merged pull requests since last release");
        Ok(prs)
    }

    #[instrument(skip(self))]
    async fn get_latest_release_info(&self) -> ProviderResult<Option<ReleaseInfo>> {
        match self
            .get_json::<GhRelease>("get latest release", &self.repo_url("/releases/latest"))
            .await
        {
            Ok(release) => Ok(Some(release.into())),
            Err(ProviderError::Status { status: 404, .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    #[instrument(skip(self))]
    async fn get_pull_requests(&self) -> ProviderResult<Vec<PullRequest>> {
        let url = self.repo_url("/pulls?state=closed&sort=updated&direction=desc&per_page=100");
        let prs: Vec<GhPullRequest> = self.get_json("list pull requests", &url).await?;
        Ok(prs.into_iter().map(Into::into).collect())
    }

    #[instrument(skip(self))]
    async fn get_project_labels(&self) -> ProviderResult<Vec<String>> {
        let labels = self
            .get_pages(
                "list labels",
                self.client.get(self.repo_url("/labels")),
                |page: Vec<GhLabel>| page,
            )
            .await?;
        Ok(labels.into_iter().map(|l| l.name).collect())
    }

    #[instrument(skip(self, label), fields(label = %label.name))]
    async fn create_label(&self, label: &LabelDefinition) -> ProviderResult<()> {
        let body = serde_json::to_value(LabelPayload::from(label)).map_err(|e| {
            ProviderError::Decode {
                operation: "create label".to_string(),
                message: e.to_string(),
            }
        })?;
        self.post_json("create label", &self.repo_url("/labels"), &body)
            .await?;
        info!(label = %label.name, "Created label");
        Ok(())
    }

    #[instrument(skip(self, label), fields(label = %label.name))]
    async fn update_label(&self, label: &LabelDefinition) -> ProviderResult<()> {
        let url = self.repo_url(&format!("/labels/{}", encode_segment(&label.name)));
        let builder = self.client.patch(&url).json(&LabelPayload::from(label));
        self.send("update label", builder)
            .await
            .map_err(|e| not_found(e, format!("label {}", label.name)))?;
        info!(label = %label.name, "Updated label");
        Ok(())
    }

    #[instrument(skip(self, release), fields(tag = %release.tag_name))]
    async fn publish(&self, release: &NewRelease) -> ProviderResult<()> {
        let body = json!({
            "tag_name": release.tag_name,
            "name": release.tag_name,
            "body": release.body,
            "prerelease": release.prerelease,
        });
        self.post_json("publish release", &self.repo_url("/releases"), &body)
            .await?;
        info!(tag = %release.tag_name, prerelease = release.prerelease, "Published release");
        Ok(())
    }

    #[instrument(skip(self, status), fields(sha = %status.sha, state = status.state.as_str()))]
    async fn create_status(&self, status: &CommitStatus) -> ProviderResult<()> {
        let mut body = json!({
            "state": status.state.as_str(),
            "description": status.description,
            "context": status.context,
        });
        if let Some(target_url) = &status.target_url {
            body["target_url"] = json!(target_url);
        }
        let url = self.repo_url(&format!("/statuses/{}", status.sha));
        self.post_json("create status", &url, &body).await
    }

    #[instrument(skip(self, message))]
    async fn create_comment(&self, number: u64, message: &str) -> ProviderResult<()> {
        let url = self.repo_url(&format!("/issues/{}/comments", number));
        self.post_json("create comment", &url, &json!({ "body": message }))
            .await
    }
}

/// Percent-encode a label name for use as a path segment
fn encode_segment(segment: &str) -> String {
    let Ok(mut url) = url::Url::parse("https://api.github.com/") else {
        return segment.to_string();
    };
    if let Ok(mut segments) = url.path_segments_mut() {
        segments.pop_if_empty().push(segment);
    }
    url.path().trim_start_matches('/').to_string()
}
