//! GitHub REST response shapes and their conversion into provider types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use liftoff_core::labels::LabelDefinition;
use liftoff_core::provider::{
    PrCommit, Project, ProviderCommit, PullRequest, ReleaseInfo, User,
};

#[derive(Debug, Deserialize)]
pub(crate) struct GhOwner {
    pub login: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GhRepository {
    pub name: String,
    pub owner: GhOwner,
    pub html_url: String,
    #[serde(default)]
    pub default_branch: Option<String>,
}

impl From<GhRepository> for Project {
    fn from(repo: GhRepository) -> Self {
        Self {
            owner: repo.owner.login,
            repo: repo.name,
            html_url: repo.html_url,
            default_branch: repo.default_branch,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct GhLabel {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GhRef {
    #[serde(rename = "ref")]
    pub name: String,
    #[serde(default)]
    pub sha: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GhPullRequest {
    pub number: u64,
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub labels: Vec<GhLabel>,
    #[serde(default)]
    pub user: Option<GhOwner>,
    pub head: GhRef,
    pub base: GhRef,
    #[serde(default)]
    pub merge_commit_sha: Option<String>,
    #[serde(default)]
    pub merged_at: Option<DateTime<Utc>>,
}

impl From<GhPullRequest> for PullRequest {
    fn from(pr: GhPullRequest) -> Self {
        Self {
            number: pr.number,
            title: pr.title,
            body: pr.body,
            labels: pr.labels.into_iter().map(|l| l.name).collect(),
            user: pr.user.map(|u| u.login),
            head_sha: pr.head.sha,
            base_ref: pr.base.name,
            merge_commit_sha: pr.merge_commit_sha,
            merged_at: pr.merged_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct GhGitAuthor {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GhGitCommit {
    #[serde(default)]
    pub author: Option<GhGitAuthor>,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GhCommit {
    pub sha: String,
    pub commit: GhGitCommit,
    /// Platform account, absent when the email is not linked to one
    #[serde(default)]
    pub author: Option<GhOwner>,
}

impl From<GhCommit> for PrCommit {
    fn from(c: GhCommit) -> Self {
        let (author_name, author_email) = match c.commit.author {
            Some(a) => (a.name, a.email),
            None => (None, None),
        };
        Self {
            sha: c.sha,
            author_name,
            author_email,
            author_login: c.author.map(|a| a.login),
            message: c.commit.message,
        }
    }
}

impl From<GhCommit> for ProviderCommit {
    fn from(c: GhCommit) -> Self {
        Self {
            sha: c.sha,
            author_login: c.author.map(|a| a.login),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct GhUser {
    pub login: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl From<GhUser> for User {
    fn from(u: GhUser) -> Self {
        Self {
            login: u.login,
            name: u.name,
            email: u.email,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct GhUserSearch {
    #[serde(default)]
    pub items: Vec<GhOwner>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GhIssue {
    pub number: u64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GhIssueSearch {
    #[serde(default)]
    pub items: Vec<GhIssue>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GhRelease {
    pub tag_name: String,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
}

impl From<GhRelease> for ReleaseInfo {
    fn from(r: GhRelease) -> Self {
        Self {
            tag_name: r.tag_name,
            published_at: r.published_at,
        }
    }
}

/// Body of a label create/update request
#[derive(Debug, Serialize)]
pub(crate) struct LabelPayload<'a> {
    pub name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<&'a str>,
}

impl<'a> From<&'a LabelDefinition> for LabelPayload<'a> {
    fn from(label: &'a LabelDefinition) -> Self {
        Self {
            name: &label.name,
            // GitHub wants the hex value without the leading '#'
            color: label.color.as_deref().map(|c| c.trim_start_matches('#')),
            description: label.description.as_deref(),
        }
    }
}
