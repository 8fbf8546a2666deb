//! Configuration types

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

use crate::labels::LabelConfig;

use super::defaults::{
    DEFAULT_API_URL, DEFAULT_BASE_BRANCH, DEFAULT_CHANGELOG_FILE, DEFAULT_PRERELEASE_BRANCH,
    DEFAULT_REMOTE, DEFAULT_STATUS_CONTEXT,
};

/// Main configuration for Liftoff
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Local configuration file this one builds on
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extends: Option<String>,

    /// Repository owner (detected from the git remote when unset)
    pub owner: Option<String>,

    /// Repository name (detected from the git remote when unset)
    pub repo: Option<String>,

    /// Branch full releases are made from
    #[serde(alias = "baseBranch")]
    pub base_branch: String,

    /// Branches that publish prereleases
    #[serde(alias = "prereleaseBranches")]
    pub prerelease_branches: Vec<String>,

    /// Only release when a merged pull request carries a `release` label
    #[serde(alias = "onlyPublishWithReleaseLabel")]
    pub only_publish_with_release_label: bool,

    /// Do not prefix tags with `v`
    #[serde(alias = "noVersionPrefix")]
    pub no_version_prefix: bool,

    /// User label definitions, merged with the defaults
    pub labels: Vec<LabelConfig>,

    /// Built-in plugins to enable, in registration order
    pub plugins: Vec<String>,

    /// Changelog configuration
    pub changelog: ChangelogConfig,

    /// Git configuration
    pub git: GitConfig,

    /// GitHub configuration
    pub github: GithubConfig,

    /// Shell commands to run on lifecycle hooks (used by the `exec` plugin)
    pub exec: HashMap<String, Vec<ExecHookConfig>>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            extends: None,
            owner: None,
            repo: None,
            base_branch: DEFAULT_BASE_BRANCH.to_string(),
            prerelease_branches: vec![DEFAULT_PRERELEASE_BRANCH.to_string()],
            only_publish_with_release_label: false,
            no_version_prefix: false,
            labels: Vec::new(),
            plugins: vec!["git-tag".to_string()],
            changelog: ChangelogConfig::default(),
            git: GitConfig::default(),
            github: GithubConfig::default(),
            exec: HashMap::new(),
        }
    }
}

impl Config {
    /// Whether a branch publishes prereleases
    pub fn is_prerelease_branch(&self, branch: &str) -> bool {
        self.prerelease_branches.iter().any(|b| b == branch)
    }
}

/// Changelog configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChangelogConfig {
    /// Whether to write the changelog file on release
    pub enabled: bool,

    /// Changelog file path, relative to the repository root
    pub file: PathBuf,
}

impl Default for ChangelogConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            file: PathBuf::from(DEFAULT_CHANGELOG_FILE),
        }
    }
}

/// Git configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GitConfig {
    /// Remote name
    pub remote: String,

    /// Whether to push tags after tagging
    pub push_tags: bool,
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            remote: DEFAULT_REMOTE.to_string(),
            push_tags: true,
        }
    }
}

/// GitHub configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GithubConfig {
    /// REST API base URL
    pub api_url: String,

    /// Context name used for pull request statuses
    pub status_context: String,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            status_context: DEFAULT_STATUS_CONTEXT.to_string(),
        }
    }
}

/// A shell command bound to a lifecycle hook
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExecHookConfig {
    /// Just the command
    Command(String),
    /// Command with options
    Detailed {
        /// Command to run
        command: String,
        /// Working directory
        #[serde(default)]
        cwd: Option<String>,
        /// Extra environment variables
        #[serde(default)]
        env: HashMap<String, String>,
        /// Whether a failing command fails the release
        #[serde(default = "default_fail_on_error")]
        fail_on_error: bool,
    },
}

fn default_fail_on_error() -> bool {
    true
}

impl ExecHookConfig {
    /// The command line
    pub fn command(&self) -> &str {
        match self {
            Self::Command(command) | Self::Detailed { command, .. } => command,
        }
    }
}
