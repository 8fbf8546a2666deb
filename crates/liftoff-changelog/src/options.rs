//! Changelog rendering options

use liftoff_core::labels::LabelDefinition;
use liftoff_core::types::ReleaseType;
use serde::{Deserialize, Serialize};

/// Name of the label attached to commits pushed straight to the base branch
pub const PUSH_TO_BASE_BRANCH_LABEL: &str = "pushToBaseBranch";

/// What the changelog needs to know about the project
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangelogOptions {
    /// Repository owner
    pub owner: String,
    /// Repository name
    pub repo: String,
    /// Web URL of the repository (`https://github.com/owner/repo`)
    pub base_url: String,
    /// Effective label definitions, in configured order
    pub labels: Vec<LabelDefinition>,
    /// Branch releases are cut from
    pub base_branch: String,
    /// Branches that publish prereleases
    pub prerelease_branches: Vec<String>,
}

impl ChangelogOptions {
    /// Create options for a repository.
    ///
    /// A `pushToBaseBranch` label is added when the given labels do not
    /// define one.
    pub fn new(
        owner: impl Into<String>,
        repo: impl Into<String>,
        base_url: impl Into<String>,
        labels: Vec<LabelDefinition>,
        base_branch: impl Into<String>,
        prerelease_branches: Vec<String>,
    ) -> Self {
        let base_branch = base_branch.into();
        let mut labels = labels;
        if !labels.iter().any(|l| l.name == PUSH_TO_BASE_BRANCH_LABEL) {
            labels.push(
                LabelDefinition::new(PUSH_TO_BASE_BRANCH_LABEL)
                    .with_changelog_title(format!("⚠️  Pushed to {}", base_branch))
                    .with_description("N/A")
                    .with_release_type(ReleaseType::Patch),
            );
        }

        Self {
            owner: owner.into(),
            repo: repo.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            labels,
            base_branch,
            prerelease_branches,
        }
    }

    /// Whether a branch publishes prereleases
    pub fn is_prerelease_branch(&self, branch: &str) -> bool {
        self.prerelease_branches.iter().any(|b| b == branch)
    }

    /// Name of the first label with the given release type, or the type name
    pub fn first_label_of(&self, release_type: ReleaseType) -> String {
        self.labels
            .iter()
            .find(|l| l.release_type == Some(release_type))
            .map(|l| l.name.clone())
            .unwrap_or_else(|| release_type.as_str().to_string())
    }

    /// Scheme and host of `base_url`, used for profile links
    pub fn origin(&self) -> String {
        match url::Url::parse(&self.base_url) {
            Ok(url) => url.origin().ascii_serialization(),
            Err(_) => self.base_url.clone(),
        }
    }
}
