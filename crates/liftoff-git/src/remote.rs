//! Remote operations

use std::path::Path;

use tracing::{info, instrument, warn};

use liftoff_core::error::GitError;

use crate::repository::{GitRepo, Result};

impl GitRepo {
    /// Get the URL for a remote
    pub fn remote_url(&self, name: &str) -> Result<Option<String>> {
        match self.repo.find_remote(name) {
            Ok(remote) => Ok(remote.url().map(|s| s.to_string())),
            Err(e) if e.code() == git2::ErrorCode::NotFound => {
                Err(GitError::RemoteNotFound(name.to_string()))
            }
            Err(e) => Err(GitError::Git2(e)),
        }
    }
}

/// Push a branch and its annotated tags using the git CLI.
///
/// The CLI picks up credential helpers and SSH agents that libgit2 does not.
#[instrument(fields(workdir = %workdir.display()))]
pub async fn git_push_with_tags(workdir: &Path, remote: &str, branch: &str) -> Result<()> {
    let start = std::time::Instant::now();
    let output = tokio::process::Command::new("git")
        .arg("-C")
        .arg(workdir)
        .args(["push", "--follow-tags", remote, branch])
        .output()
        .await
        .map_err(|e| GitError::PushFailed(e.to_string()))?;

    info!(
        remote,
        branch,
        duration_ms = start.elapsed().as_millis(),
        success = output.status.success(),
        "git push with tags (CLI)"
    );

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        warn!(remote, branch, stderr = %stderr, "git push failed");
        return Err(GitError::PushFailed(format!("{}/{}: {}", remote, branch, stderr)));
    }

    Ok(())
}
