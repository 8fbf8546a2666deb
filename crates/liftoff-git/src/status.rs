//! Working tree status and index operations

use std::path::Path;

use tracing::{debug, instrument};

use liftoff_core::error::GitError;

use crate::repository::{GitRepo, Result};

impl GitRepo {
    /// Check if the working directory is clean (no uncommitted changes)
    pub fn is_clean(&self) -> Result<bool> {
        let statuses = self.repo.statuses(None)?;

        Ok(!statuses.iter().any(|entry| {
            let status = entry.status();
            !status.is_ignored() && !status.is_empty()
        }))
    }

    /// Get the current branch name, `None` on a detached or unborn HEAD
    pub fn current_branch(&self) -> Result<Option<String>> {
        let head = match self.repo.head() {
            Ok(head) => head,
            Err(e) if e.code() == git2::ErrorCode::UnbornBranch => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        if head.is_branch() {
            Ok(head.shorthand().map(|s| s.to_string()))
        } else {
            Ok(None)
        }
    }

    /// Add a file to the index
    #[instrument(skip(self), fields(path = %path.display()))]
    pub fn stage_file(&self, path: &Path) -> Result<()> {
        let workdir = self
            .repo
            .workdir()
            .ok_or_else(|| GitError::OpenFailed("bare repository has no working tree".to_string()))?;
        let relative = path.strip_prefix(workdir).unwrap_or(path);

        let mut index = self.repo.index()?;
        index.add_path(relative)?;
        index.write()?;
        debug!(path = %relative.display(), "staged file");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::repository::test_support::repo_with_commits;

    #[test]
    fn test_clean_after_commit() {
        let (_temp, repo) = repo_with_commits(&["one"]);
        assert!(repo.is_clean().unwrap());
    }

    #[test]
    fn test_dirty_with_new_file() {
        let (temp, repo) = repo_with_commits(&["one"]);
        std::fs::write(temp.path().join("new.txt"), "new").unwrap();
        assert!(!repo.is_clean().unwrap());
    }

    #[test]
    fn test_current_branch() {
        let (_temp, repo) = repo_with_commits(&["one"]);
        let branch = repo.current_branch().unwrap();
        assert!(branch.is_some());
    }

    #[test]
    fn test_stage_file() {
        let (temp, repo) = repo_with_commits(&["one"]);
        let path = temp.path().join("CHANGELOG.md");
        std::fs::write(&path, "# v1.0.0").unwrap();
        repo.stage_file(&path).unwrap();

        let statuses = repo.inner().statuses(None).unwrap();
        assert!(statuses.iter().any(|s| s.status().is_index_new()));
    }
}
