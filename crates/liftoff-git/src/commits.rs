//! Commit history operations

use chrono::{DateTime, TimeZone, Utc};
use git2::Sort;
use tracing::{debug, instrument};

use liftoff_core::commit::RawCommit;
use liftoff_core::error::GitError;

use crate::message::parse_commit_message;
use crate::repository::{GitRepo, Result};

impl GitRepo {
    /// Commits reachable from `to` (default `HEAD`) and not from `from`, newest first
    #[instrument(skip(self))]
    pub fn log(&self, from: &str, to: Option<&str>) -> Result<Vec<RawCommit>> {
        let to_commit = match to {
            Some(rev) => self.resolve_commit(rev)?,
            None => self.head_commit()?,
        };
        let from_commit = self.resolve_commit(from)?;

        let mut revwalk = self.repo.revwalk()?;
        revwalk.set_sorting(Sort::TOPOLOGICAL | Sort::TIME)?;
        revwalk.push(to_commit.id())?;
        revwalk.hide(from_commit.id())?;

        let mut commits = Vec::new();
        for oid in revwalk {
            let commit = self.repo.find_commit(oid?)?;
            commits.push(commit_to_raw(&commit));
        }

        debug!(count = commits.len(), from, "read commit log");
        Ok(commits)
    }

    /// Whether `hash` is `rev` or one of its ancestors
    pub fn is_ancestor(&self, hash: &str, rev: &str) -> Result<bool> {
        let commit = self.resolve_commit(hash)?.id();
        let descendant = self.resolve_commit(rev)?.id();
        if commit == descendant {
            return Ok(true);
        }
        Ok(self.repo.graph_descendant_of(descendant, commit)?)
    }

    /// The root commit of the current branch
    pub fn first_commit(&self) -> Result<String> {
        let head = self.head_commit()?;
        let mut revwalk = self.repo.revwalk()?;
        revwalk.set_sorting(Sort::TOPOLOGICAL | Sort::REVERSE)?;
        revwalk.push(head.id())?;

        match revwalk.next() {
            Some(oid) => Ok(oid?.to_string()),
            None => Err(GitError::NoCommits),
        }
    }

    /// Commit time of a revision
    pub fn commit_date(&self, rev: &str) -> Result<DateTime<Utc>> {
        let commit = self.resolve_commit(rev)?;
        Ok(Utc
            .timestamp_opt(commit.time().seconds(), 0)
            .single()
            .unwrap_or_else(Utc::now))
    }

    /// Hash of HEAD
    pub fn head_sha(&self) -> Result<String> {
        Ok(self.head_commit()?.id().to_string())
    }
}

/// Convert a git2 Commit to a RawCommit
fn commit_to_raw(commit: &git2::Commit<'_>) -> RawCommit {
    let author = commit.author();
    parse_commit_message(
        &commit.id().to_string(),
        commit.summary().unwrap_or("(no message)"),
        commit.body().unwrap_or_default(),
        author.name().unwrap_or_default(),
        author.email().unwrap_or_default(),
    )
}
