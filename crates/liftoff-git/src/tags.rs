//! Tag operations

use std::collections::HashMap;

use chrono::{TimeZone, Utc};
use git2::{Oid, Sort};
use semver::Version;
use tracing::{debug, info, instrument};

use liftoff_core::error::GitError;

use crate::repository::{GitRepo, Result};
use crate::types::TagInfo;

impl GitRepo {
    /// Get all tags
    #[instrument(skip(self))]
    pub fn tags(&self) -> Result<Vec<TagInfo>> {
        let mut tags = Vec::new();

        self.repo.tag_foreach(|oid, name| {
            let name = String::from_utf8_lossy(name)
                .trim_start_matches("refs/tags/")
                .to_string();

            if let Ok(commit) = self.repo.find_commit(oid) {
                tags.push(TagInfo::new(&name, commit.id().to_string()));
            } else if let Ok(tag) = self.repo.find_tag(oid) {
                // Annotated tag
                let target = tag
                    .target()
                    .and_then(|t| t.peel_to_commit())
                    .map(|c| c.id())
                    .unwrap_or_else(|_| tag.target_id());
                let mut tag_info = TagInfo::new(&name, target.to_string());

                if let Some(msg) = tag.message() {
                    tag_info = tag_info.with_message(msg);
                }

                if let Some(tagger) = tag.tagger() {
                    let timestamp = Utc
                        .timestamp_opt(tagger.when().seconds(), 0)
                        .single()
                        .unwrap_or_else(Utc::now);
                    tag_info = tag_info.with_timestamp(timestamp);
                }

                tags.push(tag_info);
            }

            true
        })?;

        debug!(count = tags.len(), "listed all tags");
        Ok(tags)
    }

    /// Find the highest tag by semantic version
    #[instrument(skip(self))]
    pub fn find_latest_tag(&self) -> Result<Option<TagInfo>> {
        let result = highest_version(self.tags()?);
        debug!(latest = ?result.as_ref().map(|t| &t.name), "found latest tag");
        Ok(result)
    }

    /// Most recent version tag reachable from `rev`.
    ///
    /// Walks history newest first and returns the highest version among the
    /// tags on the first tagged commit.
    #[instrument(skip(self))]
    pub fn latest_tag_reachable_from(&self, rev: &str) -> Result<Option<TagInfo>> {
        let start = match self.resolve_commit(rev) {
            Ok(commit) => commit.id(),
            Err(GitError::UnknownRevision(_)) => return Ok(None),
            Err(e) => return Err(e),
        };

        let mut by_commit: HashMap<Oid, Vec<TagInfo>> = HashMap::new();
        for tag in self.tags()? {
            if let Ok(oid) = Oid::from_str(&tag.commit_hash) {
                by_commit.entry(oid).or_default().push(tag);
            }
        }
        if by_commit.is_empty() {
            return Ok(None);
        }

        let mut revwalk = self.repo.revwalk()?;
        revwalk.set_sorting(Sort::TOPOLOGICAL | Sort::TIME)?;
        revwalk.push(start)?;

        for oid in revwalk {
            if let Some(tags) = by_commit.remove(&oid?) {
                if let Some(tag) = highest_version(tags) {
                    debug!(tag = %tag.name, rev, "found tag in branch");
                    return Ok(Some(tag));
                }
            }
        }

        Ok(None)
    }

    /// Find a specific tag by name
    pub fn find_tag(&self, name: &str) -> Result<Option<TagInfo>> {
        let tag_ref = format!("refs/tags/{}", name);

        match self.repo.find_reference(&tag_ref) {
            Ok(reference) => {
                let target = reference.peel_to_commit()?;
                Ok(Some(TagInfo::new(name, target.id().to_string())))
            }
            Err(e) if e.code() == git2::ErrorCode::NotFound => Ok(None),
            Err(e) => Err(GitError::Git2(e)),
        }
    }

    /// Create an annotated tag on HEAD
    #[instrument(skip(self, message), fields(name))]
    pub fn create_tag(&self, name: &str, message: &str) -> Result<TagInfo> {
        if self.find_tag(name)?.is_some() {
            return Err(GitError::TagExists(name.to_string()));
        }

        let head = self.head_commit()?;
        let sig = self.repo.signature()?;
        self.repo.tag(name, head.as_object(), &sig, message, false)?;

        info!(name, "created tag");
        Ok(TagInfo::new(name, head.id().to_string()).with_message(message))
    }
}

fn highest_version(tags: Vec<TagInfo>) -> Option<TagInfo> {
    tags.into_iter()
        .filter_map(|t| {
            t.version
                .as_deref()
                .and_then(|v| Version::parse(v).ok())
                .map(|v| (v, t))
        })
        .max_by(|a, b| a.0.cmp(&b.0))
        .map(|(_, t)| t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{commit_file, repo_with_commits};

    #[test]
    fn test_list_and_find_tags() {
        let (_temp, repo) = repo_with_commits(&["Initial commit"]);
        repo.create_tag("v1.0.0", "Release 1.0.0").unwrap();

        let tags = repo.tags().unwrap();
        assert_eq!(tags.len(), 1);
        assert_eq!(tags[0].name, "v1.0.0");
        assert_eq!(tags[0].commit_hash, repo.head_sha().unwrap());

        let tag = repo.find_tag("v1.0.0").unwrap().unwrap();
        assert_eq!(tag.version, Some("1.0.0".to_string()));
    }

    #[test]
    fn test_find_latest_tag_by_version() {
        let (temp, repo) = repo_with_commits(&["one"]);
        repo.create_tag("v1.10.0", "later").unwrap();
        commit_file(&temp, &repo, "two.txt", "two");
        repo.create_tag("v1.9.0", "lower but newer").unwrap();

        let tag = repo.find_latest_tag().unwrap().unwrap();
        assert_eq!(tag.name, "v1.10.0");
    }

    #[test]
    fn test_latest_tag_reachable_from() {
        let (temp, repo) = repo_with_commits(&["one"]);
        repo.create_tag("v1.0.0", "first").unwrap();
        commit_file(&temp, &repo, "two.txt", "two");
        repo.create_tag("v1.1.0", "second").unwrap();
        commit_file(&temp, &repo, "three.txt", "three");

        let head_tag = repo.latest_tag_reachable_from("HEAD").unwrap().unwrap();
        assert_eq!(head_tag.name, "v1.1.0");

        let parent_tag = repo.latest_tag_reachable_from("HEAD~2").unwrap().unwrap();
        assert_eq!(parent_tag.name, "v1.0.0");
    }

    #[test]
    fn test_latest_tag_without_tags() {
        let (_temp, repo) = repo_with_commits(&["one"]);
        assert!(repo.latest_tag_reachable_from("HEAD").unwrap().is_none());
    }

    #[test]
    fn test_tag_already_exists() {
        let (_temp, repo) = repo_with_commits(&["one"]);
        repo.create_tag("v1.0.0", "first").unwrap();
        let result = repo.create_tag("v1.0.0", "again");
        assert!(matches!(result, Err(GitError::TagExists(_))));
    }
}
