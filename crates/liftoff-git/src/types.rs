//! Git types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A tag and the commit it points at
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagInfo {
    /// Tag name
    pub name: String,
    /// Commit hash the tag points to
    pub commit_hash: String,
    /// Tag message (annotated tags only)
    pub message: Option<String>,
    /// When the tag was created (annotated tags only)
    pub timestamp: Option<DateTime<Utc>>,
    /// Semantic version encoded in the name, without the `v` prefix
    pub version: Option<String>,
}

impl TagInfo {
    /// Create a new TagInfo
    pub fn new(name: impl Into<String>, commit_hash: impl Into<String>) -> Self {
        let name = name.into();
        let version = version_from_tag(&name);

        Self {
            name,
            commit_hash: commit_hash.into(),
            message: None,
            timestamp: None,
            version,
        }
    }

    /// Set the tag message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into().trim().to_string());
        self
    }

    /// Set the timestamp
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Whether the tag names a prerelease version
    pub fn is_prerelease(&self) -> bool {
        self.version
            .as_deref()
            .and_then(|v| semver::Version::parse(v).ok())
            .is_some_and(|v| !v.pre.is_empty())
    }
}

/// Version encoded in a release tag (`v1.2.3`, `1.2.3`, `v1.3.0-next.1`)
fn version_from_tag(tag: &str) -> Option<String> {
    let bare = tag.strip_prefix('v').unwrap_or(tag);
    semver::Version::parse(bare).ok().map(|_| bare.to_string())
}
