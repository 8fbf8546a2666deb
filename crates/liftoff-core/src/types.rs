//! Core types for Liftoff

use serde::{Deserialize, Serialize};

/// Release type a label maps to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReleaseType {
    /// Major version bump (breaking changes)
    Major,
    /// Minor version bump (new features)
    Minor,
    /// Patch version bump (bug fixes)
    Patch,
    /// Suppresses a release for the commit
    Skip,
    /// Marks a commit as release-worthy
    Release,
    /// Shown in the changelog, never bumps
    None,
}

impl ReleaseType {
    /// Returns the string representation of the release type
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Major => "major",
            Self::Minor => "minor",
            Self::Patch => "patch",
            Self::Skip => "skip",
            Self::Release => "release",
            Self::None => "none",
        }
    }

    /// All release types, semver types first
    pub fn all() -> &'static [ReleaseType] {
        &[
            Self::Major,
            Self::Minor,
            Self::Patch,
            Self::Skip,
            Self::Release,
            Self::None,
        ]
    }

    /// Whether this release type maps onto a semver component
    pub fn is_semver(&self) -> bool {
        matches!(self, Self::Major | Self::Minor | Self::Patch)
    }

    /// Ordering key used to arrange changelog sections
    pub fn section_rank(&self) -> u8 {
        match self {
            Self::Major => 0,
            Self::Minor => 1,
            Self::Patch => 2,
            _ => 3,
        }
    }
}

impl std::fmt::Display for ReleaseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ReleaseType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "major" => Ok(Self::Major),
            "minor" => Ok(Self::Minor),
            "patch" => Ok(Self::Patch),
            "skip" => Ok(Self::Skip),
            "release" => Ok(Self::Release),
            "none" => Ok(Self::None),
            _ => Err(format!("Unknown release type: {}", s)),
        }
    }
}

/// Aggregate bump computed for a set of commits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SemverBump {
    /// Major version bump
    Major,
    /// Minor version bump
    Minor,
    /// Patch version bump
    Patch,
    /// Nothing that maps onto a version bump
    #[serde(rename = "")]
    NoVersion,
    /// Every contributing commit was suppressed by a skip label
    Skipped,
}

impl SemverBump {
    /// Returns the string representation of the bump
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Major => "major",
            Self::Minor => "minor",
            Self::Patch => "patch",
            Self::NoVersion => "",
            Self::Skipped => "skipped",
        }
    }

    /// Whether this bump produces a release
    pub fn is_releasable(&self) -> bool {
        matches!(self, Self::Major | Self::Minor | Self::Patch)
    }

    /// Return the higher of two bumps; non-releasable values lose to any release
    pub fn max(self, other: Self) -> Self {
        if self.rank() >= other.rank() {
            self
        } else {
            other
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Self::Major => 4,
            Self::Minor => 3,
            Self::Patch => 2,
            Self::Skipped => 1,
            Self::NoVersion => 0,
        }
    }
}

impl std::fmt::Display for SemverBump {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for SemverBump {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "major" => Ok(Self::Major),
            "minor" => Ok(Self::Minor),
            "patch" => Ok(Self::Patch),
            "" | "none" | "noversion" => Ok(Self::NoVersion),
            "skipped" => Ok(Self::Skipped),
            _ => Err(format!("Unknown semver bump: {}", s)),
        }
    }
}
