//! Version arithmetic for releases, prereleases and canaries

use semver::{BuildMetadata, Prerelease, Version};

use crate::error::{Result, VersionError};
use crate::types::SemverBump;

/// Parse a version, tolerating a leading `v`
pub fn parse_version(version: &str) -> Result<Version> {
    let trimmed = version.trim();
    let bare = trimmed.strip_prefix('v').unwrap_or(trimmed);
    Version::parse(bare)
        .map_err(|e| VersionError::ParseFailed(version.to_string(), e.to_string()).into())
}

/// Add the `v` prefix unless disabled or already present
pub fn prefix_release(version: &str, no_version_prefix: bool) -> String {
    if no_version_prefix || version.starts_with('v') {
        version.to_string()
    } else {
        format!("v{}", version)
    }
}

/// Increment a version by a releasable bump
pub fn increment(version: &Version, bump: SemverBump) -> Result<Version> {
    let mut next = Version::new(version.major, version.minor, version.patch);
    match bump {
        SemverBump::Major => {
            next.major += 1;
            next.minor = 0;
            next.patch = 0;
        }
        SemverBump::Minor => {
            next.minor += 1;
            next.patch = 0;
        }
        SemverBump::Patch => {
            if version.pre.is_empty() {
                next.patch += 1;
            }
        }
        other => return Err(VersionError::NotReleasable(other.to_string()).into()),
    }
    Ok(next)
}

/// Increment a version string, keeping its `v` prefix if it had one
pub fn increment_str(version: &str, bump: SemverBump) -> Result<String> {
    let next = increment(&parse_version(version)?, bump)?;
    Ok(if version.trim().starts_with('v') {
        format!("v{}", next)
    } else {
        next.to_string()
    })
}

fn prerelease_counter(version: &Version, preid: &str) -> Option<u64> {
    let pre = version.pre.as_str();
    let rest = pre.strip_prefix(preid)?.strip_prefix('.')?;
    rest.parse().ok()
}

fn with_prerelease(base: &Version, preid: &str, counter: u64) -> Result<Version> {
    let mut next = Version::new(base.major, base.minor, base.patch);
    next.pre = Prerelease::new(&format!("{}.{}", preid, counter))
        .map_err(|e| VersionError::ParseFailed(preid.to_string(), e.to_string()))?;
    next.build = BuildMetadata::EMPTY;
    Ok(next)
}

/// Next prerelease version on a prerelease branch.
///
/// Starts at `<last_release + bump>-<preid>.0`; if the branch already has a
/// prerelease tag at or beyond that, increments its counter instead.
pub fn next_prerelease(
    last_release: &str,
    latest_in_branch: Option<&str>,
    bump: SemverBump,
    preid: &str,
) -> Result<Version> {
    let last = parse_version(last_release)?;
    let candidate = with_prerelease(&increment(&last, bump)?, preid, 0)?;

    let current = match latest_in_branch.map(parse_version).transpose()? {
        Some(current) if current >= candidate => current,
        _ => return Ok(candidate),
    };

    match prerelease_counter(&current, preid) {
        Some(counter) => with_prerelease(&current, preid, counter + 1),
        None if current.pre.is_empty() => with_prerelease(&increment(&current, SemverBump::Patch)?, preid, 0),
        None => with_prerelease(&current, preid, 0),
    }
}

/// Canary version: the next version with a `canary` prerelease and the given suffix
pub fn canary_version(last_release: &str, bump: SemverBump, suffix: &str) -> Result<String> {
    let next = increment(&parse_version(last_release)?, bump)?;
    Ok(format!("{}-canary{}", next, suffix))
}
