//! Repository coordinates from git remote URLs

use url::Url;

/// Extract `(owner, repo)` from a GitHub remote URL.
///
/// Accepts `git@host:owner/repo.git`, `ssh://git@host/owner/repo.git` and
/// `https://host/owner/repo(.git)`.
pub fn parse_remote(remote: &str) -> Option<(String, String)> {
    let remote = remote.trim();

    let path = if let Some(rest) = remote.strip_prefix("git@") {
        rest.split_once(':')?.1.to_string()
    } else {
        Url::parse(remote).ok()?.path().to_string()
    };

    let mut parts = path
        .trim_matches('/')
        .trim_end_matches(".git")
        .split('/')
        .filter(|p| !p.is_empty());
    let owner = parts.next()?;
    let repo = parts.next()?;
    if parts.next().is_some() {
        return None;
    }

    Some((owner.to_string(), repo.to_string()))
}
