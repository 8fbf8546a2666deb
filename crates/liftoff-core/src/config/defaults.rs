//! Default configuration values

/// Default branch for full releases
pub const DEFAULT_BASE_BRANCH: &str = "main";

/// Default prerelease branch
pub const DEFAULT_PRERELEASE_BRANCH: &str = "next";

/// Default changelog file
pub const DEFAULT_CHANGELOG_FILE: &str = "CHANGELOG.md";

/// Default git remote
pub const DEFAULT_REMOTE: &str = "origin";

/// Default GitHub REST endpoint
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Default context for pull request statuses
pub const DEFAULT_STATUS_CONTEXT: &str = "ci/pr-check";

/// Nesting limit for `extends` chains
pub const MAX_EXTENDS_DEPTH: usize = 5;

/// Get list of config file names to search for
pub fn config_file_names() -> Vec<&'static str> {
    vec![
        ".liftoffrc",
        ".liftoffrc.json",
        ".liftoffrc.yaml",
        ".liftoffrc.yml",
        "liftoff.toml",
        "liftoff.yaml",
    ]
}
