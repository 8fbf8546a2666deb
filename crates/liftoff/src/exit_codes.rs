//! Exit codes for the CLI

use liftoff_core::error::{ConfigError, GitError, LiftoffError, ProviderError, VersionError};

/// General error
pub const ERROR: i32 = 1;

/// Configuration error
pub const CONFIG_ERROR: i32 = 2;

/// Git error
pub const GIT_ERROR: i32 = 3;

/// Version error
pub const VERSION_ERROR: i32 = 4;

/// Provider API error
pub const PROVIDER_ERROR: i32 = 5;

/// Publishing failed part way
pub const PUBLISH_ERROR: i32 = 6;

/// Exit code for an error returned by a command
pub fn for_error(err: &anyhow::Error) -> i32 {
    if let Some(err) = err.downcast_ref::<LiftoffError>() {
        return match err {
            LiftoffError::Config(_) => CONFIG_ERROR,
            LiftoffError::Git(_) => GIT_ERROR,
            LiftoffError::Version(_) => VERSION_ERROR,
            LiftoffError::Provider(_) => PROVIDER_ERROR,
            LiftoffError::Publish(_) => PUBLISH_ERROR,
            _ => ERROR,
        };
    }
    if err.is::<ConfigError>() {
        CONFIG_ERROR
    } else if err.is::<GitError>() {
        GIT_ERROR
    } else if err.is::<VersionError>() {
        VERSION_ERROR
    } else if err.is::<ProviderError>() {
        PROVIDER_ERROR
    } else {
        ERROR
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use liftoff_core::error::PublishError;

    #[test]
    fn test_codes_follow_error_kind() {
        let config = anyhow::Error::from(LiftoffError::from(ConfigError::MissingField(
            "GH_TOKEN".to_string(),
        )));
        assert_eq!(for_error(&config), CONFIG_ERROR);

        let bare = anyhow::Error::from(GitError::NoCommits);
        assert_eq!(for_error(&bare), GIT_ERROR);

        let publish = anyhow::Error::from(LiftoffError::from(PublishError::hook(
            "publish",
            "failed",
        )));
        assert_eq!(for_error(&publish), PUBLISH_ERROR);

        assert_eq!(for_error(&anyhow::anyhow!("boom")), ERROR);
    }
}
