//! Error types for Liftoff

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using LiftoffError
pub type Result<T> = std::result::Result<T, LiftoffError>;

/// Main error type for Liftoff operations
#[derive(Debug, Error)]
pub enum LiftoffError {
    /// Configuration-related errors (always fatal)
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Code-hosting platform errors
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// Failures on the write path (publish, status, comment, tag)
    #[error(transparent)]
    Publish(#[from] PublishError),

    /// An operation was invoked before its prerequisites were met
    #[error(transparent)]
    Precondition(#[from] PreconditionError),

    /// Git-related errors
    #[error(transparent)]
    Git(#[from] GitError),

    /// Version-related errors
    #[error(transparent)]
    Version(#[from] VersionError),

    /// Changelog-related errors
    #[error(transparent)]
    Changelog(#[from] ChangelogError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration file not found
    #[error("Configuration file not found at {0}")]
    NotFound(PathBuf),

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Invalid configuration value
    #[error("Invalid configuration: {field} - {message}")]
    InvalidValue { field: String, message: String },

    /// A configuration shape that is no longer supported
    #[error("Deprecated configuration option '{option}': {message}")]
    Deprecated { option: String, message: String },

    /// Missing required field or environment value
    #[error("Missing required configuration: {0}")]
    MissingField(String),

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// IO error
    #[error("IO error reading config: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors returned by the code-hosting platform client
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The platform answered with a non-success status
    #[error("{operation} failed with status {status}: {message}")]
    Status {
        operation: String,
        status: u16,
        message: String,
    },

    /// The request never produced a response
    #[error("{operation} request failed: {message}")]
    Request { operation: String, message: String },

    /// The response body did not have the expected shape
    #[error("{operation} returned an unexpected response: {message}")]
    Decode { operation: String, message: String },

    /// A requested entity does not exist
    #[error("{operation}: {entity} not found")]
    NotFound { operation: String, entity: String },
}

impl ProviderError {
    /// Name of the provider operation that failed
    pub fn operation(&self) -> &str {
        match self {
            Self::Status { operation, .. }
            | Self::Request { operation, .. }
            | Self::Decode { operation, .. }
            | Self::NotFound { operation, .. } => operation,
        }
    }

    /// HTTP status code, when the platform answered
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::NotFound { .. } => Some(404),
            _ => None,
        }
    }
}

/// Failures while publishing a release or reporting on a pull request
#[derive(Debug, Error)]
pub enum PublishError {
    /// A provider write failed
    #[error("Failed to {stage} for {target}: {source}")]
    Provider {
        stage: String,
        target: String,
        #[source]
        source: ProviderError,
    },

    /// A lifecycle hook reported a failure
    #[error("Hook '{hook}' failed: {message}")]
    Hook { hook: String, message: String },

    /// Tagging or pushing failed
    #[error("Failed to {stage} {target}: {message}")]
    Git {
        stage: String,
        target: String,
        message: String,
    },
}

impl PublishError {
    /// Wrap a provider error with the release stage it happened in
    pub fn provider(
        stage: impl Into<String>,
        target: impl Into<String>,
        source: ProviderError,
    ) -> Self {
        Self::Provider {
            stage: stage.into(),
            target: target.into(),
            source,
        }
    }

    /// Report a failed hook tap
    pub fn hook(hook: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Hook {
            hook: hook.into(),
            message: message.into(),
        }
    }
}

/// Conditions an operation requires before it can run
#[derive(Debug, Error)]
pub enum PreconditionError {
    /// Configuration and clients have not been loaded
    #[error("Liftoff is not initialized: call load before {0}")]
    NotLoaded(String),

    /// Repository owner/name could not be determined
    #[error("Could not determine repository: {0}")]
    UnknownRepository(String),

    /// A pull request is required but none was given or detected
    #[error("No pull request number available for {0}")]
    MissingPullRequest(String),
}

/// Git-related errors
#[derive(Debug, Error)]
pub enum GitError {
    /// Not a git repository
    #[error("Not a git repository: {0}")]
    NotARepository(PathBuf),

    /// Failed to open repository
    #[error("Failed to open repository: {0}")]
    OpenFailed(String),

    /// No commits found
    #[error("No commits found in repository")]
    NoCommits,

    /// Revision could not be resolved
    #[error("Unknown revision: {0}")]
    UnknownRevision(String),

    /// Tag already exists
    #[error("Tag already exists: {0}")]
    TagExists(String),

    /// Failed to push
    #[error("Failed to push to remote: {0}")]
    PushFailed(String),

    /// Remote not found
    #[error("Remote not found: {0}")]
    RemoteNotFound(String),

    /// Git2 library error
    #[error("Git error: {0}")]
    Git2(#[from] git2::Error),
}

/// Version-related errors
#[derive(Debug, Error)]
pub enum VersionError {
    /// Failed to parse version
    #[error("Failed to parse version '{0}': {1}")]
    ParseFailed(String, String),

    /// The bump does not produce a new version
    #[error("Cannot increment a version with bump '{0}'")]
    NotReleasable(String),
}

/// Changelog-related errors
#[derive(Debug, Error)]
pub enum ChangelogError {
    /// Failed to write changelog
    #[error("Failed to write changelog {path}: {message}")]
    WriteFailed { path: PathBuf, message: String },
}
