//! Configuration validation

use serde_json::Value;
use tracing::debug;

use crate::error::{ConfigError, Result};

use super::types::Config;

/// Lifecycle hooks the `exec` plugin can bind commands to
pub const EXEC_HOOK_NAMES: &[&str] = &[
    "before-run",
    "version",
    "publish",
    "after-release",
    "after-shipit",
];

/// Plugins that ship with Liftoff
pub const BUILTIN_PLUGINS: &[&str] = &["git-tag", "conventional-commits", "exec"];

/// Reject configuration shapes that are no longer supported.
///
/// Runs on the raw document, before it is deserialized.
pub fn check_deprecated(value: &Value) -> Result<()> {
    if value.get("labels").is_some_and(Value::is_object) {
        return Err(ConfigError::Deprecated {
            option: "labels".to_string(),
            message: "labels must be a list of label definitions, not a map of release type to name"
                .to_string(),
        }
        .into());
    }

    for key in ["skipReleaseLabels", "skip_release_labels"] {
        if value.get(key).is_some() {
            return Err(ConfigError::Deprecated {
                option: key.to_string(),
                message: "define skip labels in `labels` with release type `skip`".to_string(),
            }
            .into());
        }
    }

    Ok(())
}

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    debug!("validating configuration");
    validate_branches(config)?;
    validate_labels(config)?;
    validate_plugins(config)?;
    validate_exec(config)?;
    validate_git(config)?;
    debug!("configuration validation passed");
    Ok(())
}

fn validate_branches(config: &Config) -> Result<()> {
    if config.base_branch.trim().is_empty() {
        return Err(ConfigError::InvalidValue {
            field: "base_branch".to_string(),
            message: "base branch cannot be empty".to_string(),
        }
        .into());
    }

    if config.is_prerelease_branch(&config.base_branch) {
        return Err(ConfigError::InvalidValue {
            field: "prerelease_branches".to_string(),
            message: format!(
                "'{}' is the base branch and cannot also be a prerelease branch",
                config.base_branch
            ),
        }
        .into());
    }

    Ok(())
}

fn validate_labels(config: &Config) -> Result<()> {
    for label in &config.labels {
        let def: crate::labels::LabelDefinition = label.clone().into();
        if def.name.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "labels".to_string(),
                message: "label name cannot be empty".to_string(),
            }
            .into());
        }
    }
    Ok(())
}

fn validate_plugins(config: &Config) -> Result<()> {
    for plugin in &config.plugins {
        if !BUILTIN_PLUGINS.contains(&plugin.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "plugins".to_string(),
                message: format!(
                    "unknown plugin '{}', expected one of: {}",
                    plugin,
                    BUILTIN_PLUGINS.join(", ")
                ),
            }
            .into());
        }
    }
    Ok(())
}

fn validate_exec(config: &Config) -> Result<()> {
    for (hook, commands) in &config.exec {
        if !EXEC_HOOK_NAMES.contains(&hook.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: format!("exec.{}", hook),
                message: format!("must be one of: {}", EXEC_HOOK_NAMES.join(", ")),
            }
            .into());
        }
        if commands.iter().any(|c| c.command().trim().is_empty()) {
            return Err(ConfigError::InvalidValue {
                field: format!("exec.{}", hook),
                message: "command cannot be empty".to_string(),
            }
            .into());
        }
    }
    Ok(())
}

fn validate_git(config: &Config) -> Result<()> {
    if config.git.remote.is_empty() {
        return Err(ConfigError::InvalidValue {
            field: "git.remote".to_string(),
            message: "remote cannot be empty".to_string(),
        }
        .into());
    }
    Ok(())
}
