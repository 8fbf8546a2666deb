//! Configuration loading

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::{ConfigError, Result};

use super::defaults::{config_file_names, MAX_EXTENDS_DEPTH};
use super::types::Config;
use super::validation::{check_deprecated, validate_config};

/// Load configuration from a file
pub fn load_config(path: &Path) -> Result<Config> {
    info!(path = %path.display(), "loading config");

    let value = read_config_value(path, 0)?;
    check_deprecated(&value)?;

    let config: Config =
        serde_json::from_value(value).map_err(|e| ConfigError::ParseError(e.to_string()))?;

    validate_config(&config)?;
    debug!(path = %path.display(), "config loaded and validated");
    Ok(config)
}

/// Parse a file into a generic value and resolve its `extends` chain
fn read_config_value(path: &Path, depth: usize) -> Result<Value> {
    if depth > MAX_EXTENDS_DEPTH {
        return Err(ConfigError::InvalidValue {
            field: "extends".to_string(),
            message: format!("more than {} nested extends", MAX_EXTENDS_DEPTH),
        }
        .into());
    }

    let content = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
    let value = parse_config_str(path, &content)?;

    let Some(extends) = value.get("extends").and_then(Value::as_str) else {
        return Ok(value);
    };

    let base_path = resolve_extends(path, extends)?;
    debug!(path = %path.display(), extends = %base_path.display(), "extending config");
    let mut merged = read_config_value(&base_path, depth + 1)?;
    merge_values(&mut merged, value);
    if let Value::Object(map) = &mut merged {
        map.remove("extends");
    }
    Ok(merged)
}

/// Parse configuration text according to the file extension
fn parse_config_str(path: &Path, content: &str) -> Result<Value> {
    let value = match path.extension().and_then(|e| e.to_str()) {
        Some("toml") => toml::from_str::<Value>(content).map_err(ConfigError::TomlError)?,
        Some("json") => {
            serde_json::from_str::<Value>(content).map_err(|e| ConfigError::ParseError(e.to_string()))?
        }
        // YAML is a superset of JSON, so extensionless rc files accept either
        _ => serde_yaml::from_str::<Value>(content).map_err(ConfigError::YamlError)?,
    };

    match value {
        Value::Object(_) => Ok(value),
        Value::Null => Ok(Value::Object(Default::default())),
        _ => Err(ConfigError::ParseError(format!(
            "{} must contain a mapping at the top level",
            path.display()
        ))
        .into()),
    }
}

fn resolve_extends(path: &Path, extends: &str) -> Result<PathBuf> {
    let is_local = extends.starts_with("./")
        || extends.starts_with("../")
        || Path::new(extends).is_absolute();
    if !is_local {
        return Err(ConfigError::InvalidValue {
            field: "extends".to_string(),
            message: format!("'{}' is not a local file path", extends),
        }
        .into());
    }

    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let base = dir.join(extends);
    if !base.exists() {
        return Err(ConfigError::NotFound(base).into());
    }
    Ok(base)
}

/// Deep-merge `overlay` into `base`; objects merge, everything else is replaced
fn merge_values(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base), Value::Object(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

/// Find configuration file in directory or parent directories.
///
/// At each directory level the search checks:
///   1. `<dir>/<name>`          (e.g. `.liftoffrc`)
///   2. `<dir>/.github/<name>`  (e.g. `.github/liftoff.toml`)
///
/// The first match wins. Parents are walked until the filesystem root.
pub fn find_config(start_dir: &Path) -> Option<PathBuf> {
    debug!(start_dir = %start_dir.display(), "searching for config file");
    let mut current = start_dir.to_path_buf();

    loop {
        for name in config_file_names() {
            let config_path = current.join(name);
            if config_path.is_file() {
                info!(path = %config_path.display(), "found config file");
                return Some(config_path);
            }

            let github_path = current.join(".github").join(name);
            if github_path.is_file() {
                info!(path = %github_path.display(), "found config file in .github/");
                return Some(github_path);
            }
        }

        if !current.pop() {
            break;
        }
    }

    debug!("no config file found");
    None
}

/// Load configuration from directory (searching parent directories)
pub fn load_config_from_dir(dir: &Path) -> Result<(Config, PathBuf)> {
    let config_path = find_config(dir).ok_or_else(|| ConfigError::NotFound(dir.to_path_buf()))?;

    let config = load_config(&config_path)?;
    Ok((config, config_path))
}

/// Load configuration, using defaults only when no file exists.
///
/// A file that exists but fails to load is an error, never silently replaced.
pub fn load_config_or_default(dir: &Path) -> Result<(Config, Option<PathBuf>)> {
    match find_config(dir) {
        Some(path) => Ok((load_config(&path)?, Some(path))),
        None => {
            warn!(dir = %dir.display(), "no config found, using defaults");
            Ok((Config::default(), None))
        }
    }
}
