//! Label taxonomy: default labels, user label merging and the version-label map

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::types::ReleaseType;

/// A fully resolved label definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelDefinition {
    /// Label name as it appears on the platform
    pub name: String,
    /// Heading used for this label in the changelog
    #[serde(default, alias = "changelog_title", skip_serializing_if = "Option::is_none")]
    pub changelog_title: Option<String>,
    /// Description shown on the platform
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Hex color without the leading `#`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Release type the label maps to
    #[serde(default, alias = "release_type", skip_serializing_if = "Option::is_none")]
    pub release_type: Option<ReleaseType>,
    /// Replace every default label of the same release type
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub overwrite: bool,
}

impl LabelDefinition {
    /// Create a label with only a name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            changelog_title: None,
            description: None,
            color: None,
            release_type: None,
            overwrite: false,
        }
    }

    /// Set the release type
    pub fn with_release_type(mut self, release_type: ReleaseType) -> Self {
        self.release_type = Some(release_type);
        self
    }

    /// Set the changelog title
    pub fn with_changelog_title(mut self, title: impl Into<String>) -> Self {
        self.changelog_title = Some(title.into());
        self
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the color
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    /// Mark the label as overwriting defaults of its release type
    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// Fill fields missing here from `base`
    fn inherit(mut self, base: &LabelDefinition) -> Self {
        if self.changelog_title.is_none() {
            self.changelog_title = base.changelog_title.clone();
        }
        if self.description.is_none() {
            self.description = base.description.clone();
        }
        if self.color.is_none() {
            self.color = base.color.clone();
        }
        if self.release_type.is_none() {
            self.release_type = base.release_type;
        }
        self
    }
}

/// A label entry as written in configuration: a bare name or a full object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LabelConfig {
    /// Just the label name
    Name(String),
    /// Full definition
    Definition(LabelDefinition),
}

impl From<LabelConfig> for LabelDefinition {
    fn from(config: LabelConfig) -> Self {
        match config {
            LabelConfig::Name(name) => LabelDefinition::new(name),
            LabelConfig::Definition(def) => def,
        }
    }
}

impl From<LabelDefinition> for LabelConfig {
    fn from(def: LabelDefinition) -> Self {
        LabelConfig::Definition(def)
    }
}

/// The built-in label set
pub fn default_labels() -> Vec<LabelDefinition> {
    vec![
        LabelDefinition::new("major")
            .with_release_type(ReleaseType::Major)
            .with_changelog_title("💥  Breaking Change")
            .with_description("Increment the major version when merged")
            .with_color("C5000B"),
        LabelDefinition::new("minor")
            .with_release_type(ReleaseType::Minor)
            .with_changelog_title("🚀  Enhancement")
            .with_description("Increment the minor version when merged")
            .with_color("F1A60E"),
        LabelDefinition::new("patch")
            .with_release_type(ReleaseType::Patch)
            .with_changelog_title("🐛  Bug Fix")
            .with_description("Increment the patch version when merged")
            .with_color("870048"),
        LabelDefinition::new("skip-release")
            .with_release_type(ReleaseType::Skip)
            .with_description("Preserve the current version when merged")
            .with_color("bf5416"),
        LabelDefinition::new("release")
            .with_release_type(ReleaseType::Release)
            .with_description("Create a release when this pr is merged")
            .with_color("007f70"),
        LabelDefinition::new("internal")
            .with_release_type(ReleaseType::None)
            .with_changelog_title("🏠  Internal")
            .with_description("Changes only affect the internal API")
            .with_color("696969"),
        LabelDefinition::new("documentation")
            .with_release_type(ReleaseType::None)
            .with_changelog_title("📝  Documentation")
            .with_description("Changes only affect the documentation")
            .with_color("cfd3d7"),
    ]
}

/// Complete a user label from the first default sharing its release type or name
pub fn normalize_label(label: LabelDefinition, defaults: &[LabelDefinition]) -> LabelDefinition {
    let base = defaults.iter().find(|d| {
        (label.release_type.is_some() && d.release_type == label.release_type) || d.name == label.name
    });
    match base {
        Some(base) => label.inherit(base),
        None => label,
    }
}

/// Merge user labels with the defaults into the effective label list.
///
/// Defaults whose release type is claimed by an `overwrite` user label are
/// dropped. User labels win over defaults with the same name, and later user
/// entries win over earlier ones. Applying this to its own output is a no-op.
pub fn normalize_labels(user: Vec<LabelConfig>) -> Vec<LabelDefinition> {
    let defaults = default_labels();
    let user: Vec<LabelDefinition> = user
        .into_iter()
        .map(|label| normalize_label(label.into(), &defaults))
        .collect();

    let overwritten: Vec<ReleaseType> = user
        .iter()
        .filter(|l| l.overwrite)
        .filter_map(|l| l.release_type)
        .collect();

    let mut merged: Vec<LabelDefinition> = defaults
        .into_iter()
        .filter(|d| !d.release_type.is_some_and(|t| overwritten.contains(&t)))
        .collect();

    for label in user {
        match merged.iter_mut().find(|l| l.name == label.name) {
            Some(existing) => *existing = label,
            None => merged.push(label),
        }
    }

    debug!(label_count = merged.len(), "normalized labels");
    merged
}

/// Release type to label names, built once per configuration load
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionLabels {
    map: HashMap<ReleaseType, Vec<String>>,
}

impl VersionLabels {
    /// Build the map from resolved label definitions
    pub fn from_labels(labels: &[LabelDefinition]) -> Self {
        let mut map: HashMap<ReleaseType, Vec<String>> = HashMap::new();
        for label in labels {
            if let Some(release_type) = label.release_type {
                let names = map.entry(release_type).or_default();
                if !names.contains(&label.name) {
                    names.push(label.name.clone());
                }
            }
        }
        Self { map }
    }

    /// Label names for a release type
    pub fn get(&self, release_type: ReleaseType) -> &[String] {
        self.map
            .get(&release_type)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Release type a label name maps to
    pub fn release_type_of(&self, label: &str) -> Option<ReleaseType> {
        ReleaseType::all()
            .iter()
            .copied()
            .find(|t| self.get(*t).iter().any(|name| name == label))
    }

    /// Whether a label belongs to the given release type
    pub fn is(&self, label: &str, release_type: ReleaseType) -> bool {
        self.get(release_type).iter().any(|name| name == label)
    }
}

/// Resolved labels plus the derived version map
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelTaxonomy {
    labels: Vec<LabelDefinition>,
    version_labels: VersionLabels,
}

impl LabelTaxonomy {
    /// Resolve user labels against the defaults
    pub fn new(user: Vec<LabelConfig>) -> Self {
        Self::from_resolved(normalize_labels(user))
    }

    /// Build from an already resolved label list
    pub fn from_resolved(labels: Vec<LabelDefinition>) -> Self {
        let version_labels = VersionLabels::from_labels(&labels);
        Self {
            labels,
            version_labels,
        }
    }

    /// Effective label definitions
    pub fn labels(&self) -> &[LabelDefinition] {
        &self.labels
    }

    /// The version-label map
    pub fn version_labels(&self) -> &VersionLabels {
        &self.version_labels
    }

    /// Look up a definition by name
    pub fn get(&self, name: &str) -> Option<&LabelDefinition> {
        self.labels.iter().find(|l| l.name == name)
    }
}

impl Default for LabelTaxonomy {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_no_user_labels() {
        let labels = normalize_labels(Vec::new());
        assert_eq!(labels, default_labels());
    }

    #[test]
    fn test_user_label_inherits_from_default() {
        let labels = normalize_labels(vec![LabelConfig::Definition(
            LabelDefinition::new("feature").with_release_type(ReleaseType::Minor),
        )]);
        let feature = labels.iter().find(|l| l.name == "feature").unwrap();
        assert_eq!(feature.changelog_title.as_deref(), Some("🚀  Enhancement"));
        assert!(labels.iter().any(|l| l.name == "minor"));
    }

    #[test]
    fn test_overwrite_drops_defaults_of_same_type() {
        let labels = normalize_labels(vec![LabelConfig::Definition(
            LabelDefinition::new("feature")
                .with_release_type(ReleaseType::Minor)
                .with_overwrite(true),
        )]);
        assert!(!labels.iter().any(|l| l.name == "minor"));
        let vl = VersionLabels::from_labels(&labels);
        assert_eq!(vl.get(ReleaseType::Minor), ["feature".to_string()]);
    }

    #[test]
    fn test_same_name_user_label_wins() {
        let labels = normalize_labels(vec![LabelConfig::Definition(
            LabelDefinition::new("patch").with_description("Fixes"),
        )]);
        let patches: Vec<_> = labels.iter().filter(|l| l.name == "patch").collect();
        assert_eq!(patches.len(), 1);
        assert_eq!(patches[0].description.as_deref(), Some("Fixes"));
        assert_eq!(patches[0].release_type, Some(ReleaseType::Patch));
    }

    #[test]
    fn test_bare_name_label_config() {
        let parsed: Vec<LabelConfig> = serde_json::from_str(r#"["triage"]"#).unwrap();
        let labels = normalize_labels(parsed);
        let triage = labels.iter().find(|l| l.name == "triage").unwrap();
        assert_eq!(triage.release_type, None);
    }

    #[test]
    fn test_normalize_labels_is_idempotent() {
        let user = vec![
            LabelConfig::Definition(
                LabelDefinition::new("breaking")
                    .with_release_type(ReleaseType::Major)
                    .with_overwrite(true),
            ),
            LabelConfig::Name("triage".to_string()),
        ];
        let once = normalize_labels(user);
        let twice = normalize_labels(once.iter().cloned().map(LabelConfig::from).collect());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_release_type_of() {
        let taxonomy = LabelTaxonomy::default();
        let vl = taxonomy.version_labels();
        assert_eq!(vl.release_type_of("major"), Some(ReleaseType::Major));
        assert_eq!(vl.release_type_of("skip-release"), Some(ReleaseType::Skip));
        assert_eq!(vl.release_type_of("documentation"), Some(ReleaseType::None));
        assert_eq!(vl.release_type_of("unknown"), None);
        assert_eq!(
            vl.get(ReleaseType::None),
            ["internal".to_string(), "documentation".to_string()]
        );
    }
}
