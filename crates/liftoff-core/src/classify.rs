//! Release classification: label sets to an aggregate semver bump

use tracing::debug;

use crate::labels::VersionLabels;
use crate::types::{ReleaseType, SemverBump};

/// Options that change how labels are classified
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BumpOptions {
    /// Only release when some commit carries a `release` label
    pub only_publish_with_release_label: bool,
}

/// Compute the bump for the label sets of a range of commits.
///
/// Precedence is by release type (`major > minor > patch`), never by count.
/// A commit with a skip label contributes nothing unless it also carries a
/// release label.
pub fn calculate_semver_bump<L, S>(
    label_sets: &[L],
    version_labels: &VersionLabels,
    options: BumpOptions,
) -> SemverBump
where
    L: AsRef<[S]>,
    S: AsRef<str>,
{
    if label_sets.is_empty() {
        return SemverBump::NoVersion;
    }

    let types_of = |labels: &[S]| -> Vec<ReleaseType> {
        let mut types: Vec<ReleaseType> = labels
            .iter()
            .filter_map(|label| version_labels.release_type_of(label.as_ref()))
            .collect();
        types.dedup();
        types
    };

    let commit_types: Vec<Vec<ReleaseType>> =
        label_sets.iter().map(|set| types_of(set.as_ref())).collect();

    let has_release_label = commit_types
        .iter()
        .any(|types| types.contains(&ReleaseType::Release));

    if options.only_publish_with_release_label && !has_release_label {
        debug!("no release label found, skipping release");
        return SemverBump::NoVersion;
    }

    let mut bump = SemverBump::NoVersion;
    let mut skipped = false;

    for types in &commit_types {
        if types.contains(&ReleaseType::Skip) && !types.contains(&ReleaseType::Release) {
            skipped = true;
            continue;
        }

        for release_type in types {
            let candidate = match release_type {
                ReleaseType::Major => SemverBump::Major,
                ReleaseType::Minor => SemverBump::Minor,
                ReleaseType::Patch => SemverBump::Patch,
                _ => continue,
            };
            bump = bump.max(candidate);
        }
    }

    if bump.is_releasable() {
        return bump;
    }

    if has_release_label {
        SemverBump::Patch
    } else if skipped {
        SemverBump::Skipped
    } else {
        SemverBump::NoVersion
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::labels::LabelTaxonomy;

    fn bump(sets: &[&[&str]], only_release: bool) -> SemverBump {
        let taxonomy = LabelTaxonomy::default();
        calculate_semver_bump(
            sets,
            taxonomy.version_labels(),
            BumpOptions {
                only_publish_with_release_label: only_release,
            },
        )
    }

    #[test]
    fn test_empty_is_no_version() {
        assert_eq!(bump(&[], false), SemverBump::NoVersion);
    }

    #[test]
    fn test_major_wins_over_patch() {
        assert_eq!(bump(&[&["major"], &["patch"]], false), SemverBump::Major);
        assert_eq!(bump(&[&["patch"], &["minor"]], false), SemverBump::Minor);
    }

    #[test]
    fn test_precedence_ignores_counts() {
        assert_eq!(
            bump(&[&["patch"], &["patch"], &["patch"], &["minor"]], false),
            SemverBump::Minor
        );
    }

    #[test]
    fn test_none_and_unknown_labels_do_not_release() {
        assert_eq!(
            bump(&[&["documentation"], &["internal", "wontfix"], &[]], false),
            SemverBump::NoVersion
        );
    }

    #[test]
    fn test_skip_labels_suppress_release() {
        assert_eq!(bump(&[&["skip-release"]], false), SemverBump::Skipped);
        assert_eq!(
            bump(&[&["skip-release", "major"], &["skip-release"]], false),
            SemverBump::Skipped
        );
        assert_eq!(
            bump(&[&["skip-release", "major"], &["patch"]], false),
            SemverBump::Patch
        );
    }

    #[test]
    fn test_release_label_overrides_skip() {
        assert_eq!(
            bump(&[&["skip-release", "release", "minor"]], false),
            SemverBump::Minor
        );
    }

    #[test]
    fn test_only_publish_with_release_label() {
        assert_eq!(bump(&[&["major"]], true), SemverBump::NoVersion);
        assert_eq!(bump(&[&["major"], &["release"]], true), SemverBump::Major);
    }

    #[test]
    fn test_release_label_alone_is_patch() {
        assert_eq!(bump(&[&["release"]], false), SemverBump::Patch);
    }

    #[test]
    fn test_same_type_labels_count_once() {
        let taxonomy = LabelTaxonomy::new(vec![crate::labels::LabelConfig::Definition(
            crate::labels::LabelDefinition::new("feature").with_release_type(ReleaseType::Minor),
        )]);
        let result = calculate_semver_bump(
            &[vec!["feature", "minor"]],
            taxonomy.version_labels(),
            BumpOptions::default(),
        );
        assert_eq!(result, SemverBump::Minor);
    }
}
