//! Changelog file output

use std::path::Path;

use tracing::{debug, info, instrument};

use liftoff_core::error::{ChangelogError, Result};

/// Separator placed between a new entry and the previous file content
const ENTRY_SEPARATOR: &str = "\n\n---\n\n";

/// Format a changelog entry: `# <title> (<date>)` followed by the notes
pub fn format_entry(title: &str, date: &str, notes: &str) -> String {
    format!("# {} ({})\n\n{}", title, date, notes)
}

/// Prepend an entry to the changelog file, creating it when missing.
///
/// Existing content is kept below the new entry.
#[instrument(skip(notes), fields(path = %path.display()))]
pub async fn prepend_changelog(path: &Path, title: &str, date: &str, notes: &str) -> Result<()> {
    let entry = format_entry(title, date, notes);

    let content = match tokio::fs::read_to_string(path).await {
        Ok(existing) if !existing.trim().is_empty() => {
            debug!(existing_len = existing.len(), "prepending to existing changelog");
            format!("{}{}{}", entry, ENTRY_SEPARATOR, existing)
        }
        Ok(_) => entry,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("no existing changelog found");
            entry
        }
        Err(e) => {
            return Err(ChangelogError::WriteFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }
            .into())
        }
    };

    tokio::fs::write(path, content)
        .await
        .map_err(|e| ChangelogError::WriteFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    info!(title, "wrote changelog entry");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_creates_missing_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("CHANGELOG.md");

        prepend_changelog(&path, "v1.0.0", "Mon Mar 04 2024", "#### 🐛  Bug Fix\n\n- Fix")
            .await
            .unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "# v1.0.0 (Mon Mar 04 2024)\n\n#### 🐛  Bug Fix\n\n- Fix");
    }

    #[tokio::test]
    async fn test_prepends_and_keeps_old_content() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("CHANGELOG.md");
        std::fs::write(&path, "# v1.0.0 (old)\n\n- First").unwrap();

        prepend_changelog(&path, "v1.1.0", "today", "- Second")
            .await
            .unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            content,
            "# v1.1.0 (today)\n\n- Second\n\n---\n\n# v1.0.0 (old)\n\n- First"
        );
    }

    #[tokio::test]
    async fn test_write_failure_is_changelog_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("missing-dir").join("CHANGELOG.md");

        let result = prepend_changelog(&path, "v1.0.0", "today", "- x").await;
        assert!(matches!(
            result,
            Err(liftoff_core::LiftoffError::Changelog(
                ChangelogError::WriteFailed { .. }
            ))
        ));
    }
}
