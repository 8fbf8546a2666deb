//! Changelog extension points

use liftoff_core::commit::{Commit, CommitAuthor};
use liftoff_core::hooks::{BailHook, WaterfallHook};
use liftoff_core::labels::LabelDefinition;

/// Authors whose pull requests never contribute release notes by default
const RENOVATE_AUTHORS: [&str; 2] = ["renovate-pro[bot]", "renovate-bot"];

/// Extra body sections together with the commits being rendered
#[derive(Debug, Clone, Default)]
pub struct BodyContext {
    /// Sections placed above the release notes, in order
    pub sections: Vec<String>,
    /// Every commit in the changelog
    pub commits: Vec<Commit>,
}

/// Hooks consulted while rendering a changelog.
///
/// Bail hooks fall back to the built-in rendering when no tap answers.
#[derive(Debug, Clone)]
pub struct ChangelogHooks {
    /// Rewrite a rendered commit line
    pub render_changelog_line: WaterfallHook<(Commit, String)>,
    /// Render a section heading for a label and its changelog title
    pub render_changelog_title: BailHook<(LabelDefinition, String), String>,
    /// Render the link for an author, used in lines and the authors section
    pub render_changelog_author: BailHook<(CommitAuthor, Commit), String>,
    /// Render an entry of the authors section from an author and its link
    pub render_changelog_author_line: BailHook<(CommitAuthor, String), String>,
    /// Add sections above the release notes
    pub add_to_body: WaterfallHook<BodyContext>,
    /// Return `Some(true)` to keep a commit's PR out of the release notes
    pub omit_release_notes: BailHook<Commit, bool>,
}

impl ChangelogHooks {
    /// Create the hooks with the default release-notes omission rule tapped
    pub fn new() -> Self {
        let mut omit_release_notes = BailHook::new("omitReleaseNotes");
        omit_release_notes.tap("Renovate", |commit: Commit| {
            is_renovate_commit(&commit).then_some(true)
        });

        Self {
            render_changelog_line: WaterfallHook::new("renderChangelogLine"),
            render_changelog_title: BailHook::new("renderChangelogTitle"),
            render_changelog_author: BailHook::new("renderChangelogAuthor"),
            render_changelog_author_line: BailHook::new("renderChangelogAuthorLine"),
            add_to_body: WaterfallHook::new("addToBody"),
            omit_release_notes,
        }
    }
}

impl Default for ChangelogHooks {
    fn default() -> Self {
        Self::new()
    }
}

fn is_renovate_commit(commit: &Commit) -> bool {
    commit.authors.iter().any(|author| {
        [&author.name, &author.username]
            .into_iter()
            .flatten()
            .any(|id| RENOVATE_AUTHORS.contains(&id.as_str()))
    })
}
