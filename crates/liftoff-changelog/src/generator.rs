//! Changelog generation

use std::collections::HashSet;

use futures::future::join_all;
use tracing::{debug, info, instrument};

use liftoff_core::commit::{Commit, CommitAuthor};
use liftoff_core::labels::LabelDefinition;
use liftoff_core::types::ReleaseType;

use crate::hooks::{BodyContext, ChangelogHooks};
use crate::options::ChangelogOptions;
use crate::release_notes::extract_release_notes;

/// Label attached to pull requests once they have shipped
const RELEASED_LABEL: &str = "released";

/// Commits filed under one titled label
#[derive(Debug, Clone)]
struct LabelSection {
    label: LabelDefinition,
    commits: Vec<Commit>,
}

/// Renders release notes for a set of commits
#[derive(Debug, Clone)]
pub struct Changelog {
    options: ChangelogOptions,
    /// Rendering extension points
    pub hooks: ChangelogHooks,
}

impl Changelog {
    /// Create a changelog renderer with the default hooks
    pub fn new(options: ChangelogOptions) -> Self {
        Self {
            options,
            hooks: ChangelogHooks::new(),
        }
    }

    /// The options the renderer was created with
    pub fn options(&self) -> &ChangelogOptions {
        &self.options
    }

    /// Generate the release notes for a group of commits.
    ///
    /// Sections, in order: anything added through `add_to_body`, the
    /// extracted pull request release notes, one section per changelog
    /// title and the authors. Sections are separated by a blank line.
    #[instrument(skip_all, fields(commit_count = commits.len()))]
    pub async fn generate_release_notes(&self, commits: &[Commit]) -> String {
        if commits.is_empty() {
            return String::new();
        }

        let split = self.split_commits(commits);
        debug!(groups = split.len(), "split commits into groups");

        let mut sections = Vec::new();

        let body = self
            .hooks
            .add_to_body
            .call(BodyContext {
                sections: Vec::new(),
                commits: commits.to_vec(),
            })
            .await;
        sections.extend(body.sections.into_iter().filter(|s| !s.is_empty()));

        if let Some(notes) = self.release_notes_section(commits).await {
            sections.push(notes);
        }

        let authors = collect_authors(&split);
        sections.extend(self.label_sections(&split, &authors).await);

        if let Some(section) = self.author_section(&authors).await {
            sections.push(section);
        }

        info!(sections = sections.len(), "generated release notes");
        sections.join("\n\n")
    }

    /// File each commit under the first titled label it carries.
    ///
    /// Commits without a titled label, or labelled only `released`, are
    /// filed as a copy carrying the default patch label.
    fn split_commits(&self, commits: &[Commit]) -> Vec<LabelSection> {
        let mut titled: Vec<&LabelDefinition> = self
            .options
            .labels
            .iter()
            .filter(|l| l.changelog_title.is_some())
            .collect();
        titled.sort_by_key(|l| l.release_type.map_or(3, |t| t.section_rank()));

        let patch_label = self.options.first_label_of(ReleaseType::Patch);

        let mut remaining: Vec<Commit> = commits
            .iter()
            .map(|commit| {
                let unmatched = !titled.iter().any(|l| commit.has_label(&l.name));
                let only_released = commit.labels.len() == 1 && commit.labels[0] == RELEASED_LABEL;
                if unmatched || only_released {
                    commit.clone().with_labels([patch_label.as_str()])
                } else {
                    commit.clone()
                }
            })
            .collect();

        let mut split = Vec::new();
        for label in titled {
            let (matched, rest): (Vec<Commit>, Vec<Commit>) = remaining
                .into_iter()
                .partition(|c| c.has_label(&label.name));
            remaining = rest;

            if !matched.is_empty() {
                split.push(LabelSection {
                    label: label.clone(),
                    commits: matched,
                });
            }
        }

        if !remaining.is_empty() {
            debug!(count = remaining.len(), "commits without a changelog section");
        }
        split
    }

    /// Collect the release notes of every pull request once
    async fn release_notes_section(&self, commits: &[Commit]) -> Option<String> {
        let omitted = join_all(
            commits
                .iter()
                .map(|c| self.hooks.omit_release_notes.call(c.clone())),
        )
        .await;

        let mut visited = HashSet::new();
        let mut section = String::new();

        for (commit, omit) in commits.iter().zip(omitted) {
            if omit == Some(true) {
                continue;
            }
            let Some(pr) = &commit.pull_request else {
                continue;
            };
            let Some(body) = pr.body.as_deref() else {
                continue;
            };
            if visited.contains(&pr.number) {
                continue;
            }
            let Some(notes) = extract_release_notes(body) else {
                continue;
            };

            visited.insert(pr.number);
            section.push_str(&format!("_From #{}_\n\n{}\n\n", pr.number, notes));
        }

        if section.is_empty() {
            None
        } else {
            Some(format!("### Release Notes\n\n{}---", section))
        }
    }

    async fn label_sections(
        &self,
        split: &[LabelSection],
        authors: &[(Commit, CommitAuthor)],
    ) -> Vec<String> {
        let rendered = join_all(split.iter().map(|s| self.render_section(s, authors))).await;

        // Labels sharing a title render as one section.
        let mut merged: Vec<(String, Vec<String>)> = Vec::new();
        for (title, lines) in rendered {
            match merged.iter_mut().find(|(t, _)| *t == title) {
                Some((_, existing)) => existing.extend(lines),
                None => merged.push((title, lines)),
            }
        }

        merged
            .into_iter()
            .filter(|(_, lines)| !lines.is_empty())
            .map(|(title, lines)| {
                std::iter::once(title)
                    .chain(lines)
                    .collect::<Vec<_>>()
                    .join("\n")
            })
            .collect()
    }

    async fn render_section(
        &self,
        section: &LabelSection,
        authors: &[(Commit, CommitAuthor)],
    ) -> (String, Vec<String>) {
        let label = &section.label;
        let title_text = label
            .changelog_title
            .clone()
            .unwrap_or_else(|| label.name.clone());
        let title = match self
            .hooks
            .render_changelog_title
            .call((label.clone(), title_text.clone()))
            .await
        {
            Some(title) => title,
            None => format!("#### {}\n", title_text),
        };

        // Prerelease-branch commits keep their release notes but get no line.
        let visible = section
            .commits
            .iter()
            .filter(|c| !self.targets_prerelease_branch(c));
        let mut lines = join_all(visible.map(|c| self.render_line(c, authors))).await;
        lines.sort_by_key(|line| line.split('\n').count());

        (title, lines)
    }

    fn targets_prerelease_branch(&self, commit: &Commit) -> bool {
        commit
            .pull_request
            .as_ref()
            .and_then(|pr| pr.base_branch())
            .is_some_and(|branch| self.options.is_prerelease_branch(branch))
    }

    /// `- <subject> [#<pr>](<url>) (<author links>)`
    async fn render_line(&self, commit: &Commit, authors: &[(Commit, CommitAuthor)]) -> String {
        let mut line = format!("- {}", commit.subject.trim());

        if let Some(number) = commit.pr_number() {
            line.push_str(&format!(
                " [#{}]({}/pull/{})",
                number, self.options.base_url, number
            ));
        }

        let links = join_all(commit.authors.iter().map(|author| {
            let author = resolve_author(author, authors);
            async move { self.author_link(&author, commit).await }
        }))
        .await;
        let mut unique: Vec<String> = Vec::new();
        for link in links.into_iter().flatten() {
            if !unique.contains(&link) {
                unique.push(link);
            }
        }
        if !unique.is_empty() {
            line.push_str(&format!(" ({})", unique.join(" ")));
        }

        let (_, line) = self
            .hooks
            .render_changelog_line
            .call((commit.clone(), line))
            .await;
        line
    }

    async fn author_link(&self, author: &CommitAuthor, commit: &Commit) -> Option<String> {
        if let Some(link) = self
            .hooks
            .render_changelog_author
            .call((author.clone(), commit.clone()))
            .await
        {
            return Some(link);
        }
        self.default_author_link(author, commit)
    }

    /// Profile link for platform users, the email otherwise
    fn default_author_link(&self, author: &CommitAuthor, commit: &Commit) -> Option<String> {
        if author.is_invalid() {
            return None;
        }
        match &author.username {
            Some(username) => Some(format!(
                "[@{}]({}/{})",
                username,
                self.options.origin(),
                username
            )),
            None => author
                .email
                .clone()
                .or_else(|| (!commit.author_email.is_empty()).then(|| commit.author_email.clone())),
        }
    }

    async fn author_line(&self, author: &CommitAuthor, link: Option<String>) -> Option<String> {
        let user = link.unwrap_or_default();
        if let Some(line) = self
            .hooks
            .render_changelog_author_line
            .call((author.clone(), user.clone()))
            .await
        {
            return Some(line);
        }

        if user.is_empty() {
            return None;
        }
        match &author.name {
            Some(name) => Some(format!("- {} ({})", name, user)),
            None => Some(format!("- {}", user)),
        }
    }

    async fn author_section(&self, authors: &[(Commit, CommitAuthor)]) -> Option<String> {
        let entries = join_all(authors.iter().map(|(commit, author)| async move {
            let author = resolve_author(author, authors);
            let link = self.author_link(&author, commit).await;
            self.author_line(&author, link).await
        }))
        .await;

        // Distinct people may share a name, so only identical lines collapse.
        let unique: HashSet<String> = entries.into_iter().flatten().collect();
        let mut lines: Vec<String> = unique.into_iter().collect();
        lines.sort_by(|a, b| {
            a.to_lowercase()
                .cmp(&b.to_lowercase())
                .then_with(|| a.cmp(b))
        });

        if lines.is_empty() {
            return None;
        }
        Some(format!("#### Authors: {}\n\n{}", lines.len(), lines.join("\n")))
    }
}

/// Every renderable author of the split commits with the commit it came from
fn collect_authors(split: &[LabelSection]) -> Vec<(Commit, CommitAuthor)> {
    split
        .iter()
        .flat_map(|s| s.commits.iter())
        .flat_map(|commit| {
            commit
                .authors
                .iter()
                .filter(|a| !a.is_invalid() && a.has_identity())
                .map(move |a| (commit.clone(), a.clone()))
        })
        .collect()
}

/// Fill the gaps in an author from the other identities of the same person,
/// platform users first
fn resolve_author(author: &CommitAuthor, known: &[(Commit, CommitAuthor)]) -> CommitAuthor {
    let mut matches: Vec<&CommitAuthor> = known
        .iter()
        .map(|(_, a)| a)
        .filter(|a| a.same_person(author))
        .collect();
    matches.sort_by_key(|a| a.username.is_none());
    matches
        .into_iter()
        .fold(author.clone(), |resolved, other| resolved.merge(other))
}
