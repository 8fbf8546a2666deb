//! Commit model shared by the log reader, normalizer and changelog renderer

use serde::{Deserialize, Serialize};

/// Username the platform reports for commits it cannot attribute
pub const INVALID_EMAIL_USERNAME: &str = "invalid-email-address";

/// A commit as read from the version control log, before enrichment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawCommit {
    /// Full commit hash
    pub hash: String,
    /// First line of the message (for merge commits, the merged subject)
    pub subject: String,
    /// Remaining message lines
    pub body: String,
    /// Git author name
    pub author_name: String,
    /// Git author email
    pub author_email: String,
    /// Pull request number parsed from the message
    pub pr_number: Option<u64>,
    /// Branch recorded in a merge commit message (`owner/branch`)
    pub pr_base: Option<String>,
}

impl RawCommit {
    /// Create a raw commit with subject and author
    pub fn new(
        hash: impl Into<String>,
        subject: impl Into<String>,
        author_name: impl Into<String>,
        author_email: impl Into<String>,
    ) -> Self {
        Self {
            hash: hash.into(),
            subject: subject.into(),
            body: String::new(),
            author_name: author_name.into(),
            author_email: author_email.into(),
            pr_number: None,
            pr_base: None,
        }
    }

    /// Set the body
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// Set the pull request parsed from the message
    pub fn with_pull_request(mut self, number: u64, base: Option<String>) -> Self {
        self.pr_number = Some(number);
        self.pr_base = base;
        self
    }
}

/// One identity that contributed to a commit
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CommitAuthor {
    /// Display name
    pub name: Option<String>,
    /// Email address
    pub email: Option<String>,
    /// Platform login
    pub username: Option<String>,
    /// Hash of the commit this identity was resolved from
    pub hash: Option<String>,
}

impl CommitAuthor {
    /// Create an author from git name/email, dropping empty values
    pub fn from_git(name: &str, email: &str) -> Self {
        Self {
            name: non_empty(name),
            email: non_empty(email),
            username: None,
            hash: None,
        }
    }

    /// Set the platform login
    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = non_empty(&username.into());
        self
    }

    /// Set the commit hash
    pub fn with_hash(mut self, hash: impl Into<String>) -> Self {
        self.hash = Some(hash.into());
        self
    }

    /// Whether the author carries any identity at all
    pub fn has_identity(&self) -> bool {
        self.name.is_some() || self.email.is_some() || self.username.is_some()
    }

    /// Whether the platform could not attribute this author
    pub fn is_invalid(&self) -> bool {
        self.username.as_deref() == Some(INVALID_EMAIL_USERNAME)
    }

    /// Whether two identities refer to the same person.
    ///
    /// A shared name only counts when neither the emails nor the
    /// usernames disagree.
    pub fn same_person(&self, other: &CommitAuthor) -> bool {
        fn eq(a: &Option<String>, b: &Option<String>) -> bool {
            matches!((a, b), (Some(a), Some(b)) if a.eq_ignore_ascii_case(b))
        }
        fn differ(a: &Option<String>, b: &Option<String>) -> bool {
            matches!((a, b), (Some(a), Some(b)) if !a.eq_ignore_ascii_case(b))
        }
        eq(&self.username, &other.username)
            || eq(&self.email, &other.email)
            || (eq(&self.name, &other.name)
                && !differ(&self.email, &other.email)
                && !differ(&self.username, &other.username))
    }

    /// Fill fields missing here from another identity of the same person
    pub fn merge(mut self, other: &CommitAuthor) -> Self {
        if self.name.is_none() {
            self.name = other.name.clone();
        }
        if self.email.is_none() {
            self.email = other.email.clone();
        }
        if self.username.is_none() {
            self.username = other.username.clone();
        }
        if self.hash.is_none() {
            self.hash = other.hash.clone();
        }
        self
    }
}

/// Pull request a commit was merged through
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestRef {
    /// Pull request number
    pub number: u64,
    /// Branch recorded for the merge, possibly `owner/branch`
    pub base: Option<String>,
    /// Pull request description
    pub body: Option<String>,
}

impl PullRequestRef {
    /// Create a reference to a pull request number
    pub fn new(number: u64) -> Self {
        Self {
            number,
            base: None,
            body: None,
        }
    }

    /// Branch name without the owner prefix
    pub fn base_branch(&self) -> Option<&str> {
        self.base
            .as_deref()
            .map(|base| base.rsplit('/').next().unwrap_or(base))
    }
}

/// A commit after normalization: authors, pull request and labels attached
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    /// Full commit hash
    pub hash: String,
    /// Subject line
    pub subject: String,
    /// Message body
    pub body: String,
    /// Git author name as recorded in the commit
    pub author_name: String,
    /// Git author email as recorded in the commit
    pub author_email: String,
    /// Everyone who contributed to the commit
    pub authors: Vec<CommitAuthor>,
    /// Pull request the commit landed through
    pub pull_request: Option<PullRequestRef>,
    /// Labels, deduplicated
    pub labels: Vec<String>,
}

impl Commit {
    /// Create a commit with only hash and subject
    pub fn new(hash: impl Into<String>, subject: impl Into<String>) -> Self {
        Self {
            hash: hash.into(),
            subject: subject.into(),
            body: String::new(),
            author_name: String::new(),
            author_email: String::new(),
            authors: Vec::new(),
            pull_request: None,
            labels: Vec::new(),
        }
    }

    /// Set the body
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// Add an author
    pub fn with_author(mut self, author: CommitAuthor) -> Self {
        self.authors.push(author);
        self
    }

    /// Set the pull request
    pub fn with_pull_request(mut self, pull_request: PullRequestRef) -> Self {
        self.pull_request = Some(pull_request);
        self
    }

    /// Add labels, keeping the set deduplicated
    pub fn with_labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.add_labels(labels);
        self
    }

    /// Union labels into the set
    pub fn add_labels<I, S>(&mut self, labels: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut merged = std::mem::take(&mut self.labels);
        merged.extend(labels.into_iter().map(Into::into));
        self.labels = normalize_label_set(merged);
    }

    /// Whether the commit carries a label
    pub fn has_label(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l == label)
    }

    /// Pull request number, if any
    pub fn pr_number(&self) -> Option<u64> {
        self.pull_request.as_ref().map(|pr| pr.number)
    }

    /// Add an author unless the same person is already listed
    pub fn add_author(&mut self, author: CommitAuthor) {
        match self.authors.iter_mut().find(|a| a.same_person(&author)) {
            Some(existing) => *existing = existing.clone().merge(&author),
            None => self.authors.push(author),
        }
    }
}

impl From<RawCommit> for Commit {
    fn from(raw: RawCommit) -> Self {
        let pull_request = raw.pr_number.map(|number| PullRequestRef {
            number,
            base: raw.pr_base.clone(),
            body: None,
        });
        Self {
            hash: raw.hash,
            subject: raw.subject,
            body: raw.body,
            author_name: raw.author_name,
            author_email: raw.author_email,
            authors: Vec::new(),
            pull_request,
            labels: Vec::new(),
        }
    }
}

/// Trim, drop empties and deduplicate a label set, keeping first-seen order
pub fn normalize_label_set<I, S>(labels: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out: Vec<String> = Vec::new();
    for label in labels {
        let label = label.as_ref().trim();
        if !label.is_empty() && !out.iter().any(|l| l == label) {
            out.push(label.to_string());
        }
    }
    out
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}
