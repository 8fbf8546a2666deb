//! Pull request references embedded in commit messages

use std::sync::OnceLock;

use regex::Regex;

use liftoff_core::commit::RawCommit;

fn merge_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^Merge pull request #(\d+) from (\S+)").expect("merge pattern is valid")
    })
}

fn squash_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\s*\(#(\d+)\)\s*$").expect("squash pattern is valid"))
}

/// Build a raw commit from message parts, extracting any pull request reference.
///
/// `Merge pull request #N from owner/branch` commits take their subject from
/// the first non-empty body line. Squash subjects ending in `(#N)` lose the
/// suffix.
pub fn parse_commit_message(
    hash: &str,
    summary: &str,
    body: &str,
    author_name: &str,
    author_email: &str,
) -> RawCommit {
    let mut raw = RawCommit::new(hash, summary.trim(), author_name, author_email)
        .with_body(body.trim());

    if let Some(caps) = merge_pattern().captures(summary) {
        let number = caps[1].parse::<u64>().ok();
        let base = caps[2].to_string();

        let mut lines = body.lines().map(str::trim).skip_while(|l| l.is_empty());
        if let Some(subject) = lines.next() {
            raw.subject = subject.to_string();
            raw.body = lines.collect::<Vec<_>>().join("\n").trim().to_string();
        }
        if let Some(number) = number {
            raw = raw.with_pull_request(number, Some(base));
        }
        return raw;
    }

    if let Some(caps) = squash_pattern().captures(summary) {
        if let Ok(number) = caps[1].parse::<u64>() {
            raw.subject = squash_pattern().replace(summary, "").trim().to_string();
            raw = raw.with_pull_request(number, None);
        }
    }

    raw
}
