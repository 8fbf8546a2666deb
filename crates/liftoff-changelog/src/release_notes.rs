//! Extraction of "Release Notes" sections from pull request descriptions

use std::sync::OnceLock;

use regex::Regex;

fn notes_heading() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^#{0,5} *release notes$").expect("valid regex"))
}

/// Number of leading `#` characters of a markdown line
fn heading_depth(line: &str) -> usize {
    line.chars().take_while(|c| *c == '#').count()
}

/// Pull the release notes out of a PR body.
///
/// The section starts at a `Release Notes` heading (any case, up to five
/// `#`) and runs until the next heading that is at most as deep and is not
/// itself a notes heading. Returns `None` when the body has no such heading.
pub fn extract_release_notes(body: &str) -> Option<String> {
    let heading = notes_heading();
    let lines: Vec<&str> = body
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .collect();

    let start = lines.iter().position(|line| heading.is_match(line))?;
    let depth = heading_depth(lines[start]);

    let mut notes = String::new();
    for line in &lines[start..] {
        let is_notes_heading = heading.is_match(line);
        if line.starts_with('#') && heading_depth(line) <= depth && !is_notes_heading {
            break;
        }
        if !is_notes_heading {
            notes.push_str(line);
            notes.push('\n');
        }
    }

    Some(notes.trim().to_string())
}
