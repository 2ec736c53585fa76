//! Backlink insertion under a named section heading.
//!
//! # Invariants
//! - A link already present anywhere in the note is never inserted again.
//! - A section ends at the next heading of the same or a higher level.
//! - Lines outside the insertion point are preserved byte for byte.

use once_cell::sync::Lazy;
use regex::Regex;

static HEADING_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(#+)\s+(.*)$").expect("valid heading regex"));

/// Result of a backlink insertion attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkInsertion {
    /// Content already contains the link; nothing changed.
    AlreadyLinked,
    /// Link was added as the last item of the named section.
    UnderHeading(String),
    /// Heading missing or not configured; link appended at the end.
    AppendedAtEnd(String),
}

impl LinkInsertion {
    /// New content, or `None` when nothing changed.
    pub fn content(&self) -> Option<&str> {
        match self {
            Self::AlreadyLinked => None,
            Self::UnderHeading(content) | Self::AppendedAtEnd(content) => Some(content),
        }
    }
}

/// Inserts `- {link}` at the end of the section titled `heading`.
pub fn insert_link_under_heading(content: &str, heading: &str, link: &str) -> LinkInsertion {
    if content.contains(link) {
        return LinkInsertion::AlreadyLinked;
    }

    let item = format!("- {link}");
    let heading = heading.trim();
    let mut lines: Vec<&str> = content.split('\n').collect();

    let target = if heading.is_empty() {
        None
    } else {
        lines.iter().enumerate().find_map(|(index, line)| {
            let caps = HEADING_RE.captures(line.trim_end_matches('\r'))?;
            let level = caps.get(1)?.as_str().len();
            (caps.get(2)?.as_str().trim() == heading).then_some((index, level))
        })
    };

    let Some((heading_line, level)) = target else {
        return LinkInsertion::AppendedAtEnd(append_at_end(content, &item));
    };

    let section_end = lines
        .iter()
        .enumerate()
        .skip(heading_line + 1)
        .find_map(|(index, line)| {
            let caps = HEADING_RE.captures(line.trim_end_matches('\r'))?;
            (caps.get(1)?.as_str().len() <= level).then_some(index)
        })
        .unwrap_or(lines.len());

    let mut last_content_line = section_end - 1;
    while last_content_line > heading_line && lines[last_content_line].trim().is_empty() {
        last_content_line -= 1;
    }
    lines.insert(last_content_line + 1, item.as_str());
    LinkInsertion::UnderHeading(lines.join("\n"))
}

fn append_at_end(content: &str, item: &str) -> String {
    if content.trim().is_empty() {
        return format!("{item}\n");
    }
    let mut updated = content.to_string();
    if !updated.ends_with('\n') {
        updated.push('\n');
    }
    updated.push('\n');
    updated.push_str(item);
    updated.push('\n');
    updated
}
