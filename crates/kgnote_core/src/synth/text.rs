//! File-name and wikilink text helpers.

use once_cell::sync::Lazy;
use regex::Regex;

static ILLEGAL_FILE_NAME_CHARS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[\\/:*?"<>|]"#).expect("valid file name regex"));
static WIKILINK_TARGET_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[\[([^|\]]+)").expect("valid wikilink target regex"));
static WIKILINK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[\[.*?\]\]").expect("valid wikilink regex"));

/// Removes characters that are illegal in vault file names.
pub fn sanitize_file_name(name: &str) -> String {
    ILLEGAL_FILE_NAME_CHARS_RE
        .replace_all(name.trim(), "")
        .trim()
        .to_string()
}

/// Extracts the target note name from `[[Target|Display]]`.
pub fn parse_wikilink(link: &str) -> Option<String> {
    WIKILINK_TARGET_RE
        .captures(link)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|target| !target.is_empty())
}

/// Returns every `[[...]]` occurrence in `text`, in order.
pub fn find_wikilinks(text: &str) -> Vec<String> {
    WIKILINK_RE
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Builds `[[title]]`, or `[[title|display]]` when the display text differs.
pub fn wikilink(title: &str, display: Option<&str>) -> String {
    match display {
        Some(display) if display != title => format!("[[{title}|{display}]]"),
        _ => format!("[[{title}]]"),
    }
}
