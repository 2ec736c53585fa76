//! YAML-aware frontmatter edits on existing notes.
//!
//! # Responsibility
//! - Read the metadata block of a stored note with a real YAML parser.
//! - Rewrite single top-level entries in place.
//!
//! # Invariants
//! - Only the edited entry's lines change; every other line of the block and
//!   the whole body are kept byte for byte.
//! - An entry spans its key line plus following indented lines, blank lines
//!   and column-zero `-` items. Trailing blank lines stay outside the entry.

use super::frontmatter::{locate_block, FENCE, KEY_ALIASES};
use serde_yaml_ng::{Mapping, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::ops::Range;

#[derive(Debug)]
pub enum FrontmatterError {
    /// Metadata block is not valid YAML.
    Yaml(serde_yaml_ng::Error),
    /// Metadata block parses, but not to a key/value map.
    NotAMapping,
}

impl Display for FrontmatterError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Yaml(err) => write!(f, "invalid YAML frontmatter: {err}"),
            Self::NotAMapping => write!(f, "frontmatter is not a key/value map"),
        }
    }
}

impl Error for FrontmatterError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Yaml(err) => Some(err),
            Self::NotAMapping => None,
        }
    }
}

impl From<serde_yaml_ng::Error> for FrontmatterError {
    fn from(value: serde_yaml_ng::Error) -> Self {
        Self::Yaml(value)
    }
}

/// Parses the metadata block of `content`; empty when there is none.
pub fn read_frontmatter(content: &str) -> Result<Mapping, FrontmatterError> {
    let Some(block) = locate_block(content) else {
        return Ok(Mapping::new());
    };
    match serde_yaml_ng::from_str::<Value>(block.body)? {
        Value::Null => Ok(Mapping::new()),
        Value::Mapping(mapping) => Ok(mapping),
        _ => Err(FrontmatterError::NotAMapping),
    }
}

/// Top-level string keys in document order.
pub fn string_keys(mapping: &Mapping) -> impl Iterator<Item = &str> {
    mapping.keys().filter_map(Value::as_str)
}

/// Text of a scalar value; `None` for null, maps and sequences.
pub fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

/// Values of `aliases`; a non-empty scalar counts as one alias.
pub fn aliases(mapping: &Mapping) -> Vec<String> {
    match mapping.get(KEY_ALIASES) {
        Some(Value::Sequence(items)) => items.iter().filter_map(scalar_text).collect(),
        Some(value) => scalar_text(value)
            .filter(|text| !text.is_empty())
            .into_iter()
            .collect(),
        None => Vec::new(),
    }
}

/// Link texts held by a value such as `"[[A]]"` or `["[[A]]", "[[B]]"]`.
///
/// An unquoted `[[A]]` parses as a nested sequence and is read back as the
/// link `[[A]]`.
pub fn link_texts(value: &Value) -> Vec<String> {
    match value {
        Value::Sequence(items) => items.iter().filter_map(link_text).collect(),
        other => link_text(other).into_iter().collect(),
    }
}

fn link_text(value: &Value) -> Option<String> {
    match value {
        Value::Sequence(inner) => match inner.as_slice() {
            [Value::String(target)] => Some(format!("[[{target}]]")),
            _ => None,
        },
        other => scalar_text(other).filter(|text| !text.is_empty()),
    }
}

/// Renders `key:` followed by double-quoted block list items.
pub fn render_list_entry(key: &str, items: &[String]) -> Result<String, FrontmatterError> {
    let key = render_key(key)?;
    if items.is_empty() {
        return Ok(format!("{key}: []"));
    }
    let mut lines = vec![format!("{key}:")];
    for item in items {
        // A JSON string is a valid YAML double-quoted scalar.
        let quoted = serde_json::to_string(item).unwrap_or_else(|_| format!("\"{item}\""));
        lines.push(format!("  - {quoted}"));
    }
    Ok(lines.join("\n"))
}

/// Renders `key: value` as YAML, nested values included.
pub fn render_value_entry(key: &str, value: &Value) -> Result<String, FrontmatterError> {
    let mut mapping = Mapping::new();
    mapping.insert(Value::String(key.to_string()), value.clone());
    let rendered = serde_yaml_ng::to_string(&mapping)?;
    Ok(rendered.trim_end().to_string())
}

/// Renders `key:` with no value.
pub fn render_empty_entry(key: &str) -> Result<String, FrontmatterError> {
    Ok(format!("{}:", render_key(key)?))
}

fn render_key(key: &str) -> Result<String, FrontmatterError> {
    let rendered = serde_yaml_ng::to_string(&Value::String(key.to_string()))?;
    Ok(rendered.trim_end().to_string())
}

/// Raw lines of the top-level entry `key`, as written.
pub fn raw_entry(content: &str, key: &str) -> Option<String> {
    let block = locate_block(content)?;
    let range = find_entry(block.body, key)?;
    Some(block.body[range].trim_end().to_string())
}

/// Replaces the top-level entry `key` with `entry`, or appends it at the end
/// of the block. A block is prepended when the note has none.
pub fn set_entry(content: &str, key: &str, entry: &str) -> String {
    let Some(block) = locate_block(content) else {
        return format!("{FENCE}\n{entry}\n{FENCE}\n\n{content}");
    };

    let body = block.body;
    let (before, after) = match find_entry(body, key) {
        Some(range) => (&body[..range.start], &body[range.end..]),
        None => (body, ""),
    };
    let mut updated = String::with_capacity(content.len() + entry.len() + 1);
    updated.push_str(&content[..block.body_start]);
    updated.push_str(before);
    if !before.is_empty() && !before.ends_with('\n') {
        updated.push('\n');
    }
    updated.push_str(entry);
    updated.push('\n');
    updated.push_str(after);
    updated.push_str(&content[block.body_end..]);
    updated
}

fn find_entry(body: &str, key: &str) -> Option<Range<usize>> {
    let mut lines = body.split_inclusive('\n');
    let mut offset = 0;
    let start = loop {
        let line = lines.next()?;
        let line_start = offset;
        offset += line.len();
        if top_level_key(strip_eol(line)).is_some_and(|found| found == key) {
            break line_start;
        }
    };

    let mut end = offset;
    for line in lines {
        offset += line.len();
        let text = strip_eol(line);
        if text.trim().is_empty() {
            continue;
        }
        if !is_continuation(text) {
            break;
        }
        end = offset;
    }
    Some(start..end)
}

fn strip_eol(line: &str) -> &str {
    line.trim_end_matches(['\n', '\r'])
}

fn is_continuation(line: &str) -> bool {
    line.starts_with([' ', '\t']) || line == "-" || line.starts_with("- ")
}

fn top_level_key(line: &str) -> Option<String> {
    if line.is_empty() || line.starts_with([' ', '\t', '#', '-']) {
        return None;
    }
    let (colon, _) = line.match_indices(':').find(|(index, _)| {
        line[index + 1..]
            .chars()
            .next()
            .map_or(true, char::is_whitespace)
    })?;
    let key = line[..colon].trim();
    let unquoted = ['"', '\'']
        .iter()
        .find_map(|quote| key.strip_prefix(*quote)?.strip_suffix(*quote))
        .unwrap_or(key);
    Some(unquoted.to_string())
}
