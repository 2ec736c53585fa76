//! Frontmatter parsing, merging and rendering.
//!
//! # Responsibility
//! - Parse the metadata block of a template or note into an ordered map.
//! - Apply note-creation overrides (`uid`, `type`, reverse alias).
//! - Render the block back in a fixed, diff-stable key order.
//!
//! # Invariants
//! - Rendering follows the preferred key order, then encounter order.
//! - Parsing accepts everything rendering emits, so building twice with the
//!   same inputs is byte-identical.
//! - A reverse alias is never added twice.

use crate::model::note::NoteKind;
use crate::model::relation::RelationTypeTable;
use crate::synth::title::{reverse_title, split_relation_title};
use crate::synth::yaml_edit::scalar_text;
use once_cell::sync::Lazy;
use regex::Regex;

/// Parent key used when settings leave it blank.
pub const DEFAULT_PARENT_KEY: &str = "parent";
pub const KEY_UID: &str = "uid";
pub const KEY_ALIASES: &str = "aliases";
pub const KEY_TYPE: &str = "type";
pub const KEY_PUBLISH: &str = "publish";

pub(crate) const FENCE: &str = "---";

static BLOCK_LIST_ITEM_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*-(?:\s+(.*?))?\s*$").expect("valid list item regex"));

/// One frontmatter value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrontmatterValue {
    Scalar(String),
    List(Vec<String>),
}

impl FrontmatterValue {
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Scalar(value) => value.is_empty(),
            Self::List(items) => items.is_empty(),
        }
    }
}

/// Ordered key/value frontmatter document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrontmatterDocument {
    entries: Vec<(String, FrontmatterValue)>,
}

impl FrontmatterDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses the body of a metadata block (without fences).
    ///
    /// Lines without a colon are ignored. `key: [a, "b"]` and block lists
    /// (`key:` followed by `- item` lines) both parse to lists. A repeated key
    /// keeps its first position and takes the last value.
    pub fn parse(body: &str) -> Self {
        let mut document = Self::new();
        let mut open_list_key: Option<String> = None;

        for line in body.lines() {
            if let Some(key) = open_list_key.as_deref() {
                if let Some(caps) = BLOCK_LIST_ITEM_RE.captures(line) {
                    let item = caps.get(1).map_or("", |m| m.as_str());
                    document.push_list_item(key, strip_quotes(item));
                    continue;
                }
            }

            let Some(colon) = line.find(':') else {
                open_list_key = None;
                continue;
            };
            let key = line[..colon].trim();
            let raw_value = line[colon + 1..].trim();
            if key.is_empty() {
                open_list_key = None;
                continue;
            }

            document.set(key, parse_inline_value(raw_value));
            open_list_key = raw_value.is_empty().then(|| key.to_string());
        }

        document
    }

    /// Parses the metadata block of full note content; empty when absent.
    pub fn from_content(content: &str) -> Self {
        locate_block(content).map_or_else(Self::new, |block| Self::parse(block.body))
    }

    pub fn get(&self, key: &str) -> Option<&FrontmatterValue> {
        self.entries
            .iter()
            .find(|(current, _)| current == key)
            .map(|(_, value)| value)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Inserts or replaces a value, keeping the original position of `key`.
    pub fn set(&mut self, key: &str, value: FrontmatterValue) {
        match self.entries.iter_mut().find(|(current, _)| current == key) {
            Some((_, current)) => *current = value,
            None => self.entries.push((key.to_string(), value)),
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FrontmatterValue)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Values of `aliases` as a list; a non-empty scalar counts as one alias.
    pub fn aliases(&self) -> Vec<String> {
        match self.get(KEY_ALIASES) {
            Some(FrontmatterValue::List(items)) => items.clone(),
            Some(FrontmatterValue::Scalar(value)) if !value.is_empty() => vec![value.clone()],
            _ => Vec::new(),
        }
    }

    /// Renders the block body in preferred order, then encounter order.
    pub fn render(&self, parent_key: &str) -> String {
        let preferred = preferred_key_order(parent_key);
        let mut lines = Vec::new();
        for key in preferred {
            if let Some(value) = self.get(key) {
                render_entry(&mut lines, key, value);
            }
        }
        for (key, value) in &self.entries {
            if !preferred.contains(&key.as_str()) {
                render_entry(&mut lines, key, value);
            }
        }
        lines.join("\n")
    }

    fn push_list_item(&mut self, key: &str, item: String) {
        match self.entries.iter_mut().find(|(current, _)| current == key) {
            Some((_, FrontmatterValue::List(items))) => items.push(item),
            Some((_, value)) => *value = FrontmatterValue::List(vec![item]),
            None => self
                .entries
                .push((key.to_string(), FrontmatterValue::List(vec![item]))),
        }
    }
}

/// Fixed key order used when rendering.
pub fn preferred_key_order(parent_key: &str) -> [&str; 5] {
    [
        KEY_UID,
        KEY_ALIASES,
        KEY_TYPE,
        normalize_parent_key(parent_key),
        KEY_PUBLISH,
    ]
}

/// Trimmed parent key, falling back to [`DEFAULT_PARENT_KEY`].
pub fn normalize_parent_key(parent_key: &str) -> &str {
    let trimmed = parent_key.trim();
    if trimmed.is_empty() {
        DEFAULT_PARENT_KEY
    } else {
        trimmed
    }
}

/// Outcome of the reverse-alias rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReverseAlias {
    /// Not a relation note, not a three-part title, or an asymmetric type.
    NotApplicable,
    /// Alias was appended to `aliases`.
    Added(String),
    /// Alias was already present; the document is unchanged.
    AlreadyPresent(String),
}

/// Adds `tail-relation-head` to `aliases` for symmetric relation titles.
///
/// Symmetry comes from the relation table, keyed by the title's middle part.
pub fn apply_reverse_alias(
    document: &mut FrontmatterDocument,
    title: &str,
    table: &RelationTypeTable,
) -> ReverseAlias {
    let Some(parts) = split_relation_title(title) else {
        return ReverseAlias::NotApplicable;
    };
    let symmetric = table
        .by_name(parts.relation)
        .is_some_and(|relation| relation.symmetric);
    if !symmetric {
        return ReverseAlias::NotApplicable;
    }
    let Some(alias) = reverse_title(title) else {
        return ReverseAlias::NotApplicable;
    };

    let mut aliases = document.aliases();
    if aliases.contains(&alias) {
        return ReverseAlias::AlreadyPresent(alias);
    }
    aliases.push(alias.clone());
    document.set(KEY_ALIASES, FrontmatterValue::List(aliases));
    ReverseAlias::Added(alias)
}

/// Inputs for [`build_frontmatter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrontmatterRequest<'a> {
    pub uid: &'a str,
    pub kind: NoteKind,
    /// Note title; relation titles drive the reverse-alias rule.
    pub title: Option<&'a str>,
    pub parent_key: &'a str,
}

/// Document and full note content produced from a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontmatterOutcome {
    pub document: FrontmatterDocument,
    pub content: String,
    pub reverse_alias: ReverseAlias,
}

/// Builds new note content from template content.
///
/// `uid` and `type` are overwritten unconditionally. For relation notes the
/// reverse-alias rule runs against `title`. The template body outside the
/// metadata block is preserved verbatim.
pub fn build_frontmatter(
    template: &str,
    request: &FrontmatterRequest<'_>,
    table: &RelationTypeTable,
) -> FrontmatterOutcome {
    let mut document = FrontmatterDocument::from_content(template);
    document.set(KEY_UID, FrontmatterValue::Scalar(request.uid.to_string()));
    document.set(
        KEY_TYPE,
        FrontmatterValue::Scalar(request.kind.as_str().to_string()),
    );

    let reverse_alias = match (request.kind, request.title) {
        (NoteKind::Relation, Some(title)) => apply_reverse_alias(&mut document, title, table),
        _ => ReverseAlias::NotApplicable,
    };

    let content = replace_frontmatter(template, &document, request.parent_key);
    FrontmatterOutcome {
        document,
        content,
        reverse_alias,
    }
}

/// Replaces (or prepends) the metadata block of `content`.
pub fn replace_frontmatter(
    content: &str,
    document: &FrontmatterDocument,
    parent_key: &str,
) -> String {
    let rendered = document.render(parent_key);
    let block = if rendered.is_empty() {
        format!("{FENCE}\n{FENCE}\n")
    } else {
        format!("{FENCE}\n{rendered}\n{FENCE}\n")
    };
    match locate_block(content) {
        Some(existing) => format!("{block}{}", &content[existing.end..]),
        None => format!("{block}\n{content}"),
    }
}

/// Byte layout of a leading `---` fenced block.
pub(crate) struct FrontmatterBlock<'a> {
    pub body: &'a str,
    /// First byte after the opening fence line.
    pub body_start: usize,
    /// First byte of the closing fence line.
    pub body_end: usize,
    /// First byte after the closing fence line.
    pub end: usize,
}

/// Finds a leading `---` fenced block.
pub(crate) fn locate_block(content: &str) -> Option<FrontmatterBlock<'_>> {
    let mut lines = content.split_inclusive('\n');
    let first = lines.next()?;
    if first.trim_end() != FENCE {
        return None;
    }

    let body_start = first.len();
    let mut offset = body_start;
    for line in lines {
        if line.trim_end() == FENCE {
            return Some(FrontmatterBlock {
                body: &content[body_start..offset],
                body_start,
                body_end: offset,
                end: offset + line.len(),
            });
        }
        offset += line.len();
    }
    None
}

fn parse_inline_value(raw: &str) -> FrontmatterValue {
    // `[[note]]` is a wikilink, not a nested list.
    if raw.starts_with("[[") {
        return FrontmatterValue::Scalar(raw.to_string());
    }
    if let Some(inner) = raw.strip_prefix('[').and_then(|rest| rest.strip_suffix(']')) {
        let inner = inner.trim();
        if inner.is_empty() {
            return FrontmatterValue::List(Vec::new());
        }
        if let Ok(items) = serde_yaml_ng::from_str::<Vec<serde_yaml_ng::Value>>(raw) {
            return FrontmatterValue::List(items.iter().filter_map(scalar_text).collect());
        }
        return FrontmatterValue::List(
            inner
                .split(',')
                .map(|item| strip_quotes(item.trim()))
                .collect(),
        );
    }
    FrontmatterValue::Scalar(raw.to_string())
}

fn strip_quotes(value: &str) -> String {
    let value = value.trim();
    for quote in ['"', '\''] {
        if let Some(inner) = value
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            return inner.to_string();
        }
    }
    value.to_string()
}

fn render_entry(lines: &mut Vec<String>, key: &str, value: &FrontmatterValue) {
    match value {
        FrontmatterValue::List(items) if items.is_empty() => lines.push(format!("{key}: []")),
        FrontmatterValue::List(items) => {
            lines.push(format!("{key}:"));
            lines.extend(items.iter().map(|item| format!("  - \"{item}\"")));
        }
        FrontmatterValue::Scalar(value) if value.is_empty() => lines.push(format!("{key}:")),
        FrontmatterValue::Scalar(value) => lines.push(format!("{key}: {value}")),
    }
}

#[cfg(test)]
mod tests {
    use super::{
        apply_reverse_alias, build_frontmatter, replace_frontmatter, FrontmatterDocument,
        FrontmatterRequest, FrontmatterValue, ReverseAlias,
    };
    use crate::model::note::NoteKind;
    use crate::model::relation::RelationTypeTable;

    const TEMPLATE: &str = "---\nuid: \naliases: []\ntype: \nparent:\npublish: true\n---\n\n# 概述\n";

    fn relation_request(title: &str) -> FrontmatterRequest<'_> {
        FrontmatterRequest {
            uid: "20240101120000",
            kind: NoteKind::Relation,
            title: Some(title),
            parent_key: "parent",
        }
    }

    #[test]
    fn parses_inline_and_block_lists() {
        let document = FrontmatterDocument::parse(
            "tags: [a, \"b\", 'c']\naliases:\n  - \"x\"\n  - y\nempty: []\nplain: value: with colon",
        );
        assert_eq!(
            document.get("tags"),
            Some(&FrontmatterValue::List(vec![
                "a".to_string(),
                "b".to_string(),
                "c".to_string()
            ]))
        );
        assert_eq!(document.aliases(), vec!["x".to_string(), "y".to_string()]);
        assert_eq!(document.get("empty"), Some(&FrontmatterValue::List(Vec::new())));
        assert_eq!(
            document.get("plain"),
            Some(&FrontmatterValue::Scalar("value: with colon".to_string()))
        );
    }

    #[test]
    fn quoted_inline_items_keep_their_commas() {
        let document = FrontmatterDocument::parse("aliases: [\"Cat, Dog\", 猫]");
        assert_eq!(
            document.aliases(),
            vec!["Cat, Dog".to_string(), "猫".to_string()]
        );
    }

    #[test]
    fn symmetric_relation_gets_reverse_alias_in_preferred_order() {
        let table = RelationTypeTable::default();
        let outcome = build_frontmatter(TEMPLATE, &relation_request("猫-关联-狗"), &table);
        assert_eq!(
            outcome.reverse_alias,
            ReverseAlias::Added("狗-关联-猫".to_string())
        );
        assert_eq!(
            outcome.content,
            "---\nuid: 20240101120000\naliases:\n  - \"狗-关联-猫\"\ntype: relation\nparent:\npublish: true\n---\n\n# 概述\n"
        );
    }

    #[test]
    fn asymmetric_relation_gets_no_alias() {
        let table = RelationTypeTable::default();
        let outcome = build_frontmatter(TEMPLATE, &relation_request("地球-影响-太阳"), &table);
        assert_eq!(outcome.reverse_alias, ReverseAlias::NotApplicable);
        assert_eq!(
            outcome.document.get("aliases"),
            Some(&FrontmatterValue::List(Vec::new()))
        );
    }

    #[test]
    fn building_twice_is_byte_identical_and_never_duplicates_alias() {
        let table = RelationTypeTable::default();
        let request = relation_request("A-关联-B");
        let first = build_frontmatter(TEMPLATE, &request, &table);
        let second = build_frontmatter(&first.content, &request, &table);
        assert_eq!(first.content, second.content);
        assert_eq!(
            second.reverse_alias,
            ReverseAlias::AlreadyPresent("B-关联-A".to_string())
        );
        assert_eq!(second.document.aliases(), vec!["B-关联-A".to_string()]);
    }

    #[test]
    fn remaining_keys_follow_in_encounter_order() {
        let table = RelationTypeTable::default();
        let template = "---\nzeta: 1\npublish: false\nalpha: 2\nuid: old\n---\nbody";
        let outcome = build_frontmatter(
            template,
            &FrontmatterRequest {
                uid: "new",
                kind: NoteKind::Concept,
                title: Some("猫"),
                parent_key: "",
            },
            &table,
        );
        assert_eq!(
            outcome.content,
            "---\nuid: new\ntype: concept\npublish: false\nzeta: 1\nalpha: 2\n---\nbody"
        );
    }

    #[test]
    fn template_without_block_gets_one_prepended() {
        let table = RelationTypeTable::default();
        let outcome = build_frontmatter(
            "# 概述\n",
            &FrontmatterRequest {
                uid: "1",
                kind: NoteKind::Concept,
                title: None,
                parent_key: "parent",
            },
            &table,
        );
        assert_eq!(outcome.content, "---\nuid: 1\ntype: concept\n---\n\n# 概述\n");
    }

    #[test]
    fn custom_parent_key_is_placed_in_preferred_slot() {
        let document = FrontmatterDocument::parse("publish: true\n父概念: \"[[动物]]\"\nuid: 1");
        let rendered = document.render("父概念");
        assert_eq!(rendered, "uid: 1\n父概念: \"[[动物]]\"\npublish: true");
    }

    #[test]
    fn scalar_alias_is_kept_when_reverse_alias_is_added() {
        let table = RelationTypeTable::default();
        let mut document = FrontmatterDocument::parse("aliases: 猫狗");
        let outcome = apply_reverse_alias(&mut document, "猫-对比-狗", &table);
        assert_eq!(outcome, ReverseAlias::Added("狗-对比-猫".to_string()));
        assert_eq!(
            document.aliases(),
            vec!["猫狗".to_string(), "狗-对比-猫".to_string()]
        );
    }

    #[test]
    fn replace_frontmatter_handles_crlf_and_missing_trailing_newline() {
        let document = FrontmatterDocument::parse("uid: 1");
        assert_eq!(
            replace_frontmatter("---\r\nuid: 0\r\n---", &document, "parent"),
            "---\nuid: 1\n---\n"
        );
    }
}
