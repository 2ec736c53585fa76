//! Separator-tolerant relation query tokenizer.
//!
//! # Invariants
//! - Only the first two stage-separated groups are meaningful (head, tail);
//!   later segments stay in `raw` but never reach the token lists.
//! - Tokens are trimmed and never empty.
//! - Group spans index into `raw` and always fall on char boundaries.

use super::stage::{infer_stage, Stage};
use super::{is_item_separator, is_stage_separator};
use std::ops::Range;

/// Parsed view of the text typed after the trigger marker.
///
/// Rebuilt from scratch on every keystroke; holds no session state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationQuery {
    raw: String,
    relation_abbrev: String,
    head_tokens: Vec<String>,
    tail_tokens: Vec<String>,
    head_span: Option<Range<usize>>,
    tail_span: Option<Range<usize>>,
}

impl RelationQuery {
    /// Tokenizes a raw query. Never fails.
    pub fn parse(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let separators: Vec<(usize, usize)> = raw
            .char_indices()
            .filter(|(_, c)| is_stage_separator(*c))
            .map(|(index, c)| (index, index + c.len_utf8()))
            .take(3)
            .collect();

        let relation_abbrev = match separators.first() {
            Some((start, _)) => raw[..*start].trim().to_string(),
            None => String::new(),
        };
        let group_span = |position: usize| -> Option<Range<usize>> {
            let (_, start) = *separators.get(position)?;
            let end = separators
                .get(position + 1)
                .map_or(raw.len(), |(next, _)| *next);
            Some(start..end)
        };
        let head_span = group_span(0);
        let tail_span = group_span(1);

        let head_tokens = head_span
            .as_ref()
            .map(|span| split_items(&raw[span.clone()]))
            .unwrap_or_default();
        let tail_tokens = tail_span
            .as_ref()
            .map(|span| split_items(&raw[span.clone()]))
            .unwrap_or_default();

        Self {
            raw,
            relation_abbrev,
            head_tokens,
            tail_tokens,
            head_span,
            tail_span,
        }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Relation token typed before the first stage separator.
    ///
    /// Empty while the type is still being selected; see [`Self::type_prefix`].
    pub fn relation_abbrev(&self) -> &str {
        &self.relation_abbrev
    }

    pub fn head_tokens(&self) -> &[String] {
        &self.head_tokens
    }

    pub fn tail_tokens(&self) -> &[String] {
        &self.tail_tokens
    }

    pub fn stage(&self) -> Stage {
        infer_stage(&self.raw)
    }

    /// Text typed so far while selecting a relation type.
    pub fn type_prefix(&self) -> &str {
        match self.stage() {
            Stage::SelectingRelationType => self.raw.trim(),
            _ => &self.relation_abbrev,
        }
    }

    /// Whether both groups carry at least one concept.
    pub fn is_complete(&self) -> bool {
        !self.head_tokens.is_empty() && !self.tail_tokens.is_empty()
    }

    /// Byte span of the group the cursor is editing, if any.
    pub fn active_group_span(&self) -> Option<Range<usize>> {
        match self.stage() {
            Stage::SelectingRelationType => None,
            Stage::EnteringHead => self.head_span.clone(),
            Stage::EnteringTail => self.tail_span.clone(),
        }
    }

    /// Byte span of the last (partial) token of the active group.
    ///
    /// Starts right after the group's last item separator and runs to the end
    /// of the group, so surrounding whitespace belongs to the span.
    pub fn partial_token_span(&self) -> Option<Range<usize>> {
        let group = self.active_group_span()?;
        let text = &self.raw[group.clone()];
        let start = text
            .char_indices()
            .rev()
            .find(|(_, c)| is_item_separator(*c))
            .map_or(group.start, |(index, c)| group.start + index + c.len_utf8());
        Some(start..group.end)
    }

    /// Last (partial) token of the active group, trimmed.
    pub fn partial_token(&self) -> &str {
        self.partial_token_span()
            .map_or("", |span| self.raw[span].trim())
    }
}

/// Splits one group on item separators into trimmed non-empty tokens.
pub fn split_items(group: &str) -> Vec<String> {
    group
        .split(is_item_separator)
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}
