//! Canonical relation title synthesis.
//!
//! # Invariants
//! - Titles have the shape `{head}-{relation}-{tail}` with concepts joined by
//!   `_`.
//! - A title with an empty tail ends with a dangling `-` and is never final.
//! - Reverse titles are only defined for well-formed three-part titles.

use crate::model::relation::RelationTypeTable;
use crate::query::tokenizer::RelationQuery;
use crate::query::{QueryError, CANONICAL_ITEM_SEPARATOR};

/// Separator between the three parts of a relation title.
pub const TITLE_PART_SEPARATOR: char = '-';

/// Result of synthesizing a relation triple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesizedTitle {
    pub title: String,
    pub relation_name: String,
    pub head: Vec<String>,
    pub tail: Vec<String>,
}

impl SynthesizedTitle {
    /// Whether the title is complete enough to create a note from.
    pub fn is_final(&self) -> bool {
        !self.tail.is_empty()
    }
}

/// Builds the canonical title for a relation triple.
///
/// # Errors
/// - `QueryError::InvalidQuery` when the abbreviation is unknown.
/// - `QueryError::InvalidQuery` when `head` is empty.
pub fn synthesize(
    relation_abbrev: &str,
    head: &[String],
    tail: &[String],
    table: &RelationTypeTable,
) -> Result<SynthesizedTitle, QueryError> {
    let relation = table.lookup(relation_abbrev).ok_or_else(|| {
        QueryError::invalid(
            relation_abbrev,
            format!("unknown relation type `{}`", relation_abbrev.trim()),
        )
    })?;
    if head.is_empty() {
        return Err(QueryError::invalid(relation_abbrev, "head group is empty"));
    }

    let head_part = head.join(CANONICAL_ITEM_SEPARATOR);
    let tail_part = tail.join(CANONICAL_ITEM_SEPARATOR);
    let title = format!(
        "{head_part}{sep}{name}{sep}{tail_part}",
        sep = TITLE_PART_SEPARATOR,
        name = relation.name
    );

    Ok(SynthesizedTitle {
        title,
        relation_name: relation.name.clone(),
        head: head.to_vec(),
        tail: tail.to_vec(),
    })
}

/// Synthesizes the title for a parsed query.
pub fn synthesize_query(
    query: &RelationQuery,
    table: &RelationTypeTable,
) -> Result<SynthesizedTitle, QueryError> {
    synthesize(
        query.relation_abbrev(),
        query.head_tokens(),
        query.tail_tokens(),
        table,
    )
    .map_err(|err| match err {
        QueryError::InvalidQuery { message, .. } => QueryError::invalid(query.raw(), message),
    })
}

/// Three trimmed parts of a relation title.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelationTitleParts<'a> {
    pub head: &'a str,
    pub relation: &'a str,
    pub tail: &'a str,
}

/// Splits `head-relation-tail`; any other part count yields `None`.
pub fn split_relation_title(title: &str) -> Option<RelationTitleParts<'_>> {
    let mut parts = title.split(TITLE_PART_SEPARATOR).map(str::trim);
    let head = parts.next()?;
    let relation = parts.next()?;
    let tail = parts.next()?;
    if parts.next().is_some() {
        return None;
    }
    Some(RelationTitleParts {
        head,
        relation,
        tail,
    })
}

/// Returns `tail-relation-head` for a three-part title.
pub fn reverse_title(title: &str) -> Option<String> {
    let parts = split_relation_title(title)?;
    Some(format!(
        "{tail}{sep}{relation}{sep}{head}",
        tail = parts.tail,
        relation = parts.relation,
        head = parts.head,
        sep = TITLE_PART_SEPARATOR
    ))
}

#[cfg(test)]
mod tests {
    use super::{reverse_title, split_relation_title, synthesize, synthesize_query};
    use crate::model::relation::RelationTypeTable;
    use crate::query::tokenizer::RelationQuery;
    use crate::query::QueryError;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn synthesizes_influence_title() {
        let table = RelationTypeTable::default();
        let query = RelationQuery::parse("i；地球；太阳");
        let synthesized = synthesize_query(&query, &table).expect("valid query");
        assert_eq!(synthesized.title, "地球-影响-太阳");
        assert_eq!(synthesized.relation_name, "影响");
        assert!(synthesized.is_final());
    }

    #[test]
    fn joins_multiple_concepts_with_underscore() {
        let table = RelationTypeTable::default();
        let synthesized = synthesize(
            "A",
            &strings(&["猫", "狮子"]),
            &strings(&["狗"]),
            &table,
        )
        .expect("uppercase abbreviation resolves");
        assert_eq!(synthesized.title, "猫_狮子-关联-狗");
    }

    #[test]
    fn empty_tail_leaves_dangling_separator() {
        let table = RelationTypeTable::default();
        let synthesized =
            synthesize("u", &strings(&["数学"]), &[], &table).expect("head is enough");
        assert_eq!(synthesized.title, "数学-应用-");
        assert!(!synthesized.is_final());
    }

    #[test]
    fn unknown_abbreviation_is_invalid_query() {
        let table = RelationTypeTable::default();
        let err = synthesize_query(&RelationQuery::parse("x；A；B"), &table)
            .expect_err("x is unknown");
        match err {
            QueryError::InvalidQuery { query, message } => {
                assert_eq!(query, "x；A；B");
                assert!(message.contains("unknown relation type"));
            }
        }
    }

    #[test]
    fn empty_head_is_invalid_query() {
        let table = RelationTypeTable::default();
        let err = synthesize("i", &[], &strings(&["B"]), &table).expect_err("no head");
        assert!(err.to_string().contains("head group is empty"));
    }

    #[test]
    fn reverse_title_requires_three_parts() {
        assert_eq!(reverse_title("猫-关联-狗").as_deref(), Some("狗-关联-猫"));
        assert_eq!(reverse_title(" 猫 - 关联 - 狗 ").as_deref(), Some("狗-关联-猫"));
        assert!(reverse_title("猫-关联").is_none());
        assert!(reverse_title("a-b-c-d").is_none());
        assert_eq!(
            split_relation_title("地球-影响-太阳").map(|parts| parts.relation),
            Some("影响")
        );
    }
}
