//! Relation type table.
//!
//! # Responsibility
//! - Map single-character abbreviations to canonical relation names.
//! - Carry per-type backlink section headings and the symmetry flag.
//!
//! # Invariants
//! - Abbreviations are unique under case-insensitive comparison.
//! - Canonical names are unique and never contain title or query separators.
//! - Abbreviation lookup ignores case and surrounding whitespace.

use crate::query::{is_item_separator, is_stage_separator};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// One row of the relation type table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationType {
    /// Single-character shorthand typed after the trigger, e.g. `i`.
    pub abbreviation: String,
    /// Canonical relation name embedded in titles, e.g. `影响`.
    pub name: String,
    /// Section heading in head concept notes that receives the backlink.
    #[serde(default)]
    pub head_heading: String,
    /// Section heading in tail concept notes that receives the backlink.
    #[serde(default)]
    pub tail_heading: String,
    /// Whether swapping head and tail yields an equally valid title.
    #[serde(default)]
    pub symmetric: bool,
}

impl RelationType {
    pub fn new(
        abbreviation: impl Into<String>,
        name: impl Into<String>,
        head_heading: impl Into<String>,
        tail_heading: impl Into<String>,
        symmetric: bool,
    ) -> Self {
        Self {
            abbreviation: abbreviation.into(),
            name: name.into(),
            head_heading: head_heading.into(),
            tail_heading: tail_heading.into(),
            symmetric,
        }
    }
}

/// Ordered relation type table.
///
/// Order is significant: it is the order type candidates are offered in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RelationTypeTable {
    entries: Vec<RelationType>,
}

impl Default for RelationTypeTable {
    fn default() -> Self {
        Self {
            entries: vec![
                RelationType::new("i", "影响", "关系", "关系", false),
                RelationType::new("c", "对比", "对比", "对比", true),
                RelationType::new("a", "关联", "关系", "关系", true),
                RelationType::new("u", "应用", "应用", "应用", false),
            ],
        }
    }
}

impl RelationTypeTable {
    /// Builds a validated table.
    pub fn new(entries: Vec<RelationType>) -> Result<Self, RelationTableError> {
        let table = Self { entries };
        table.validate()?;
        Ok(table)
    }

    pub fn entries(&self) -> &[RelationType] {
        &self.entries
    }

    /// Looks up a relation type by abbreviation, case-insensitively.
    pub fn lookup(&self, abbreviation: &str) -> Option<&RelationType> {
        let wanted = abbreviation.trim().to_lowercase();
        if wanted.is_empty() {
            return None;
        }
        self.entries
            .iter()
            .find(|entry| entry.abbreviation.to_lowercase() == wanted)
    }

    /// Looks up a relation type by its canonical name.
    pub fn by_name(&self, name: &str) -> Option<&RelationType> {
        let wanted = name.trim();
        self.entries.iter().find(|entry| entry.name == wanted)
    }

    /// Validates table-level invariants.
    pub fn validate(&self) -> Result<(), RelationTableError> {
        if self.entries.is_empty() {
            return Err(RelationTableError::Empty);
        }

        let mut abbreviations = BTreeSet::<String>::new();
        let mut names = BTreeSet::<String>::new();
        for entry in &self.entries {
            let abbreviation = entry.abbreviation.trim();
            if abbreviation.is_empty() {
                return Err(RelationTableError::EmptyAbbreviation);
            }
            if abbreviation.chars().count() != 1 {
                return Err(RelationTableError::AbbreviationNotSingleChar(
                    abbreviation.to_string(),
                ));
            }
            if abbreviation.chars().any(is_reserved_char) {
                return Err(RelationTableError::ReservedCharacter(
                    abbreviation.to_string(),
                ));
            }
            if !abbreviations.insert(abbreviation.to_lowercase()) {
                return Err(RelationTableError::DuplicateAbbreviation(
                    abbreviation.to_string(),
                ));
            }

            let name = entry.name.trim();
            if name.is_empty() {
                return Err(RelationTableError::EmptyName(abbreviation.to_string()));
            }
            if name != entry.name || name.chars().any(|c| c == '-' || is_reserved_char(c)) {
                return Err(RelationTableError::ReservedCharacter(entry.name.clone()));
            }
            if !names.insert(name.to_string()) {
                return Err(RelationTableError::DuplicateName(name.to_string()));
            }
        }
        Ok(())
    }
}

fn is_reserved_char(c: char) -> bool {
    is_stage_separator(c) || is_item_separator(c)
}

/// Relation table validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelationTableError {
    Empty,
    EmptyAbbreviation,
    AbbreviationNotSingleChar(String),
    DuplicateAbbreviation(String),
    EmptyName(String),
    DuplicateName(String),
    ReservedCharacter(String),
}

impl Display for RelationTableError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "relation type table must not be empty"),
            Self::EmptyAbbreviation => write!(f, "relation abbreviation must not be empty"),
            Self::AbbreviationNotSingleChar(value) => {
                write!(f, "relation abbreviation must be one character: {value}")
            }
            Self::DuplicateAbbreviation(value) => {
                write!(f, "relation abbreviation is duplicated: {value}")
            }
            Self::EmptyName(abbreviation) => {
                write!(f, "relation `{abbreviation}` has an empty name")
            }
            Self::DuplicateName(value) => write!(f, "relation name is duplicated: {value}"),
            Self::ReservedCharacter(value) => {
                write!(f, "relation entry contains a reserved character: {value}")
            }
        }
    }
}

impl Error for RelationTableError {}

#[cfg(test)]
mod tests {
    use super::{RelationTableError, RelationType, RelationTypeTable};

    #[test]
    fn default_table_is_valid_and_marks_symmetric_types() {
        let table = RelationTypeTable::default();
        assert!(table.validate().is_ok());
        assert!(!table.lookup("i").expect("i exists").symmetric);
        assert!(table.lookup("a").expect("a exists").symmetric);
        assert!(table.lookup("c").expect("c exists").symmetric);
        assert!(!table.lookup("u").expect("u exists").symmetric);
    }

    #[test]
    fn lookup_ignores_case_and_whitespace() {
        let table = RelationTypeTable::default();
        assert_eq!(table.lookup(" I ").expect("upper i").name, "影响");
        assert!(table.lookup("x").is_none());
        assert!(table.lookup("").is_none());
    }

    #[test]
    fn rejects_case_insensitive_duplicate_abbreviations() {
        let err = RelationTypeTable::new(vec![
            RelationType::new("i", "影响", "", "", false),
            RelationType::new("I", "包含", "", "", false),
        ])
        .expect_err("duplicate must fail");
        assert_eq!(err, RelationTableError::DuplicateAbbreviation("I".to_string()));
    }

    #[test]
    fn rejects_multi_char_abbreviation_and_dash_in_name() {
        let err = RelationTypeTable::new(vec![RelationType::new("ab", "影响", "", "", false)])
            .expect_err("two chars must fail");
        assert!(matches!(err, RelationTableError::AbbreviationNotSingleChar(_)));

        let err = RelationTypeTable::new(vec![RelationType::new("i", "因-果", "", "", false)])
            .expect_err("dash must fail");
        assert!(matches!(err, RelationTableError::ReservedCharacter(_)));
    }

    #[test]
    fn rejects_empty_table() {
        let err = RelationTypeTable::new(Vec::new()).expect_err("empty must fail");
        assert_eq!(err, RelationTableError::Empty);
    }
}
