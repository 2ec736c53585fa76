//! Relation query mini-language.
//!
//! A quick-create session starts at the trigger marker and reads the rest of
//! the line as `{type}{stage}{head items}{stage}{tail items}`, for example
//! `@@i；地球，月球；太阳`.
//!
//! # Responsibility
//! - Define the fixed separator alphabet of the grammar.
//! - Tokenize raw queries and infer the grammar stage from them.
//!
//! # Invariants
//! - Parsing never fails; malformed input degrades to fewer tokens.
//! - Stage is always derived from the raw string, never stored.

pub mod stage;
pub mod tokenizer;

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Two-character sequence that opens a quick-create session.
pub const TRIGGER_MARKER: &str = "@@";

/// Characters separating the relation type, head group and tail group.
pub const STAGE_SEPARATORS: [char; 2] = [';', '；'];

/// Characters separating concept tokens inside one group.
pub const ITEM_SEPARATORS: [char; 3] = ['_', '，', ','];

/// Stage separator written by the rewriter after a type selection.
pub const CANONICAL_STAGE_SEPARATOR: char = '；';

/// Item separator used when joining concepts into a title.
pub const CANONICAL_ITEM_SEPARATOR: &str = "_";

pub fn is_stage_separator(c: char) -> bool {
    STAGE_SEPARATORS.contains(&c)
}

pub fn is_item_separator(c: char) -> bool {
    ITEM_SEPARATORS.contains(&c)
}

/// Query-level failure raised when a parse cannot be synthesized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// Relation abbreviation is unknown or the head group is empty.
    InvalidQuery { query: String, message: String },
}

impl QueryError {
    pub(crate) fn invalid(query: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidQuery {
            query: query.into(),
            message: message.into(),
        }
    }
}

impl Display for QueryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidQuery { query, message } => {
                write!(f, "invalid relation query `{query}`: {message}")
            }
        }
    }
}

impl Error for QueryError {}
