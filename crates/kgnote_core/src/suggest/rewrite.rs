//! Applies an accepted candidate back into the query text.
//!
//! # Invariants
//! - A type selection restarts the query as `{abbreviation}；`.
//! - A concept selection replaces only the partial token of the active group;
//!   every other character, separators included, is kept verbatim.
//! - Reapplying the same candidate to the output yields the same output.

use super::candidate::Candidate;
use crate::query::tokenizer::RelationQuery;
use crate::query::{CANONICAL_STAGE_SEPARATOR, TRIGGER_MARKER};

/// Rewritten session text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewrite {
    /// New query, without the trigger marker.
    pub query: String,
    /// Text that replaces the whole trigger span, marker included.
    pub text: String,
    /// Cursor offset in chars from the start of the trigger span.
    pub cursor: usize,
}

impl Rewrite {
    fn from_query(query: String) -> Self {
        let text = format!("{TRIGGER_MARKER}{query}");
        let cursor = text.chars().count();
        Self {
            query,
            text,
            cursor,
        }
    }
}

/// Applies `candidate` to `query`.
///
/// Returns `None` for `Final` candidates (those end the session instead) and
/// for concept candidates while no group is active.
pub fn apply(query: &RelationQuery, candidate: &Candidate) -> Option<Rewrite> {
    match candidate {
        Candidate::Type { abbreviation, .. } => Some(Rewrite::from_query(format!(
            "{abbreviation}{CANONICAL_STAGE_SEPARATOR}"
        ))),
        Candidate::Concept { note_title } => {
            let span = query.partial_token_span()?;
            let raw = query.raw();
            let rewritten = format!("{}{}{}", &raw[..span.start], note_title, &raw[span.end..]);
            Some(Rewrite::from_query(rewritten))
        }
        Candidate::Final { .. } => None,
    }
}
