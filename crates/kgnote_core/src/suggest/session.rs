//! Quick-create suggester session state machine.
//!
//! ```text
//! Closed -> Open(SelectingRelationType) -> Open(EnteringHead)
//!        -> Open(EnteringTail) -> Closed (Final accepted)
//! ```
//!
//! # Invariants
//! - Transitions are synchronous and pure; the only side effect they can
//!   request is `SessionEffect::CreateRelationNote`.
//! - The open stage is always re-derived from the span's query text.
//! - Losing the trigger marker or cancelling closes with no effect.

use super::candidate::{generate, Candidate};
use super::rewrite::{apply, Rewrite};
use crate::model::relation::RelationTypeTable;
use crate::query::stage::{infer_stage, Stage};
use crate::query::tokenizer::RelationQuery;
use crate::query::TRIGGER_MARKER;

/// Active trigger span on one editor line. Offsets are in chars.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerSpan {
    pub line: u32,
    /// Offset of the trigger marker.
    pub start_ch: usize,
    /// Cursor offset; end of the span.
    pub end_ch: usize,
    /// Text between the marker and the cursor.
    pub query: String,
}

impl TriggerSpan {
    pub fn parse_query(&self) -> RelationQuery {
        RelationQuery::parse(self.query.as_str())
    }
}

/// Finds the last trigger marker before the cursor.
///
/// `line_before_cursor` is the editor line truncated at the cursor.
pub fn detect_trigger(line_before_cursor: &str, line: u32) -> Option<TriggerSpan> {
    let marker_at = line_before_cursor.rfind(TRIGGER_MARKER)?;
    let query = &line_before_cursor[marker_at + TRIGGER_MARKER.len()..];
    Some(TriggerSpan {
        line,
        start_ch: line_before_cursor[..marker_at].chars().count(),
        end_ch: line_before_cursor.chars().count(),
        query: query.to_string(),
    })
}

/// Suggester session state.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Closed,
    Open { span: TriggerSpan, stage: Stage },
}

impl SessionState {
    fn open(span: TriggerSpan) -> Self {
        let stage = infer_stage(&span.query);
        Self::Open { span, stage }
    }

    pub fn is_open(&self) -> bool {
        matches!(self, Self::Open { .. })
    }

    pub fn stage(&self) -> Option<Stage> {
        match self {
            Self::Closed => None,
            Self::Open { stage, .. } => Some(*stage),
        }
    }

    /// Candidates for the open span; empty while closed.
    pub fn candidates(&self, known_titles: &[String], table: &RelationTypeTable) -> Vec<Candidate> {
        match self {
            Self::Closed => Vec::new(),
            Self::Open { span, .. } => generate(&span.parse_query(), known_titles, table),
        }
    }
}

/// Input to the session state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Editor changed; carries the result of [`detect_trigger`].
    Input(Option<TriggerSpan>),
    /// User accepted a candidate.
    Accept(Candidate),
    /// User dismissed the suggester.
    Cancel,
}

/// Work requested by a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEffect {
    None,
    /// Replace `span` in the editor with `rewrite.text`.
    Rewrite { span: TriggerSpan, rewrite: Rewrite },
    /// Create the relation note, then replace `span` with its link.
    CreateRelationNote {
        span: TriggerSpan,
        title: String,
        relation_name: String,
        head: Vec<String>,
        tail: Vec<String>,
    },
}

/// Computes the next state and the effect to perform.
pub fn transition(state: &SessionState, event: SessionEvent) -> (SessionState, SessionEffect) {
    match (state, event) {
        (_, SessionEvent::Cancel) | (_, SessionEvent::Input(None)) => {
            (SessionState::Closed, SessionEffect::None)
        }
        (_, SessionEvent::Input(Some(span))) => (SessionState::open(span), SessionEffect::None),
        (SessionState::Closed, SessionEvent::Accept(_)) => {
            (SessionState::Closed, SessionEffect::None)
        }
        (SessionState::Open { span, .. }, SessionEvent::Accept(candidate)) => {
            accept(span, candidate)
        }
    }
}

fn accept(span: &TriggerSpan, candidate: Candidate) -> (SessionState, SessionEffect) {
    if let Candidate::Final {
        synthesized_title,
        relation_name,
        head,
        tail,
    } = candidate
    {
        return (
            SessionState::Closed,
            SessionEffect::CreateRelationNote {
                span: span.clone(),
                title: synthesized_title,
                relation_name,
                head,
                tail,
            },
        );
    }

    let Some(rewrite) = apply(&span.parse_query(), &candidate) else {
        return (SessionState::open(span.clone()), SessionEffect::None);
    };
    let next_span = TriggerSpan {
        line: span.line,
        start_ch: span.start_ch,
        end_ch: span.start_ch + rewrite.cursor,
        query: rewrite.query.clone(),
    };
    (
        SessionState::open(next_span),
        SessionEffect::Rewrite {
            span: span.clone(),
            rewrite,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::{detect_trigger, transition, SessionEffect, SessionEvent, SessionState};
    use crate::model::relation::RelationTypeTable;
    use crate::query::stage::Stage;
    use crate::suggest::candidate::Candidate;

    #[test]
    fn detects_last_marker_before_cursor() {
        let span = detect_trigger("前文 @@x @@i；地球", 3).expect("marker present");
        assert_eq!(span.line, 3);
        assert_eq!(span.start_ch, 7);
        assert_eq!(span.end_ch, 13);
        assert_eq!(span.query, "i；地球");
        assert!(detect_trigger("no marker @ here", 0).is_none());
    }

    #[test]
    fn walks_through_all_stages_to_final() {
        let table = RelationTypeTable::default();
        let titles = vec!["地球".to_string(), "太阳".to_string()];

        let (state, effect) =
            transition(&SessionState::Closed, SessionEvent::Input(detect_trigger("@@", 0)));
        assert_eq!(effect, SessionEffect::None);
        assert_eq!(state.stage(), Some(Stage::SelectingRelationType));

        let influence = state
            .candidates(&titles, &table)
            .into_iter()
            .find(|c| matches!(c, Candidate::Type { abbreviation, .. } if abbreviation == "i"))
            .expect("i offered");
        let (state, effect) = transition(&state, SessionEvent::Accept(influence));
        assert_eq!(state.stage(), Some(Stage::EnteringHead));
        let SessionEffect::Rewrite { rewrite, .. } = effect else {
            panic!("type selection rewrites");
        };
        assert_eq!(rewrite.text, "@@i；");

        let (state, _) = transition(
            &state,
            SessionEvent::Input(detect_trigger("@@i；地球；太", 0)),
        );
        assert_eq!(state.stage(), Some(Stage::EnteringTail));
        let concepts: Vec<Candidate> = state
            .candidates(&titles, &table)
            .into_iter()
            .filter(|candidate| !candidate.is_final())
            .collect();
        assert_eq!(
            concepts,
            vec![Candidate::Concept {
                note_title: "太阳".to_string()
            }]
        );

        let (state, effect) = transition(&state, SessionEvent::Accept(concepts[0].clone()));
        let SessionEffect::Rewrite { rewrite, .. } = effect else {
            panic!("concept selection rewrites");
        };
        assert_eq!(rewrite.text, "@@i；地球；太阳");

        let final_candidate = state.candidates(&titles, &table).remove(0);
        assert!(final_candidate.is_final());
        let (state, effect) = transition(&state, SessionEvent::Accept(final_candidate));
        assert_eq!(state, SessionState::Closed);
        match effect {
            SessionEffect::CreateRelationNote { title, head, tail, .. } => {
                assert_eq!(title, "地球-影响-太阳");
                assert_eq!(head, vec!["地球".to_string()]);
                assert_eq!(tail, vec!["太阳".to_string()]);
            }
            other => panic!("unexpected effect: {other:?}"),
        }
    }

    #[test]
    fn cancel_or_lost_trigger_closes_without_effect() {
        let (open, _) =
            transition(&SessionState::Closed, SessionEvent::Input(detect_trigger("@@a；猫", 0)));
        assert!(open.is_open());

        assert_eq!(
            transition(&open, SessionEvent::Cancel),
            (SessionState::Closed, SessionEffect::None)
        );
        assert_eq!(
            transition(&open, SessionEvent::Input(None)),
            (SessionState::Closed, SessionEffect::None)
        );
    }

    #[test]
    fn editing_backwards_reopens_at_earlier_stage() {
        let (state, _) = transition(
            &SessionState::Closed,
            SessionEvent::Input(detect_trigger("@@a；猫；狗", 0)),
        );
        assert_eq!(state.stage(), Some(Stage::EnteringTail));
        let (state, _) = transition(&state, SessionEvent::Input(detect_trigger("@@a；猫", 0)));
        assert_eq!(state.stage(), Some(Stage::EnteringHead));
    }

    #[test]
    fn accept_while_closed_is_ignored() {
        let candidate = Candidate::Concept {
            note_title: "猫".to_string(),
        };
        assert_eq!(
            transition(&SessionState::Closed, SessionEvent::Accept(candidate)),
            (SessionState::Closed, SessionEffect::None)
        );
    }
}
