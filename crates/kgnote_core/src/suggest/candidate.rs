//! Completion candidate generation.
//!
//! # Invariants
//! - Output depends only on the query, the supplied titles and the table.
//! - At most one `Final` candidate is produced, always first, and only when
//!   both head and tail groups are non-empty.
//! - No concept or final candidates while the relation type is being chosen.

use crate::model::relation::RelationTypeTable;
use crate::query::stage::Stage;
use crate::query::tokenizer::RelationQuery;
use crate::synth::title::synthesize_query;
use serde::{Deserialize, Serialize};

/// Upper bound on concept candidates per keystroke.
pub const MAX_CONCEPT_CANDIDATES: usize = 10;

/// One completion offered to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Candidate {
    Type {
        abbreviation: String,
        canonical_name: String,
    },
    Concept {
        note_title: String,
    },
    Final {
        synthesized_title: String,
        relation_name: String,
        head: Vec<String>,
        tail: Vec<String>,
    },
}

impl Candidate {
    /// Text shown in the completion list.
    pub fn label(&self) -> String {
        match self {
            Self::Type {
                abbreviation,
                canonical_name,
            } => format!("{abbreviation}: {canonical_name}"),
            Self::Concept { note_title } => note_title.clone(),
            Self::Final {
                synthesized_title, ..
            } => format!("创建笔记: {synthesized_title}"),
        }
    }

    pub fn is_final(&self) -> bool {
        matches!(self, Self::Final { .. })
    }
}

/// Generates ordered candidates for the current query.
pub fn generate(
    query: &RelationQuery,
    known_titles: &[String],
    table: &RelationTypeTable,
) -> Vec<Candidate> {
    let mut candidates = Vec::new();
    if let Some(final_candidate) = final_candidate(query, table) {
        candidates.push(final_candidate);
    }

    match query.stage() {
        Stage::SelectingRelationType => candidates.extend(type_candidates(query, table)),
        Stage::EnteringHead | Stage::EnteringTail => {
            candidates.extend(concept_candidates(query.partial_token(), known_titles))
        }
    }
    candidates
}

/// Builds the terminal candidate when the query forms a complete triple.
pub fn final_candidate(query: &RelationQuery, table: &RelationTypeTable) -> Option<Candidate> {
    if !query.is_complete() {
        return None;
    }
    let synthesized = synthesize_query(query, table).ok()?;
    Some(Candidate::Final {
        synthesized_title: synthesized.title,
        relation_name: synthesized.relation_name,
        head: synthesized.head,
        tail: synthesized.tail,
    })
}

fn type_candidates(query: &RelationQuery, table: &RelationTypeTable) -> Vec<Candidate> {
    let prefix = query.type_prefix().to_lowercase();
    let matches_prefix = |value: &str| value.to_lowercase().starts_with(prefix.as_str());

    let mut matched: Vec<_> = table
        .entries()
        .iter()
        .filter(|entry| matches_prefix(&entry.abbreviation) || matches_prefix(&entry.name))
        .collect();
    if prefix.is_empty() || matched.is_empty() {
        matched = table.entries().iter().collect();
    }

    matched
        .into_iter()
        .map(|entry| Candidate::Type {
            abbreviation: entry.abbreviation.clone(),
            canonical_name: entry.name.clone(),
        })
        .collect()
}

fn concept_candidates(partial: &str, known_titles: &[String]) -> Vec<Candidate> {
    let needle = partial.to_lowercase();
    known_titles
        .iter()
        .filter(|title| needle.is_empty() || title.to_lowercase().contains(needle.as_str()))
        .take(MAX_CONCEPT_CANDIDATES)
        .map(|title| Candidate::Concept {
            note_title: title.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{generate, Candidate, MAX_CONCEPT_CANDIDATES};
    use crate::model::relation::RelationTypeTable;
    use crate::query::tokenizer::RelationQuery;
    use crate::synth::title::synthesize_query;

    fn titles(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    fn type_abbreviations(candidates: &[Candidate]) -> Vec<&str> {
        candidates
            .iter()
            .filter_map(|candidate| match candidate {
                Candidate::Type { abbreviation, .. } => Some(abbreviation.as_str()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn type_stage_filters_by_abbreviation_or_name_prefix() {
        let table = RelationTypeTable::default();
        let known = titles(&["地球"]);

        let by_abbreviation = generate(&RelationQuery::parse("A"), &known, &table);
        assert_eq!(type_abbreviations(&by_abbreviation), vec!["a"]);

        let by_name = generate(&RelationQuery::parse("对"), &known, &table);
        assert_eq!(type_abbreviations(&by_name), vec!["c"]);
    }

    #[test]
    fn type_stage_falls_back_to_full_table() {
        let table = RelationTypeTable::default();
        for raw in ["", "zz"] {
            let candidates = generate(&RelationQuery::parse(raw), &titles(&["地球"]), &table);
            assert_eq!(type_abbreviations(&candidates), vec!["i", "c", "a", "u"]);
            assert!(candidates
                .iter()
                .all(|candidate| matches!(candidate, Candidate::Type { .. })));
        }
    }

    #[test]
    fn concept_stage_matches_substring_case_insensitively_and_caps() {
        let table = RelationTypeTable::default();
        let known = titles(&["Rust Language", "trust", "Go", "地球"]);
        let candidates = generate(&RelationQuery::parse("i；RUS"), &known, &table);
        assert_eq!(
            candidates,
            vec![
                Candidate::Concept {
                    note_title: "Rust Language".to_string()
                },
                Candidate::Concept {
                    note_title: "trust".to_string()
                },
            ]
        );

        let many: Vec<String> = (0..25).map(|index| format!("note {index}")).collect();
        let capped = generate(&RelationQuery::parse("i；"), &many, &table);
        assert_eq!(capped.len(), MAX_CONCEPT_CANDIDATES);
    }

    #[test]
    fn complete_query_offers_exactly_one_final_first() {
        let table = RelationTypeTable::default();
        let query = RelationQuery::parse("a；猫；狗");
        let candidates = generate(&query, &titles(&["狗", "狗狗", "猫"]), &table);
        let finals: Vec<_> = candidates.iter().filter(|c| c.is_final()).collect();
        assert_eq!(finals.len(), 1);
        assert!(candidates[0].is_final());

        let expected = synthesize_query(&query, &table).expect("valid");
        match &candidates[0] {
            Candidate::Final {
                synthesized_title, ..
            } => assert_eq!(synthesized_title, &expected.title),
            other => panic!("unexpected first candidate: {other:?}"),
        }
        assert_eq!(candidates[0].label(), "创建笔记: 猫-关联-狗");
    }

    #[test]
    fn no_final_without_tail_or_with_unknown_type() {
        let table = RelationTypeTable::default();
        let known = titles(&["A", "B"]);
        for raw in ["i；A；", "i；A", "x；A；B"] {
            let candidates = generate(&RelationQuery::parse(raw), &known, &table);
            assert!(
                candidates.iter().all(|candidate| !candidate.is_final()),
                "{raw}"
            );
        }
    }
}
