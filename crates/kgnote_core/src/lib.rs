//! Core logic for kgnote, a knowledge-graph note assistant.
//!
//! Covers the `@@` quick-create grammar, candidate suggestion, relation title
//! and frontmatter synthesis, and the note commands built on top of a
//! `NoteRepository`. UI hosts talk to this crate through `kgnote_ffi`.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod query;
pub mod repo;
pub mod service;
pub mod suggest;
pub mod synth;

pub use config::{InheritanceMode, KgSettings, LocationMode, SettingsError};
pub use db::{open_db, open_db_in_memory, DbError};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::note::{NoteKind, NoteRecord};
pub use model::relation::{RelationTableError, RelationType, RelationTypeTable};
pub use query::stage::{infer_stage, Stage};
pub use query::tokenizer::RelationQuery;
pub use query::QueryError;
pub use repo::{NoteRepository, RepoError, RepoResult, SqliteNoteRepository};
pub use service::note_service::{
    CreateOrLinkOutcome, InheritOutcome, NoteService, ReverseAliasOutcome, TemplateOutcome,
};
pub use service::relation_service::{
    BacklinkResult, BacklinkStatus, ConceptSide, PipelineNotice, RelationNoteReport,
    RelationNoteRequest, RelationNoteService,
};
pub use service::title_service::{
    TitleOutcome, TitlePrompt, TitleService, TitleSuggestion, TitleSuggestionProvider,
};
pub use service::{generate_uid, resolve_creation_folder, ServiceError};
pub use suggest::candidate::{generate as generate_candidates, Candidate};
pub use suggest::rewrite::{apply as apply_candidate, Rewrite};
pub use suggest::session::{
    detect_trigger, transition, SessionEffect, SessionEvent, SessionState, TriggerSpan,
};
pub use synth::frontmatter::{build_frontmatter, FrontmatterDocument, FrontmatterValue};
pub use synth::title::{synthesize, SynthesizedTitle};
pub use synth::yaml_edit::FrontmatterError;

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
