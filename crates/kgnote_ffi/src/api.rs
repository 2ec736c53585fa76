//! FFI use-case API for the editor's quick-create suggester.
//!
//! # Responsibility
//! - Expose trigger detection, candidate listing and candidate acceptance to
//!   Dart via FRB.
//! - Translate core results into flat, stable response envelopes.
//!
//! # Invariants
//! - Exported functions must not panic across the FFI boundary.
//! - Settings arrive as JSON on every call; blank JSON means defaults.
//! - Notes are read from and written to the SQLite store at
//!   `KGNOTE_DB_PATH` (temp dir fallback).

use kgnote_core::db::open_db;
use kgnote_core::suggest::candidate::final_candidate;
use kgnote_core::{
    core_version as core_version_inner, detect_trigger, generate_candidates,
    init_logging as init_logging_inner, infer_stage, ping as ping_inner, transition, Candidate,
    KgSettings, NoteRepository, RelationNoteRequest, RelationNoteService, RelationQuery,
    SessionEffect, SessionEvent, SessionState, SqliteNoteRepository, Stage, TriggerSpan,
};
use log::warn;
use std::path::PathBuf;
use std::sync::OnceLock;

const DB_FILE_NAME: &str = "kgnote.sqlite3";
static DB_PATH: OnceLock<PathBuf> = OnceLock::new();

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir`.
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// Active `@@` span on the cursor line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerItem {
    pub line: u32,
    /// Char offset of the `@@` marker.
    pub start_ch: u32,
    /// Cursor char offset.
    pub end_ch: u32,
    /// Query text after the marker.
    pub query: String,
    /// `selecting_relation_type|entering_head|entering_tail`.
    pub stage: String,
}

/// One completion row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateItem {
    /// `type|concept|final`.
    pub kind: String,
    /// Display text.
    pub label: String,
    /// Value sent back to `quick_create_accept`.
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidatesResponse {
    pub ok: bool,
    pub stage: String,
    pub items: Vec<CandidateItem>,
    pub message: String,
}

/// What the editor must do after an accept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptResponse {
    pub ok: bool,
    /// `rewrite` (keep session open), `link` (close session) or `none`.
    pub action: String,
    /// Replacement for the whole trigger span.
    pub text: String,
    /// Cursor char offset from the start of the span.
    pub cursor: u32,
    pub message: String,
}

impl AcceptResponse {
    fn rewrite(text: String, cursor: usize) -> Self {
        Self {
            ok: true,
            action: "rewrite".to_string(),
            cursor: to_u32(cursor),
            text,
            message: String::new(),
        }
    }

    fn link(text: String, message: String) -> Self {
        Self {
            ok: true,
            action: "link".to_string(),
            cursor: to_u32(text.chars().count()),
            text,
            message,
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            action: "none".to_string(),
            text: String::new(),
            cursor: 0,
            message: message.into(),
        }
    }
}

/// Detects the `@@` trigger in `line_text` before char offset `ch`.
///
/// # FFI contract
/// - Sync call, pure.
/// - Returns `None` when no marker precedes the cursor.
#[flutter_rust_bridge::frb(sync)]
pub fn quick_create_trigger(line_text: String, line: u32, ch: u32) -> Option<TriggerItem> {
    let before_cursor: String = line_text.chars().take(ch as usize).collect();
    let span = detect_trigger(&before_cursor, line)?;
    Some(TriggerItem {
        line: span.line,
        start_ch: to_u32(span.start_ch),
        end_ch: to_u32(span.end_ch),
        stage: stage_label(infer_stage(&span.query)).to_string(),
        query: span.query,
    })
}

/// Lists candidates for `query` (text after `@@`).
///
/// # FFI contract
/// - Sync call; reads note titles from the store.
/// - A store failure still returns type candidates, with a message.
#[flutter_rust_bridge::frb(sync)]
pub fn quick_create_candidates(query: String, settings_json: String) -> CandidatesResponse {
    let parsed = RelationQuery::parse(query);
    let stage = stage_label(parsed.stage()).to_string();
    let settings = match KgSettings::from_json_str(&settings_json) {
        Ok(settings) => settings,
        Err(err) => {
            return CandidatesResponse {
                ok: false,
                stage,
                items: Vec::new(),
                message: format!("quick_create_candidates failed: {err}"),
            }
        }
    };

    let (titles, message) = if parsed.stage() == Stage::SelectingRelationType {
        (Vec::new(), String::new())
    } else {
        match load_titles() {
            Ok(titles) => (titles, String::new()),
            Err(err) => {
                warn!("event=ffi_candidates module=ffi status=degraded error_code=titles_unavailable");
                (Vec::new(), format!("note titles unavailable: {err}"))
            }
        }
    };

    let items = generate_candidates(&parsed, &titles, &settings.relation_types)
        .into_iter()
        .map(to_candidate_item)
        .collect();
    CandidatesResponse {
        ok: true,
        stage,
        items,
        message,
    }
}

/// Applies an accepted candidate.
///
/// `kind`/`value` come from a `CandidateItem`. A `final` accept runs the
/// relation note pipeline and returns the link text; other kinds return the
/// rewritten span text.
///
/// # FFI contract
/// - Sync call; `final` accepts write to the store.
/// - Never panics; failures come back with `ok=false`.
#[flutter_rust_bridge::frb(sync)]
pub fn quick_create_accept(
    query: String,
    kind: String,
    value: String,
    settings_json: String,
    active_note_path: Option<String>,
) -> AcceptResponse {
    let settings = match KgSettings::from_json_str(&settings_json) {
        Ok(settings) => settings,
        Err(err) => return AcceptResponse::failure(format!("quick_create_accept failed: {err}")),
    };
    let parsed = RelationQuery::parse(query);

    let candidate = match kind.trim() {
        "type" => match settings.relation_types.lookup(&value) {
            Some(relation) => Candidate::Type {
                abbreviation: relation.abbreviation.clone(),
                canonical_name: relation.name.clone(),
            },
            None => return AcceptResponse::failure(format!("unknown relation type `{value}`")),
        },
        "concept" => Candidate::Concept { note_title: value },
        // Title is recomputed from the query; `value` is ignored.
        "final" => match final_candidate(&parsed, &settings.relation_types) {
            Some(candidate) => candidate,
            None => return AcceptResponse::failure("query is not a complete relation"),
        },
        other => return AcceptResponse::failure(format!("unknown candidate kind `{other}`")),
    };

    let span = TriggerSpan {
        line: 0,
        start_ch: 0,
        end_ch: parsed.raw().chars().count(),
        query: parsed.raw().to_string(),
    };
    let (state, _) = transition(&SessionState::Closed, SessionEvent::Input(Some(span)));
    match transition(&state, SessionEvent::Accept(candidate)) {
        (_, SessionEffect::Rewrite { rewrite, .. }) => {
            AcceptResponse::rewrite(rewrite.text, rewrite.cursor)
        }
        (
            _,
            SessionEffect::CreateRelationNote {
                title,
                relation_name,
                head,
                tail,
                ..
            },
        ) => {
            let request = RelationNoteRequest {
                title,
                relation_name,
                head,
                tail,
            };
            create_relation_note(&request, &settings, active_note_path.as_deref())
        }
        (_, SessionEffect::None) => {
            AcceptResponse::failure("candidate does not apply at this stage")
        }
    }
}

fn create_relation_note(
    request: &RelationNoteRequest,
    settings: &KgSettings,
    active_note_path: Option<&str>,
) -> AcceptResponse {
    let db_path = resolve_db_path();
    let mut conn = match open_db(&db_path) {
        Ok(conn) => conn,
        Err(err) => return AcceptResponse::failure(format!("note store open failed: {err}")),
    };
    let repo = SqliteNoteRepository::new(&mut conn);
    let mut service = RelationNoteService::new(repo, settings);
    match service.create_from_final(request, active_note_path) {
        Ok(report) => {
            let message = if report.created {
                format!(
                    "created; backlinks={} failed={}",
                    report.backlinks.len(),
                    report.failed_backlinks()
                )
            } else {
                "note already exists".to_string()
            };
            AcceptResponse::link(report.link_text, message)
        }
        Err(err) => AcceptResponse::failure(format!("quick_create_accept failed: {err}")),
    }
}

fn load_titles() -> Result<Vec<String>, String> {
    let db_path = resolve_db_path();
    let mut conn = open_db(&db_path).map_err(|err| err.to_string())?;
    let repo = SqliteNoteRepository::new(&mut conn);
    repo.list_titles().map_err(|err| err.to_string())
}

fn resolve_db_path() -> PathBuf {
    DB_PATH
        .get_or_init(|| {
            if let Ok(raw) = std::env::var("KGNOTE_DB_PATH") {
                let trimmed = raw.trim();
                if !trimmed.is_empty() {
                    return PathBuf::from(trimmed);
                }
            }
            std::env::temp_dir().join(DB_FILE_NAME)
        })
        .clone()
}

fn to_candidate_item(candidate: Candidate) -> CandidateItem {
    let label = candidate.label();
    let (kind, value) = match candidate {
        Candidate::Type { abbreviation, .. } => ("type", abbreviation),
        Candidate::Concept { note_title } => ("concept", note_title),
        Candidate::Final {
            synthesized_title, ..
        } => ("final", synthesized_title),
    };
    CandidateItem {
        kind: kind.to_string(),
        label,
        value,
    }
}

fn stage_label(stage: Stage) -> &'static str {
    match stage {
        Stage::SelectingRelationType => "selecting_relation_type",
        Stage::EnteringHead => "entering_head",
        Stage::EnteringTail => "entering_tail",
    }
}

fn to_u32(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}
