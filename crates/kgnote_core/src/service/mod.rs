//! Note use-case services.
//!
//! # Responsibility
//! - Orchestrate store calls into command-level APIs.
//! - Keep FFI and CLI layers decoupled from storage details.
//! - Own helpers shared by every command: uid, folder resolution, templates.
//!
//! # Invariants
//! - Services never panic; every failure surfaces as `ServiceError`.
//! - Settings are passed in explicitly; services hold no global state.

use crate::config::{LocationMode, SettingsError};
use crate::model::note::{normalize_note_path, parent_folder, NoteKind};
use crate::query::QueryError;
use crate::repo::RepoError;
use crate::synth::yaml_edit::FrontmatterError;
use chrono::{DateTime, Local};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod note_service;
pub mod relation_service;
pub mod title_service;

/// Time source for uid and untitled-note names.
pub type Clock = fn() -> DateTime<Local>;

/// Current local time.
pub fn system_clock() -> DateTime<Local> {
    Local::now()
}

/// Formats a creation timestamp as a `YYYYMMDDHHmmss` uid.
pub fn generate_uid(now: DateTime<Local>) -> String {
    now.format("%Y%m%d%H%M%S").to_string()
}

/// Title for notes created without a selection, e.g. `未命名概念 2024-05-01 093000`.
pub fn untitled_note_title(kind: NoteKind, now: DateTime<Local>) -> String {
    format!(
        "未命名{} {}",
        kind.display_name(),
        now.format("%Y-%m-%d %H%M%S")
    )
}

/// Resolves the vault folder new notes are created in.
///
/// Returns `/` for the vault root, otherwise a folder path without leading
/// or trailing slashes.
pub fn resolve_creation_folder(
    mode: LocationMode,
    default_folder: &str,
    active_note_path: Option<&str>,
) -> String {
    let folder = match mode {
        LocationMode::Fixed => default_folder.trim().to_string(),
        LocationMode::Current => active_note_path
            .map(normalize_note_path)
            .filter(|path| !path.is_empty())
            .map(|path| parent_folder(&path).to_string())
            .unwrap_or_default(),
    };
    let folder = folder.trim_matches('/');
    if folder.is_empty() {
        "/".to_string()
    } else {
        folder.to_string()
    }
}

/// Default template body for both note kinds.
pub fn default_template_content(parent_key: &str) -> String {
    format!(
        "---\nuid: \naliases: []\ntype: \n{parent_key}:\npublish: true\n---\n\n# 概述\n\n# 关系\n\n# 对比\n\n# 应用\n"
    )
}

/// Error returned by every service command.
#[derive(Debug)]
pub enum ServiceError {
    /// No template path configured for this note kind.
    TemplateNotConfigured(NoteKind),
    /// Title is empty after removing illegal file-name characters.
    EmptyTitle(String),
    NoteNotFound(String),
    /// Title suggestion provider failed or returned unusable output.
    Suggestion(String),
    InvalidQuery(QueryError),
    /// Stored note has unreadable frontmatter; nothing was written.
    Frontmatter {
        path: String,
        source: FrontmatterError,
    },
    Settings(SettingsError),
    Repo(RepoError),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TemplateNotConfigured(kind) => {
                write!(f, "no {} template path configured", kind.as_str())
            }
            Self::EmptyTitle(raw) => write!(f, "title `{raw}` is empty after sanitizing"),
            Self::NoteNotFound(path) => write!(f, "note not found: {path}"),
            Self::Suggestion(message) => write!(f, "title suggestion failed: {message}"),
            Self::InvalidQuery(err) => write!(f, "{err}"),
            Self::Frontmatter { path, source } => write!(f, "{path}: {source}"),
            Self::Settings(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidQuery(err) => Some(err),
            Self::Frontmatter { source, .. } => Some(source),
            Self::Settings(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(path) => Self::NoteNotFound(path),
            other => Self::Repo(other),
        }
    }
}

impl From<QueryError> for ServiceError {
    fn from(value: QueryError) -> Self {
        Self::InvalidQuery(value)
    }
}

impl From<SettingsError> for ServiceError {
    fn from(value: SettingsError) -> Self {
        Self::Settings(value)
    }
}
