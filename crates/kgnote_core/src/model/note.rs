//! Note domain model.
//!
//! # Responsibility
//! - Define the two note kinds of the knowledge graph.
//! - Provide path helpers shared by the store and services.
//!
//! # Invariants
//! - Stored paths never start with `/`.
//! - `title_from_path` and `join_note_path` are inverse for sanitized titles.

use serde::{Deserialize, Serialize};

/// File extension used for every vault note.
pub const NOTE_EXTENSION: &str = ".md";

/// Knowledge-graph note category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoteKind {
    /// A single concept, e.g. `地球`.
    Concept,
    /// A typed edge between concepts, e.g. `地球-影响-太阳`.
    Relation,
}

impl NoteKind {
    /// Value written to the frontmatter `type` key.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Concept => "concept",
            Self::Relation => "relation",
        }
    }

    /// Display word used when naming untitled notes.
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Concept => "概念",
            Self::Relation => "关系",
        }
    }
}

/// Read model returned by note store implementations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteRecord {
    /// Vault-relative path, e.g. `concepts/地球.md`.
    pub path: String,
    /// Basename without extension.
    pub title: String,
    /// Raw markdown source including frontmatter.
    pub content: String,
    /// Aliases projected from the frontmatter `aliases` key.
    pub aliases: Vec<String>,
    /// Update timestamp in epoch milliseconds.
    pub updated_at: i64,
}

impl NoteRecord {
    /// Wikilink text pointing at this note.
    pub fn link_text(&self) -> String {
        format!("[[{}]]", self.title)
    }

    /// Folder containing this note, `/` for the vault root.
    pub fn folder(&self) -> &str {
        parent_folder(&self.path)
    }
}

/// Normalizes a vault path: trims whitespace and leading slashes.
pub fn normalize_note_path(path: &str) -> String {
    path.trim().trim_start_matches('/').to_string()
}

/// Returns the note title encoded by a vault path.
pub fn title_from_path(path: &str) -> &str {
    let file_name = path.rsplit('/').next().unwrap_or(path);
    file_name
        .strip_suffix(NOTE_EXTENSION)
        .unwrap_or(file_name)
}

/// Returns the parent folder of a vault path, `/` for root-level notes.
pub fn parent_folder(path: &str) -> &str {
    let normalized = path.trim_start_matches('/');
    match normalized.rfind('/') {
        Some(0) | None => "/",
        Some(index) => &normalized[..index],
    }
}

/// Builds `{folder}/{title}.md`, omitting the folder for the vault root.
pub fn join_note_path(folder: &str, title: &str) -> String {
    let folder = folder.trim().trim_matches('/');
    if folder.is_empty() {
        format!("{title}{NOTE_EXTENSION}")
    } else {
        format!("{folder}/{title}{NOTE_EXTENSION}")
    }
}
