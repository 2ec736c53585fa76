//! Note store contracts and the SQLite reference implementation.
//!
//! # Responsibility
//! - Define the store collaborator the services orchestrate.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Paths are vault-relative and normalized before any lookup.
//! - `aliases` on a returned record always mirror the stored frontmatter.
//! - Repository APIs return semantic errors (`NotFound`, `AlreadyExists`) in
//!   addition to DB transport errors.

use crate::db::DbError;
use crate::model::note::NoteRecord;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod note_repo;

pub use note_repo::SqliteNoteRepository;

pub type RepoResult<T> = Result<T, RepoError>;

/// Store error shared by every repository implementation.
#[derive(Debug)]
pub enum RepoError {
    /// Template path does not resolve to a note.
    TemplateNotFound(String),
    /// Target path is already taken.
    AlreadyExists(String),
    NotFound(String),
    /// Path is empty or does not end in `.md`.
    InvalidPath(String),
    Db(DbError),
}

impl RepoError {
    /// Stable code for log lines; never carries paths or titles.
    pub fn code(&self) -> &'static str {
        match self {
            Self::TemplateNotFound(_) => "template_not_found",
            Self::AlreadyExists(_) => "already_exists",
            Self::NotFound(_) => "not_found",
            Self::InvalidPath(_) => "invalid_path",
            Self::Db(_) => "db_error",
        }
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TemplateNotFound(path) => write!(f, "template not found: {path}"),
            Self::AlreadyExists(path) => write!(f, "note already exists: {path}"),
            Self::NotFound(path) => write!(f, "note not found: {path}"),
            Self::InvalidPath(path) => write!(f, "invalid note path: `{path}`"),
            Self::Db(err) => write!(f, "{err}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Store collaborator used by the note services.
pub trait NoteRepository {
    /// Reads template text stored at `path`.
    fn read_template(&self, path: &str) -> RepoResult<String>;
    fn get_note(&self, path: &str) -> RepoResult<Option<NoteRecord>>;
    /// Finds a note whose title or one of whose aliases equals `name`,
    /// ignoring case. Title matches win over alias matches.
    fn find_by_title_or_alias(&self, name: &str) -> RepoResult<Option<NoteRecord>>;
    /// All note titles, most recently updated first.
    fn list_titles(&self) -> RepoResult<Vec<String>>;
    fn create_note(&mut self, path: &str, content: &str) -> RepoResult<NoteRecord>;
    /// Replaces full note content.
    fn modify_note(&mut self, path: &str, content: &str) -> RepoResult<()>;
    fn rename_note(&mut self, from: &str, to: &str) -> RepoResult<NoteRecord>;
}

impl<R: NoteRepository + ?Sized> NoteRepository for &mut R {
    fn read_template(&self, path: &str) -> RepoResult<String> {
        (**self).read_template(path)
    }

    fn get_note(&self, path: &str) -> RepoResult<Option<NoteRecord>> {
        (**self).get_note(path)
    }

    fn find_by_title_or_alias(&self, name: &str) -> RepoResult<Option<NoteRecord>> {
        (**self).find_by_title_or_alias(name)
    }

    fn list_titles(&self) -> RepoResult<Vec<String>> {
        (**self).list_titles()
    }

    fn create_note(&mut self, path: &str, content: &str) -> RepoResult<NoteRecord> {
        (**self).create_note(path, content)
    }

    fn modify_note(&mut self, path: &str, content: &str) -> RepoResult<()> {
        (**self).modify_note(path, content)
    }

    fn rename_note(&mut self, from: &str, to: &str) -> RepoResult<NoteRecord> {
        (**self).rename_note(from, to)
    }
}

#[cfg(test)]
mod tests {
    use super::RepoError;
    use crate::db::DbError;

    #[test]
    fn codes_omit_paths() {
        let errors = [
            RepoError::TemplateNotFound("模板/秘密.md".to_string()),
            RepoError::AlreadyExists("秘密.md".to_string()),
            RepoError::NotFound("秘密.md".to_string()),
            RepoError::InvalidPath("秘密".to_string()),
            RepoError::Db(DbError::Sqlite(rusqlite::Error::InvalidQuery)),
        ];
        let codes: Vec<_> = errors.iter().map(RepoError::code).collect();
        assert_eq!(
            codes,
            vec![
                "template_not_found",
                "already_exists",
                "not_found",
                "invalid_path",
                "db_error"
            ]
        );
        assert!(errors.iter().all(|err| err.to_string().contains("秘密")));
        assert!(codes.iter().all(|code| !code.contains("秘密")));
    }
}
