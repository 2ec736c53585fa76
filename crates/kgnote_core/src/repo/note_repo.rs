//! SQLite-backed note store.
//!
//! # Responsibility
//! - Persist markdown notes keyed by vault path.
//! - Project frontmatter `aliases` into `note_aliases` on every write.
//!
//! # Invariants
//! - Every write and its alias projection commit in one transaction.
//! - Title lookups are case-insensitive; titles win over aliases.
//! - Title lists are sorted by `updated_at DESC, path ASC`.

use super::{NoteRepository, RepoError, RepoResult};
use crate::model::note::{normalize_note_path, title_from_path, NoteRecord, NOTE_EXTENSION};
use crate::synth::frontmatter::FrontmatterDocument;
use crate::synth::yaml_edit;
use rusqlite::{params, Connection, Row, Transaction, TransactionBehavior};

const NOTE_SELECT_SQL: &str = "SELECT
    path,
    title,
    content,
    updated_at
FROM notes";

/// Note store over a migrated connection.
pub struct SqliteNoteRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteNoteRepository<'conn> {
    /// Wraps a connection returned by `open_db`/`open_db_in_memory`.
    pub fn new(conn: &'conn mut Connection) -> Self {
        Self { conn }
    }
}

impl NoteRepository for SqliteNoteRepository<'_> {
    fn read_template(&self, path: &str) -> RepoResult<String> {
        let path = normalize_note_path(path);
        match self.get_note(&path) {
            Ok(Some(note)) => Ok(note.content),
            Ok(None) | Err(RepoError::InvalidPath(_)) => Err(RepoError::TemplateNotFound(path)),
            Err(err) => Err(err),
        }
    }

    fn get_note(&self, path: &str) -> RepoResult<Option<NoteRecord>> {
        let path = validate_note_path(path)?;
        let mut stmt = self
            .conn
            .prepare(&format!("{NOTE_SELECT_SQL} WHERE path = ?1;"))?;
        let mut rows = stmt.query([path.as_str()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_note_row(self.conn, row)?));
        }
        Ok(None)
    }

    fn find_by_title_or_alias(&self, name: &str) -> RepoResult<Option<NoteRecord>> {
        let name = name.trim();
        if name.is_empty() {
            return Ok(None);
        }

        let mut stmt = self.conn.prepare(&format!(
            "{NOTE_SELECT_SQL}
             WHERE title = ?1 COLLATE NOCASE
             ORDER BY updated_at DESC, path ASC
             LIMIT 1;"
        ))?;
        let mut rows = stmt.query([name])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_note_row(self.conn, row)?));
        }

        let mut stmt = self.conn.prepare(&format!(
            "{NOTE_SELECT_SQL}
             WHERE path IN (
                SELECT note_path
                FROM note_aliases
                WHERE alias = ?1 COLLATE NOCASE
             )
             ORDER BY updated_at DESC, path ASC
             LIMIT 1;"
        ))?;
        let mut rows = stmt.query([name])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_note_row(self.conn, row)?));
        }
        Ok(None)
    }

    fn list_titles(&self) -> RepoResult<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT title FROM notes ORDER BY updated_at DESC, path ASC;")?;
        let mut rows = stmt.query([])?;
        let mut titles = Vec::new();
        while let Some(row) = rows.next()? {
            titles.push(row.get(0)?);
        }
        Ok(titles)
    }

    fn create_note(&mut self, path: &str, content: &str) -> RepoResult<NoteRecord> {
        let path = validate_note_path(path)?;
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        if note_exists_in_tx(&tx, &path)? {
            return Err(RepoError::AlreadyExists(path));
        }

        tx.execute(
            "INSERT INTO notes (path, title, content) VALUES (?1, ?2, ?3);",
            params![path.as_str(), title_from_path(&path), content],
        )?;
        replace_aliases_in_tx(&tx, &path, content)?;
        tx.commit()?;

        self.get_note(&path)?.ok_or(RepoError::NotFound(path))
    }

    fn modify_note(&mut self, path: &str, content: &str) -> RepoResult<()> {
        let path = validate_note_path(path)?;
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let changed = tx.execute(
            "UPDATE notes
             SET
                content = ?2,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE path = ?1;",
            params![path.as_str(), content],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(path));
        }

        replace_aliases_in_tx(&tx, &path, content)?;
        tx.commit()?;
        Ok(())
    }

    fn rename_note(&mut self, from: &str, to: &str) -> RepoResult<NoteRecord> {
        let from = validate_note_path(from)?;
        let to = validate_note_path(to)?;
        if from == to {
            return self.get_note(&from)?.ok_or(RepoError::NotFound(from));
        }

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        if note_exists_in_tx(&tx, &to)? {
            return Err(RepoError::AlreadyExists(to));
        }
        // note_aliases rows follow through ON UPDATE CASCADE.
        let changed = tx.execute(
            "UPDATE notes
             SET
                path = ?2,
                title = ?3,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE path = ?1;",
            params![from.as_str(), to.as_str(), title_from_path(&to)],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(from));
        }
        tx.commit()?;

        self.get_note(&to)?.ok_or(RepoError::NotFound(to))
    }
}

fn validate_note_path(path: &str) -> RepoResult<String> {
    let normalized = normalize_note_path(path);
    let has_title = normalized
        .strip_suffix(NOTE_EXTENSION)
        .is_some_and(|stem| !stem.is_empty() && !stem.ends_with('/'));
    if !has_title {
        return Err(RepoError::InvalidPath(path.to_string()));
    }
    Ok(normalized)
}

fn parse_note_row(conn: &Connection, row: &Row<'_>) -> RepoResult<NoteRecord> {
    let path: String = row.get("path")?;
    let aliases = load_aliases(conn, &path)?;
    Ok(NoteRecord {
        title: row.get("title")?,
        content: row.get("content")?,
        updated_at: row.get("updated_at")?,
        aliases,
        path,
    })
}

fn load_aliases(conn: &Connection, path: &str) -> RepoResult<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT alias
         FROM note_aliases
         WHERE note_path = ?1
         ORDER BY rowid ASC;",
    )?;
    let mut rows = stmt.query([path])?;
    let mut aliases = Vec::new();
    while let Some(row) = rows.next()? {
        aliases.push(row.get(0)?);
    }
    Ok(aliases)
}

fn replace_aliases_in_tx(tx: &Transaction<'_>, path: &str, content: &str) -> RepoResult<()> {
    tx.execute("DELETE FROM note_aliases WHERE note_path = ?1;", [path])?;
    for alias in projected_aliases(content) {
        let alias = alias.trim();
        if alias.is_empty() {
            continue;
        }
        tx.execute(
            "INSERT OR IGNORE INTO note_aliases (note_path, alias) VALUES (?1, ?2);",
            params![path, alias],
        )?;
    }
    Ok(())
}

/// Aliases read as YAML; malformed frontmatter falls back to the line reader.
fn projected_aliases(content: &str) -> Vec<String> {
    match yaml_edit::read_frontmatter(content) {
        Ok(frontmatter) => yaml_edit::aliases(&frontmatter),
        Err(_) => FrontmatterDocument::from_content(content).aliases(),
    }
}

fn note_exists_in_tx(tx: &Transaction<'_>, path: &str) -> RepoResult<bool> {
    let exists: i64 = tx.query_row(
        "SELECT EXISTS(SELECT 1 FROM notes WHERE path = ?1);",
        [path],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

#[cfg(test)]
mod tests {
    use super::{projected_aliases, validate_note_path};
    use crate::repo::RepoError;

    #[test]
    fn aliases_are_projected_from_yaml() {
        assert_eq!(
            projected_aliases("---\naliases: [\"Cat, Dog\"]\nsource:\n  aliases: nested\n---\n"),
            vec!["Cat, Dog".to_string()]
        );
        assert_eq!(
            projected_aliases("---\naliases: [x\nbroken: {\n---\n"),
            vec!["[x".to_string()]
        );
    }

    #[test]
    fn validate_note_path_normalizes_and_rejects_non_notes() {
        assert_eq!(
            validate_note_path(" /kg/地球.md ").expect("valid path"),
            "kg/地球.md"
        );
        for bad in ["", "kg/地球", ".md", "kg/.md"] {
            assert!(matches!(
                validate_note_path(bad),
                Err(RepoError::InvalidPath(_))
            ));
        }
    }
}
