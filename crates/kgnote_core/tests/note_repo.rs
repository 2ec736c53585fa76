use kgnote_core::db::open_db_in_memory;
use kgnote_core::{NoteRepository, RepoError, SqliteNoteRepository};

const EARTH: &str = "---\nuid: 1\naliases:\n  - \"Earth\"\n  - \"蓝星\"\ntype: concept\n---\n\n# 关系\n";

#[test]
fn create_then_get_projects_title_and_aliases() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteNoteRepository::new(&mut conn);

    let created = repo.create_note("/kg/地球.md", EARTH).unwrap();
    assert_eq!(created.path, "kg/地球.md");
    assert_eq!(created.title, "地球");
    assert_eq!(created.aliases, vec!["Earth", "蓝星"]);

    let loaded = repo.get_note("kg/地球.md").unwrap().unwrap();
    assert_eq!(loaded, created);
    assert!(repo.get_note("kg/火星.md").unwrap().is_none());
}

#[test]
fn create_rejects_taken_and_invalid_paths() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteNoteRepository::new(&mut conn);
    repo.create_note("地球.md", EARTH).unwrap();

    assert!(matches!(
        repo.create_note("地球.md", ""),
        Err(RepoError::AlreadyExists(path)) if path == "地球.md"
    ));
    assert!(matches!(
        repo.create_note("地球", ""),
        Err(RepoError::InvalidPath(_))
    ));
}

#[test]
fn lookup_matches_title_or_alias_ignoring_case() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteNoteRepository::new(&mut conn);
    repo.create_note("kg/地球.md", EARTH).unwrap();
    repo.create_note("kg/Moon.md", "").unwrap();

    let by_alias = repo.find_by_title_or_alias("earth").unwrap().unwrap();
    assert_eq!(by_alias.path, "kg/地球.md");
    let by_title = repo.find_by_title_or_alias("MOON").unwrap().unwrap();
    assert_eq!(by_title.path, "kg/Moon.md");
    assert!(repo.find_by_title_or_alias("  ").unwrap().is_none());
    assert!(repo.find_by_title_or_alias("火星").unwrap().is_none());
}

#[test]
fn title_match_wins_over_alias_match() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteNoteRepository::new(&mut conn);
    repo.create_note("a/别名持有者.md", "---\naliases:\n  - \"Earth\"\n---\n")
        .unwrap();
    repo.create_note("b/Earth.md", "").unwrap();

    let found = repo.find_by_title_or_alias("Earth").unwrap().unwrap();
    assert_eq!(found.path, "b/Earth.md");
}

#[test]
fn list_titles_orders_by_recency_then_path() {
    let mut conn = open_db_in_memory().unwrap();
    {
        let mut repo = SqliteNoteRepository::new(&mut conn);
        repo.create_note("b.md", "").unwrap();
        repo.create_note("a.md", "").unwrap();
        repo.create_note("c.md", "").unwrap();
    }
    conn.execute_batch(
        "UPDATE notes SET updated_at = 100;
         UPDATE notes SET updated_at = 200 WHERE path = 'c.md';",
    )
    .unwrap();

    let repo = SqliteNoteRepository::new(&mut conn);
    assert_eq!(repo.list_titles().unwrap(), vec!["c", "a", "b"]);
}

#[test]
fn modify_replaces_content_and_reprojects_aliases() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteNoteRepository::new(&mut conn);
    repo.create_note("地球.md", EARTH).unwrap();

    repo.modify_note("地球.md", "---\naliases: []\n---\n正文\n")
        .unwrap();
    let note = repo.get_note("地球.md").unwrap().unwrap();
    assert!(note.aliases.is_empty());
    assert!(note.content.ends_with("正文\n"));
    assert!(repo.find_by_title_or_alias("Earth").unwrap().is_none());

    assert!(matches!(
        repo.modify_note("火星.md", ""),
        Err(RepoError::NotFound(path)) if path == "火星.md"
    ));
}

#[test]
fn rename_moves_note_and_keeps_aliases() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteNoteRepository::new(&mut conn);
    repo.create_note("kg/地球.md", EARTH).unwrap();
    repo.create_note("kg/太阳.md", "").unwrap();

    let renamed = repo.rename_note("kg/地球.md", "kg/地球-影响-太阳.md").unwrap();
    assert_eq!(renamed.title, "地球-影响-太阳");
    assert_eq!(renamed.aliases, vec!["Earth", "蓝星"]);
    assert!(repo.get_note("kg/地球.md").unwrap().is_none());

    let by_alias = repo.find_by_title_or_alias("蓝星").unwrap().unwrap();
    assert_eq!(by_alias.path, "kg/地球-影响-太阳.md");

    assert!(matches!(
        repo.rename_note("kg/地球-影响-太阳.md", "kg/太阳.md"),
        Err(RepoError::AlreadyExists(_))
    ));
    assert!(matches!(
        repo.rename_note("kg/missing.md", "kg/other.md"),
        Err(RepoError::NotFound(_))
    ));
}

#[test]
fn read_template_reports_missing_templates() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteNoteRepository::new(&mut conn);
    repo.create_note("templates/KG概念模板.md", "---\nuid: \n---\n")
        .unwrap();

    assert_eq!(
        repo.read_template("/templates/KG概念模板.md").unwrap(),
        "---\nuid: \n---\n"
    );
    assert!(matches!(
        repo.read_template("templates/KG关系模板.md"),
        Err(RepoError::TemplateNotFound(path)) if path == "templates/KG关系模板.md"
    ));
    assert!(matches!(
        repo.read_template("not-a-note"),
        Err(RepoError::TemplateNotFound(_))
    ));
}
