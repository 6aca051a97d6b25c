use relbook_core::db::migrations::latest_version;
use relbook_core::db::{open_db, open_db_in_memory, DbError};
use rusqlite::Connection;

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    for table in [
        "blog_users",
        "blog_posts",
        "blog_comments",
        "campus_students",
        "campus_courses",
        "campus_enrollments",
    ] {
        assert_table_exists(&conn, table);
    }
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("relbook.db");

    let conn_first = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_first), latest_version());
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_second), latest_version());
    assert_table_exists(&conn_second, "campus_enrollments");
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    match open_db(&path).unwrap_err() {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn failed_migration_reports_version_and_keeps_schema_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("conflict.db");

    // A foreign table without the link columns makes migration 2's index fail.
    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("CREATE TABLE campus_enrollments (x INTEGER);")
        .unwrap();
    drop(conn);

    match open_db(&path).unwrap_err() {
        DbError::Migration { version, .. } => assert_eq!(version, 2),
        other => panic!("unexpected error: {other}"),
    }

    let conn = Connection::open(&path).unwrap();
    assert_eq!(schema_version(&conn), 0);
    let blog_tables: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name LIKE 'blog_%';",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(blog_tables, 0);
}

#[test]
fn link_rows_require_existing_endpoints_at_storage_level() {
    let conn = open_db_in_memory().unwrap();
    let err = conn
        .execute(
            "INSERT INTO blog_comments (id, parent_id, child_id) VALUES (1, 5, 1);",
            [],
        )
        .unwrap_err();
    assert!(err.to_string().contains("FOREIGN KEY"));
}

#[test]
fn comment_text_column_is_added_to_existing_blog_database() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("v2.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch(include_str!("../src/db/migrations/0001_blog.sql"))
        .unwrap();
    conn.execute_batch(include_str!("../src/db/migrations/0002_campus.sql"))
        .unwrap();
    conn.execute_batch(
        "PRAGMA user_version = 2;
         INSERT INTO blog_users (id, name) VALUES (1, 'Ada');
         INSERT INTO blog_posts (id, name) VALUES (1, 'Intro');
         INSERT INTO blog_comments (id, parent_id, child_id) VALUES (1, 1, 1);",
    )
    .unwrap();
    drop(conn);

    let conn = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn), latest_version());
    let text: Option<String> = conn
        .query_row("SELECT text FROM blog_comments WHERE id = 1;", [], |row| {
            row.get(0)
        })
        .unwrap();
    assert_eq!(text, None);
    assert!(!column_exists(&conn, "campus_enrollments", "text"));
}

fn column_exists(conn: &Connection, table: &str, column: &str) -> bool {
    let mut stmt = conn
        .prepare(&format!("PRAGMA table_info({table});"))
        .unwrap();
    let names = stmt
        .query_map([], |row| row.get::<_, String>("name"))
        .unwrap()
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    names.iter().any(|name| name == column)
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "table {table_name} does not exist");
}
