use rusqlite::Connection;
use vaxcard_core::db::migrations::{latest_version, schema_version};
use vaxcard_core::db::{open_db, open_db_in_memory, DbError};

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn).unwrap(), latest_version());
    for table in ["vaccines", "people", "vaccinations"] {
        assert_table_exists(&conn, table);
    }

    let foreign_keys: i64 = conn
        .query_row("PRAGMA foreign_keys;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(foreign_keys, 1);
}

#[test]
fn reopening_file_database_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("vaccines.db");

    let first = open_db(&path).unwrap();
    assert_eq!(schema_version(&first).unwrap(), latest_version());
    drop(first);

    let second = open_db(&path).unwrap();
    assert_eq!(schema_version(&second).unwrap(), latest_version());
    assert_table_exists(&second, "vaccinations");
}

#[test]
fn newer_schema_version_is_rejected() {
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
fn schema_rejects_duplicate_dose_slot() {
    let conn = open_db_in_memory().unwrap();
    conn.execute_batch(
        "INSERT INTO vaccines (id, name, code) VALUES ('v1', 'Hepatite B', 'hepb');
         INSERT INTO people (id, name, document, sex, age) VALUES ('p1', 'Ana', '123', 'F', 30);
         INSERT INTO vaccinations (id, person_id, vaccine_id, dose, applied_at, created_at)
             VALUES ('r1', 'p1', 'v1', 'D1', '2025-01-10', 0);",
    )
    .unwrap();

    let duplicate = conn.execute(
        "INSERT INTO vaccinations (id, person_id, vaccine_id, dose, applied_at, created_at)
         VALUES ('r2', 'p1', 'v1', 'D1', '2025-01-11', 0);",
        [],
    );
    assert!(duplicate.is_err());
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
