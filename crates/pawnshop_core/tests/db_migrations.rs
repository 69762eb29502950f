use pawnshop_core::db::migrations::{apply_migrations, latest_version};
use pawnshop_core::db::{open_db, open_db_in_memory, DbError};
use rusqlite::Connection;

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "Clients");
    assert_index_exists(&conn, "idx_clients_passport");
    assert_index_exists(&conn, "idx_clients_email");
}

#[test]
fn reopening_a_database_file_keeps_schema_and_rows() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pawnshop.db");

    let conn_first = open_db(&path).unwrap();
    conn_first
        .execute(
            "INSERT INTO Clients (
                last_name, first_name, passport_series, passport_number,
                phone_number, birth_date, gender
            ) VALUES ('Иванов', 'Иван', '1234', '567890', '79990000000', '1990-01-01', 'M');",
            [],
        )
        .unwrap();
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_second), latest_version());
    let rows: i64 = conn_second
        .query_row("SELECT COUNT(*) FROM Clients;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(rows, 1);
}

#[test]
fn schema_rejects_unknown_gender_codes() {
    let conn = open_db_in_memory().unwrap();
    let result = conn.execute(
        "INSERT INTO Clients (
            last_name, first_name, passport_series, passport_number,
            phone_number, birth_date, gender
        ) VALUES ('Иванов', 'Иван', '1234', '567890', '79990000000', '1990-01-01', 'X');",
        [],
    );
    assert!(result.is_err());
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    match err {
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

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    assert!(
        schema_object_exists(conn, "table", table_name),
        "table {table_name} does not exist"
    );
}

fn assert_index_exists(conn: &Connection, index_name: &str) {
    assert!(
        schema_object_exists(conn, "index", index_name),
        "index {index_name} does not exist"
    );
}

fn schema_object_exists(conn: &Connection, kind: &str, name: &str) -> bool {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = ?1 AND name = ?2);",
            [kind, name],
            |row| row.get(0),
        )
        .unwrap();
    exists == 1
}

#[test]
fn apply_migrations_reports_applied_steps_once() {
    let mut conn = Connection::open_in_memory().unwrap();

    let first = apply_migrations(&mut conn).unwrap();
    assert_eq!(first.from_version, 0);
    assert_eq!(first.to_version, latest_version());
    assert_eq!(first.applied, vec!["clients"]);

    let second = apply_migrations(&mut conn).unwrap();
    assert!(second.is_noop());
    assert_eq!(second.from_version, latest_version());
}

#[test]
fn rejected_step_rolls_back_and_names_the_migration() {
    let mut conn = Connection::open_in_memory().unwrap();
    conn.execute_batch("CREATE TABLE Clients (client_id INTEGER PRIMARY KEY);")
        .unwrap();

    match apply_migrations(&mut conn).unwrap_err() {
        DbError::MigrationFailed { version, name, .. } => {
            assert_eq!(version, 1);
            assert_eq!(name, "clients");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(schema_version(&conn), 0);
}
