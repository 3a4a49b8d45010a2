use linestore_core::db::migrations::latest_version;
use linestore_core::db::{open_db, open_db_in_memory};
use linestore_core::{Slot, SlotError, SqliteSlot};
use rusqlite::Connection;

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "slots");
}

#[test]
fn opening_same_database_twice_keeps_slot_contents() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("linestore.db");

    let conn_first = open_db(&path).unwrap();
    SqliteSlot::try_new(&conn_first, "todos")
        .unwrap()
        .write("[]")
        .unwrap();
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_second), latest_version());
    let slot = SqliteSlot::try_new(&conn_second, "todos").unwrap();
    assert_eq!(slot.read().unwrap().as_deref(), Some("[]"));
    assert!(slot.updated_at().unwrap().is_some());
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    match open_db(&path).unwrap_err() {
        SlotError::UnsupportedSchemaVersion {
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
fn sqlite_slot_rejects_unmigrated_connection() {
    let conn = Connection::open_in_memory().unwrap();

    match SqliteSlot::try_new(&conn, "todos") {
        Err(SlotError::Uninitialized {
            expected_version,
            actual_version: 0,
        }) => assert_eq!(expected_version, latest_version()),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("expected uninitialized connection error"),
    }
}

#[test]
fn sqlite_slots_are_isolated_by_key() {
    let conn = open_db_in_memory().unwrap();
    let todos = SqliteSlot::try_new(&conn, "todos").unwrap();
    let cart = SqliteSlot::try_new(&conn, "shopeasy-cart").unwrap();

    todos.write(r#"[{"id":1,"label":"a"}]"#).unwrap();
    todos.write("[]").unwrap();

    assert_eq!(todos.read().unwrap().as_deref(), Some("[]"));
    assert!(cart.read().unwrap().is_none());
    assert!(matches!(
        SqliteSlot::try_new(&conn, "  "),
        Err(SlotError::InvalidKey(_))
    ));
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
