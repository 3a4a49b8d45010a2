//! SQLite-backed slot stored as one row of the `slots` table.

use super::{Slot, SlotError, SlotResult};
use crate::db::migrations::{current_user_version, latest_version};
use rusqlite::{params, Connection, OptionalExtension};

/// Slot stored in a migrated slot database.
pub struct SqliteSlot<'conn> {
    conn: &'conn Connection,
    key: String,
}

impl<'conn> SqliteSlot<'conn> {
    /// Binds `key` on a connection opened through [`crate::db::open_db`].
    ///
    /// # Errors
    /// - `SlotError::Uninitialized` when migrations were not applied.
    /// - `SlotError::InvalidKey` when `key` is blank.
    pub fn try_new(conn: &'conn Connection, key: impl Into<String>) -> SlotResult<Self> {
        let key = key.into();
        if key.trim().is_empty() {
            return Err(SlotError::InvalidKey(key));
        }

        let expected_version = latest_version();
        let actual_version = current_user_version(conn)?;
        if actual_version < expected_version {
            return Err(SlotError::Uninitialized {
                expected_version,
                actual_version,
            });
        }

        Ok(Self { conn, key })
    }

    /// Epoch milliseconds of the last write, if the slot was ever written.
    pub fn updated_at(&self) -> SlotResult<Option<i64>> {
        let updated_at = self
            .conn
            .query_row(
                "SELECT updated_at FROM slots WHERE key = ?1;",
                [self.key.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(updated_at)
    }
}

impl Slot for SqliteSlot<'_> {
    fn key(&self) -> &str {
        &self.key
    }

    fn read(&self) -> SlotResult<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM slots WHERE key = ?1;",
                [self.key.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn write(&self, snapshot: &str) -> SlotResult<()> {
        self.conn.execute(
            "INSERT INTO slots (key, value, updated_at)
             VALUES (?1, ?2, CAST(strftime('%s', 'now') AS INTEGER) * 1000)
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at;",
            params![self.key.as_str(), snapshot],
        )?;
        Ok(())
    }
}
