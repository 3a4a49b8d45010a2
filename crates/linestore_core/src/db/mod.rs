//! SQLite bootstrap for the database-backed slot.
//!
//! # Responsibility
//! - Open connections whose `slots` table is ready for `SqliteSlot`.
//! - Apply schema migrations in deterministic order.
//!
//! # Invariants
//! - Migration version is tracked via `PRAGMA user_version`.
//! - Errors are reported as `SlotError`, the same type slot reads and writes
//!   return, so callers handle one failure type per backend.

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};
