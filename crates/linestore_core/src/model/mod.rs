//! Line-item domain model shared by the todo and cart projections.
//!
//! # Responsibility
//! - Define the canonical record stored in a collection snapshot.
//! - Keep one item shape for both variants; variant fields stay optional.
//!
//! # Invariants
//! - Every item is identified by a stable `ItemId`, unique within a collection.
//! - Stored items always carry `quantity >= 1`.

pub mod line_item;

use std::time::{SystemTime, UNIX_EPOCH};

/// Returns the current wall clock time as Unix epoch milliseconds.
///
/// Falls back to `0` when the system clock is set before the epoch.
pub fn current_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}
