//! Persistent slot contracts and snapshot decoding.
//!
//! # Responsibility
//! - Define the single-key storage location a collection is mirrored to.
//! - Decode stored snapshots into line items, tolerating foreign shapes.
//!
//! # Invariants
//! - A slot stores one JSON array of line items under one key.
//! - Decoded snapshots never contain duplicate ids or zero quantities.
//! - Concurrent writers are not coordinated; the last write wins.

mod file;
mod memory;
mod sqlite;

pub use file::FileSlot;
pub use memory::MemorySlot;
pub use sqlite::SqliteSlot;

use crate::model::line_item::{ItemId, LineItem};
use log::warn;
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type SlotResult<T> = Result<T, SlotError>;

/// Transport error raised by a slot backend.
#[derive(Debug)]
pub enum SlotError {
    Io(std::io::Error),
    Sqlite(rusqlite::Error),
    /// Slot database was written by a newer schema than this build knows.
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
    Encode(serde_json::Error),
    InvalidKey(String),
    Uninitialized {
        expected_version: u32,
        actual_version: u32,
    },
    /// Backend refused the operation (used by in-memory failure injection).
    Unavailable(String),
}

impl Display for SlotError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "slot io error: {err}"),
            Self::Sqlite(err) => write!(f, "slot database error: {err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "slot database schema version {db_version} is newer than supported {latest_supported}"
            ),
            Self::Encode(err) => write!(f, "failed to encode snapshot: {err}"),
            Self::InvalidKey(key) => write!(f, "invalid slot key `{key}`"),
            Self::Uninitialized {
                expected_version,
                actual_version,
            } => write!(
                f,
                "slot database is not migrated: expected schema {expected_version}, found {actual_version}"
            ),
            Self::Unavailable(reason) => write!(f, "slot unavailable: {reason}"),
        }
    }
}

impl Error for SlotError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Sqlite(err) => Some(err),
            Self::Encode(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for SlotError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<rusqlite::Error> for SlotError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

/// Named storage location surviving process restarts.
pub trait Slot {
    /// Key the slot is bound to.
    fn key(&self) -> &str;
    /// Returns the stored raw snapshot, or `None` when nothing was written yet.
    fn read(&self) -> SlotResult<Option<String>>;
    /// Replaces the stored raw snapshot.
    fn write(&self, snapshot: &str) -> SlotResult<()>;
}

impl<S: Slot + ?Sized> Slot for Box<S> {
    fn key(&self) -> &str {
        (**self).key()
    }

    fn read(&self) -> SlotResult<Option<String>> {
        (**self).read()
    }

    fn write(&self, snapshot: &str) -> SlotResult<()> {
        (**self).write(snapshot)
    }
}

/// Reason a stored snapshot could not be restored.
#[derive(Debug)]
pub enum LoadError {
    Unavailable(SlotError),
    Malformed(serde_json::Error),
}

impl Display for LoadError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unavailable(err) => write!(f, "{err}"),
            Self::Malformed(err) => write!(f, "malformed snapshot: {err}"),
        }
    }
}

impl Error for LoadError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Unavailable(err) => Some(err),
            Self::Malformed(err) => Some(err),
        }
    }
}

/// Reads and decodes the snapshot stored in `slot`.
///
/// Returns `Ok(None)` when the slot holds nothing. Decoded items are passed
/// through [`sanitize_snapshot`].
pub fn load_snapshot<S: Slot + ?Sized>(slot: &S) -> Result<Option<Vec<LineItem>>, LoadError> {
    let raw = match slot.read().map_err(LoadError::Unavailable)? {
        Some(raw) => raw,
        None => return Ok(None),
    };
    let decoded: Vec<LineItem> = serde_json::from_str(&raw).map_err(LoadError::Malformed)?;
    let (items, dropped) = sanitize_snapshot(decoded);
    if dropped > 0 {
        warn!(
            "event=snapshot_sanitize module=slot status=ok key={} dropped={}",
            slot.key(),
            dropped
        );
    }
    Ok(Some(items))
}

/// Encodes items into the stored snapshot format.
pub fn encode_snapshot(items: &[LineItem]) -> SlotResult<String> {
    serde_json::to_string(items).map_err(SlotError::Encode)
}

/// Drops items failing `LineItem::validate` (blank label, zero quantity,
/// negative or non-finite price) and later duplicates of an id.
///
/// Returns the kept items in original order and the number dropped.
pub fn sanitize_snapshot(items: Vec<LineItem>) -> (Vec<LineItem>, usize) {
    let original_len = items.len();
    let mut seen: HashSet<ItemId> = HashSet::with_capacity(original_len);
    let kept: Vec<LineItem> = items
        .into_iter()
        .filter(|item| item.validate().is_ok() && seen.insert(item.id.clone()))
        .collect();
    let dropped = original_len - kept.len();
    (kept, dropped)
}

#[cfg(test)]
mod tests {
    use super::{load_snapshot, sanitize_snapshot, LoadError, MemorySlot};
    use crate::model::line_item::{CreatedAt, ItemId, LineItem};

    #[test]
    fn sanitize_drops_duplicates_and_invalid_items() {
        let first = LineItem::with_id("a".into(), "first", None);
        let duplicate = LineItem::with_id("a".into(), "duplicate", None);
        let mut empty = LineItem::with_id("b".into(), "empty", None);
        empty.quantity = 0;
        let negative = LineItem::with_id("c".into(), "refund", Some(-100.0));
        let infinite = LineItem::with_id("d".into(), "overflow", Some(f64::INFINITY));
        let blank = LineItem::with_id("e".into(), "   ", None);
        let priced = LineItem::with_id("f".into(), "pen", Some(120.0));

        let (kept, dropped) = sanitize_snapshot(vec![
            first.clone(),
            duplicate,
            empty,
            negative,
            infinite,
            blank,
            priced.clone(),
        ]);
        assert_eq!(kept, vec![first, priced]);
        assert_eq!(dropped, 5);
    }

    #[test]
    fn invalid_item_does_not_shadow_a_later_valid_one() {
        let blank = LineItem::with_id("a".into(), "", None);
        let valid = LineItem::with_id("a".into(), "kept", None);

        let (kept, dropped) = sanitize_snapshot(vec![blank, valid.clone()]);
        assert_eq!(kept, vec![valid]);
        assert_eq!(dropped, 1);
    }

    #[test]
    fn negative_price_from_slot_is_not_loaded() {
        let slot = MemorySlot::with_value(
            "shopeasy-cart",
            r#"[{"id":"p","name":"x","price":-100,"quantity":2},
                {"id":"q","name":"y","price":50,"quantity":1}]"#,
        );

        let items = load_snapshot(&slot).unwrap().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, ItemId::from("q"));
    }

    #[test]
    fn load_snapshot_distinguishes_missing_and_malformed() {
        let slot = MemorySlot::new("todos");
        assert!(load_snapshot(&slot).unwrap().is_none());

        let slot = MemorySlot::with_value("todos", "{not json");
        assert!(matches!(
            load_snapshot(&slot),
            Err(LoadError::Malformed(_))
        ));

        let slot = MemorySlot::new("todos");
        slot.fail_reads(true);
        assert!(matches!(
            load_snapshot(&slot),
            Err(LoadError::Unavailable(_))
        ));
    }

    #[test]
    fn load_snapshot_accepts_front_end_field_names() {
        let slot = MemorySlot::with_value(
            "todos",
            r#"[
                {"id": 1700000000000, "text": "Buy milk", "completed": true,
                 "createdAt": "2024-01-15T10:30:00.000Z"},
                {"id": "product-001", "name": "Earbuds", "price": 12800, "quantity": 2,
                 "image": "ignored.png"}
            ]"#,
        );

        let items = load_snapshot(&slot).unwrap().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].id, ItemId::Number(1_700_000_000_000));
        assert_eq!(items[0].label, "Buy milk");
        assert!(items[0].done);
        assert_eq!(items[0].quantity, 1);
        assert_eq!(
            items[0].created_at,
            Some(CreatedAt::Iso("2024-01-15T10:30:00.000Z".to_string()))
        );
        assert_eq!(items[1].unit_price, Some(12800.0));
        assert_eq!(items[1].quantity, 2);
    }
}
