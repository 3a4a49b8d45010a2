//! Collection store: authoritative in-memory line items mirrored to a slot.
//!
//! # Responsibility
//! - Own the ordered item sequence for one session.
//! - Persist the full snapshot after every mutation.
//! - Answer aggregate queries (counts, totals) for rendering collaborators.
//!
//! # Invariants
//! - Item ids are unique within the collection.
//! - No stored item has quantity 0; setting quantity to 0 removes the line.
//! - Persistence failures never fail a mutation. They are logged and kept in
//!   `last_persist_error` until the next successful write.
//! - Listeners are notified after persistence, only for effective changes.

mod event;

pub use event::{StoreEvent, SubscriptionId};

use crate::model::current_epoch_ms;
use crate::model::line_item::{CreatedAt, ItemId, LineItem, LineItemValidationError};
use crate::pricing::{round_amount, PricingPolicy};
use crate::slot::{encode_snapshot, load_snapshot, LoadError, Slot, SlotError};
use event::Listeners;
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

pub type StoreResult<T> = Result<T, StoreError>;

/// Error returned by store mutations that reject their input.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreError {
    Validation(LineItemValidationError),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
        }
    }
}

impl From<LineItemValidationError> for StoreError {
    fn from(value: LineItemValidationError) -> Self {
        Self::Validation(value)
    }
}

/// Where newly created lines are placed in the sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsertPosition {
    #[default]
    Append,
    Prepend,
}

/// Ordered line-item collection synchronized to a persistent slot.
pub struct CollectionStore<S: Slot> {
    slot: S,
    items: Vec<LineItem>,
    insert_position: InsertPosition,
    listeners: Listeners,
    last_persist_error: Option<SlotError>,
}

impl<S: Slot> CollectionStore<S> {
    /// Opens a store and restores the snapshot held by `slot`.
    ///
    /// An absent, unreadable or malformed snapshot yields an empty store.
    pub fn open(slot: S) -> Self {
        let mut store = Self {
            slot,
            items: Vec::new(),
            insert_position: InsertPosition::default(),
            listeners: Listeners::default(),
            last_persist_error: None,
        };
        store.items = store.load();
        store
    }

    /// Sets where [`CollectionStore::add`] places new lines.
    pub fn with_insert_position(mut self, position: InsertPosition) -> Self {
        self.insert_position = position;
        self
    }

    /// Reads the slot snapshot without touching in-memory state.
    ///
    /// Never fails: read and decode errors are logged and yield an empty list.
    pub fn load(&self) -> Vec<LineItem> {
        let started_at = Instant::now();
        let key = self.slot.key();
        match load_snapshot(&self.slot) {
            Ok(Some(items)) => {
                info!(
                    "event=store_load module=store status=ok key={} count={} duration_ms={}",
                    key,
                    items.len(),
                    started_at.elapsed().as_millis()
                );
                items
            }
            Ok(None) => {
                info!("event=store_load module=store status=ok key={key} count=0 snapshot=absent");
                Vec::new()
            }
            Err(err) => {
                let error_code = match &err {
                    LoadError::Unavailable(_) => "slot_read_failed",
                    LoadError::Malformed(_) => "snapshot_malformed",
                };
                warn!(
                    "event=store_load module=store status=error key={key} error_code={error_code} error={err}"
                );
                Vec::new()
            }
        }
    }

    /// Replaces in-memory state with the current slot snapshot.
    ///
    /// Returns the number of restored items. Listeners are not notified.
    pub fn reload(&mut self) -> usize {
        self.items = self.load();
        self.items.len()
    }

    /// Creates a line with a fresh id, quantity 1 and `done = false`.
    ///
    /// The label is stored trimmed.
    ///
    /// # Errors
    /// - `StoreError::Validation` for a blank label or invalid price; the
    ///   collection is left untouched.
    pub fn add(&mut self, label: &str, unit_price: Option<f64>) -> StoreResult<LineItem> {
        let mut item = LineItem::new(label.trim(), unit_price);
        if let Err(err) = item.validate() {
            debug!("event=store_mutation module=store op=add status=rejected reason={err}");
            return Err(err.into());
        }
        while self.contains(&item.id) {
            item.id = ItemId::generate();
        }
        item.created_at = Some(CreatedAt::EpochMs(current_epoch_ms()));

        self.insert(item.clone());
        self.persist();
        self.notify(StoreEvent::Added(item.id.clone()));
        Ok(item)
    }

    /// Adds one unit of the line identified by `id`.
    ///
    /// An existing line has its quantity incremented and keeps its label and
    /// price; otherwise a new line with quantity 1 is appended.
    pub fn add_with_id(
        &mut self,
        id: impl Into<ItemId>,
        label: &str,
        unit_price: Option<f64>,
    ) -> StoreResult<LineItem> {
        let id = id.into();
        if let Some(index) = self.position(&id) {
            let item = &mut self.items[index];
            item.quantity = item.quantity.saturating_add(1);
            let merged = item.clone();
            self.persist();
            self.notify(StoreEvent::QuantityChanged {
                id,
                quantity: merged.quantity,
            });
            return Ok(merged);
        }

        let mut item = LineItem::with_id(id, label.trim(), unit_price);
        if let Err(err) = item.validate() {
            debug!("event=store_mutation module=store op=add_with_id status=rejected reason={err}");
            return Err(err.into());
        }
        item.created_at = Some(CreatedAt::EpochMs(current_epoch_ms()));

        self.items.push(item.clone());
        self.persist();
        self.notify(StoreEvent::Added(item.id.clone()));
        Ok(item)
    }

    /// Sets the completion flag. Returns `false` when `id` is unknown.
    pub fn set_done(&mut self, id: &ItemId, done: bool) -> bool {
        let Some(index) = self.position(id) else {
            return false;
        };
        let changed = self.items[index].done != done;
        self.items[index].done = done;
        self.persist();
        if changed {
            self.notify(StoreEvent::DoneChanged {
                id: id.clone(),
                done,
            });
        }
        true
    }

    /// Flips the completion flag and returns the new value.
    pub fn toggle_done(&mut self, id: &ItemId) -> Option<bool> {
        let done = !self.get(id)?.done;
        self.set_done(id, done);
        Some(done)
    }

    /// Deletes the line with `id`. Returns whether a line was deleted.
    pub fn remove(&mut self, id: &ItemId) -> bool {
        let Some(index) = self.position(id) else {
            return false;
        };
        self.items.remove(index);
        self.persist();
        self.notify(StoreEvent::Removed(id.clone()));
        true
    }

    /// Sets the quantity of a line; `quantity <= 0` removes it.
    ///
    /// Returns whether the target line existed.
    pub fn set_quantity(&mut self, id: &ItemId, quantity: i64) -> bool {
        if quantity <= 0 {
            return self.remove(id);
        }
        let Some(index) = self.position(id) else {
            return false;
        };
        let quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
        let changed = self.items[index].quantity != quantity;
        self.items[index].quantity = quantity;
        self.persist();
        if changed {
            self.notify(StoreEvent::QuantityChanged {
                id: id.clone(),
                quantity,
            });
        }
        true
    }

    /// Removes every done line and returns how many were removed.
    pub fn clear_done(&mut self) -> usize {
        let before = self.items.len();
        self.items.retain(LineItem::is_active);
        let removed = before - self.items.len();
        if removed > 0 {
            self.persist();
            self.notify(StoreEvent::ClearedDone { removed });
        }
        removed
    }

    /// Removes every line and returns how many were removed.
    pub fn clear(&mut self) -> usize {
        let removed = self.items.len();
        if removed > 0 {
            self.items.clear();
            self.persist();
            self.notify(StoreEvent::Cleared { removed });
        }
        removed
    }

    /// Read-only view of the live sequence in display order.
    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    /// Owned copy of the current sequence.
    pub fn snapshot(&self) -> Vec<LineItem> {
        self.items.clone()
    }

    pub fn get(&self, id: &ItemId) -> Option<&LineItem> {
        self.items.iter().find(|item| &item.id == id)
    }

    pub fn contains(&self, id: &ItemId) -> bool {
        self.position(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Sum of quantities over all lines.
    pub fn total_quantity(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.quantity)).sum()
    }

    /// Number of lines not marked done.
    pub fn active_count(&self) -> usize {
        self.items.iter().filter(|item| item.is_active()).count()
    }

    /// Number of lines marked done.
    pub fn done_count(&self) -> usize {
        self.items.len() - self.active_count()
    }

    /// Tax-inclusive total: `sum(unit_price * quantity) * (1 + tax_rate)`.
    pub fn total_amount(&self, tax_rate: f64) -> f64 {
        self.items
            .iter()
            .map(|item| item.subtotal() * (1.0 + tax_rate))
            .sum()
    }

    /// Total under a full pricing policy, including bulk discounts.
    pub fn total_amount_with(&self, policy: &PricingPolicy) -> f64 {
        self.items
            .iter()
            .map(|item| policy.line_total(item.unit_price.unwrap_or(0.0), item.quantity))
            .sum()
    }

    /// [`CollectionStore::total_amount`] rounded to a whole currency unit.
    pub fn rounded_total_amount(&self, tax_rate: f64) -> i64 {
        round_amount(self.total_amount(tax_rate))
    }

    /// Registers a listener called after every effective mutation.
    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(&StoreEvent) + 'static,
    {
        self.listeners.add(Box::new(listener))
    }

    /// Removes a listener. Returns `false` for an unknown subscription.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.listeners.remove(id)
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub fn slot(&self) -> &S {
        &self.slot
    }

    pub fn insert_position(&self) -> InsertPosition {
        self.insert_position
    }

    /// Error of the most recent failed write, cleared by the next success.
    pub fn last_persist_error(&self) -> Option<&SlotError> {
        self.last_persist_error.as_ref()
    }

    fn position(&self, id: &ItemId) -> Option<usize> {
        self.items.iter().position(|item| &item.id == id)
    }

    fn insert(&mut self, item: LineItem) {
        match self.insert_position {
            InsertPosition::Append => self.items.push(item),
            InsertPosition::Prepend => self.items.insert(0, item),
        }
    }

    fn persist(&mut self) {
        let started_at = Instant::now();
        let result = encode_snapshot(&self.items).and_then(|raw| self.slot.write(&raw));
        match result {
            Ok(()) => {
                debug!(
                    "event=store_persist module=store status=ok key={} count={} duration_ms={}",
                    self.slot.key(),
                    self.items.len(),
                    started_at.elapsed().as_millis()
                );
                self.last_persist_error = None;
            }
            Err(err) => {
                error!(
                    "event=store_persist module=store status=error key={} error_code=slot_write_failed error={}",
                    self.slot.key(),
                    err
                );
                self.last_persist_error = Some(err);
            }
        }
    }

    fn notify(&mut self, event: StoreEvent) {
        debug!("event=store_mutation module=store status=ok change={event:?}");
        self.listeners.notify(&event);
    }
}

#[cfg(test)]
mod tests {
    use super::{CollectionStore, InsertPosition, StoreError, StoreEvent};
    use crate::model::line_item::{CreatedAt, ItemId, LineItemValidationError};
    use crate::slot::MemorySlot;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn empty_store() -> CollectionStore<MemorySlot> {
        CollectionStore::open(MemorySlot::new("test-items"))
    }

    #[test]
    fn add_appends_unique_items_in_call_order() {
        let mut store = empty_store();
        let labels = ["a", "b", "c", "d"];
        for label in labels {
            store.add(label, None).unwrap();
        }

        let stored: Vec<&str> = store.items().iter().map(|i| i.label.as_str()).collect();
        assert_eq!(stored, labels);
        let mut ids: Vec<ItemId> = store.items().iter().map(|i| i.id.clone()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), labels.len());
    }

    #[test]
    fn prepend_position_puts_newest_first() {
        let mut store = empty_store().with_insert_position(InsertPosition::Prepend);
        store.add("older", None).unwrap();
        store.add("newer", None).unwrap();
        assert_eq!(store.items()[0].label, "newer");
    }

    #[test]
    fn blank_labels_are_rejected_without_writing() {
        let mut store = empty_store();
        for label in ["", "   ", "\t\n"] {
            let err = store.add(label, None).unwrap_err();
            assert_eq!(
                err,
                StoreError::Validation(LineItemValidationError::BlankLabel)
            );
        }
        assert!(store.is_empty());
        assert_eq!(store.slot().write_count(), 0);
    }

    #[test]
    fn add_trims_label_and_stamps_creation_time() {
        let mut store = empty_store();
        let item = store.add("  Buy milk  ", None).unwrap();
        assert_eq!(item.label, "Buy milk");
        assert!(item
            .created_at
            .as_ref()
            .and_then(CreatedAt::epoch_ms)
            .is_some());
    }

    #[test]
    fn snapshot_with_negative_price_cannot_drive_total_below_zero() {
        let slot = MemorySlot::with_value(
            "shopeasy-cart",
            r#"[{"id":"p","name":"x","price":-100,"quantity":2}]"#,
        );
        let store = CollectionStore::open(slot);

        assert!(store.is_empty());
        assert_eq!(store.total_amount(0.1), 0.0);
    }

    #[test]
    fn unknown_ids_leave_state_unchanged() {
        let mut store = empty_store();
        store.add("only", None).unwrap();
        let writes = store.slot().write_count();
        let missing = ItemId::from("missing");

        assert!(!store.set_done(&missing, true));
        assert!(!store.remove(&missing));
        assert!(!store.set_quantity(&missing, 3));
        assert_eq!(store.toggle_done(&missing), None);
        assert_eq!(store.slot().write_count(), writes);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn set_quantity_zero_matches_remove() {
        let mut by_quantity = empty_store();
        let mut by_remove = empty_store();
        let a = by_quantity.add_with_id("p1", "Pen", Some(100.0)).unwrap();
        by_remove.add_with_id("p1", "Pen", Some(100.0)).unwrap();

        assert!(by_quantity.set_quantity(&a.id, 0));
        assert!(by_remove.remove(&a.id));
        assert_eq!(by_quantity.items(), by_remove.items());
        assert!(by_quantity.is_empty());
        assert!(!by_quantity.set_quantity(&a.id, -1));
    }

    #[test]
    fn clear_done_removes_exactly_the_done_items() {
        let mut store = empty_store();
        let a = store.add("a", None).unwrap();
        store.add("b", None).unwrap();
        let c = store.add("c", None).unwrap();
        store.set_done(&a.id, true);
        store.set_done(&c.id, true);

        assert_eq!(store.clear_done(), 2);
        assert_eq!(store.total_quantity(), 1);
        assert_eq!(store.items()[0].label, "b");
        assert_eq!(store.clear_done(), 0);
    }

    #[test]
    fn buy_milk_lifecycle_ends_empty() {
        let mut store = empty_store();
        let item = store.add("Buy milk", None).unwrap();
        assert!(store.set_done(&item.id, true));
        assert_eq!(store.clear_done(), 1);
        assert!(store.is_empty());
        assert_eq!(store.slot().value().as_deref(), Some("[]"));
    }

    #[test]
    fn adding_same_product_twice_merges_quantity() {
        let mut store = empty_store();
        store.add_with_id("p1", "Earbuds", Some(12800.0)).unwrap();
        let merged = store.add_with_id("p1", "Earbuds", Some(12800.0)).unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(merged.quantity, 2);
        assert_eq!(store.total_quantity(), 2);
    }

    #[test]
    fn total_amount_applies_tax_to_each_line() {
        let mut store = empty_store();
        let first = store.add_with_id("p1", "A", Some(100.0)).unwrap();
        store.set_quantity(&first.id, 2);
        store.add_with_id("p2", "B", Some(50.0)).unwrap();

        assert!((store.total_amount(0.1) - 275.0).abs() < 1e-9);
        assert_eq!(store.rounded_total_amount(0.1), 275);
        assert_eq!(empty_store().total_amount(0.1), 0.0);
    }

    #[test]
    fn active_and_done_counts_track_flags() {
        let mut store = empty_store();
        let a = store.add("a", None).unwrap();
        store.add("b", None).unwrap();
        assert_eq!(store.toggle_done(&a.id), Some(true));
        assert_eq!((store.active_count(), store.done_count()), (1, 1));
        assert_eq!(store.toggle_done(&a.id), Some(false));
        assert_eq!(store.done_count(), 0);
    }

    #[test]
    fn write_failure_keeps_in_memory_change_and_is_reported() {
        let slot = MemorySlot::new("flaky");
        let mut store = CollectionStore::open(slot.clone());
        slot.fail_writes(true);

        let item = store.add("kept", None).unwrap();
        assert!(store.contains(&item.id));
        assert!(store.last_persist_error().is_some());
        assert_eq!(slot.value(), None);

        slot.fail_writes(false);
        assert!(store.set_done(&item.id, true));
        assert!(store.last_persist_error().is_none());
        assert!(slot.value().is_some());
    }

    #[test]
    fn unreadable_or_malformed_slot_opens_empty() {
        let slot = MemorySlot::with_value("broken", "[{\"id\": true}]");
        assert!(CollectionStore::open(slot).is_empty());

        let slot = MemorySlot::with_value("locked", "[]");
        slot.fail_reads(true);
        assert!(CollectionStore::open(slot).is_empty());
    }

    #[test]
    fn listeners_receive_effective_changes_only() {
        let mut store = empty_store();
        let seen: Rc<RefCell<Vec<StoreEvent>>> = Rc::default();
        let sink = Rc::clone(&seen);
        let subscription = store.subscribe(move |event| sink.borrow_mut().push(event.clone()));

        let item = store.add("a", None).unwrap();
        store.set_done(&item.id, true);
        store.set_done(&item.id, true);
        store.clear_done();
        store.clear();

        assert_eq!(
            *seen.borrow(),
            vec![
                StoreEvent::Added(item.id.clone()),
                StoreEvent::DoneChanged {
                    id: item.id.clone(),
                    done: true
                },
                StoreEvent::ClearedDone { removed: 1 },
            ]
        );

        assert!(store.unsubscribe(subscription));
        assert!(!store.unsubscribe(subscription));
        store.add("b", None).unwrap();
        assert_eq!(seen.borrow().len(), 3);
    }
}
