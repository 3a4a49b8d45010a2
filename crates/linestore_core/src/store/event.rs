//! Change notifications emitted by `CollectionStore`.

use crate::model::line_item::ItemId;
use std::fmt::{Debug, Formatter};

/// What changed in a collection after one mutating call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    Added(ItemId),
    QuantityChanged { id: ItemId, quantity: u32 },
    DoneChanged { id: ItemId, done: bool },
    Removed(ItemId),
    ClearedDone { removed: usize },
    Cleared { removed: usize },
}

/// Handle returned by `CollectionStore::subscribe`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&StoreEvent)>;

/// Registered listeners in subscription order.
#[derive(Default)]
pub(crate) struct Listeners {
    next_id: u64,
    entries: Vec<(SubscriptionId, Listener)>,
}

impl Listeners {
    pub(crate) fn add(&mut self, listener: Listener) -> SubscriptionId {
        self.next_id += 1;
        let id = SubscriptionId(self.next_id);
        self.entries.push((id, listener));
        id
    }

    pub(crate) fn remove(&mut self, id: SubscriptionId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry_id, _)| *entry_id != id);
        self.entries.len() != before
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn notify(&mut self, event: &StoreEvent) {
        for (_, listener) in &mut self.entries {
            listener(event);
        }
    }
}

impl Debug for Listeners {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Listeners")
            .field("count", &self.entries.len())
            .finish()
    }
}
