//! Todo list use-case service.
//!
//! # Invariants
//! - Todo entries never carry a unit price; quantity stays 1.
//! - The active count excludes done entries.

use crate::model::line_item::{ItemId, LineItem};
use crate::slot::Slot;
use crate::store::{CollectionStore, StoreResult};
use log::info;

/// Counts shown next to a todo list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TodoStats {
    pub total: usize,
    pub active: usize,
    pub completed: usize,
}

/// Todo workflow wrapper around a collection store.
pub struct TodoService<S: Slot> {
    store: CollectionStore<S>,
}

impl<S: Slot> TodoService<S> {
    pub fn new(store: CollectionStore<S>) -> Self {
        Self { store }
    }

    /// Adds an entry from submitted text.
    ///
    /// Blank text is rejected and nothing is written.
    pub fn add_todo(&mut self, text: &str) -> StoreResult<LineItem> {
        self.store.add(text, None)
    }

    /// Flips the completed flag. Returns the new flag, or `None` for unknown ids.
    pub fn toggle(&mut self, id: &ItemId) -> Option<bool> {
        self.store.toggle_done(id)
    }

    pub fn set_completed(&mut self, id: &ItemId, completed: bool) -> bool {
        self.store.set_done(id, completed)
    }

    pub fn delete(&mut self, id: &ItemId) -> bool {
        self.store.remove(id)
    }

    /// Deletes all completed entries and returns how many were deleted.
    pub fn clear_completed(&mut self) -> usize {
        let removed = self.store.clear_done();
        if removed > 0 {
            info!("event=todo_clear_completed module=service status=ok removed={removed}");
        }
        removed
    }

    pub fn stats(&self) -> TodoStats {
        let completed = self.store.done_count();
        TodoStats {
            total: self.store.len(),
            active: self.store.len() - completed,
            completed,
        }
    }

    pub fn todos(&self) -> &[LineItem] {
        self.store.items()
    }

    pub fn store(&self) -> &CollectionStore<S> {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut CollectionStore<S> {
        &mut self.store
    }
}
