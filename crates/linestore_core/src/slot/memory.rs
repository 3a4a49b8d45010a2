//! In-process slot.
//!
//! Clones share the same cell, so a second store opened on a clone observes
//! what the first one wrote. Reads and writes can be made to fail on demand.

use super::{Slot, SlotError, SlotResult};
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Debug, Default)]
struct MemoryCell {
    value: Option<String>,
    fail_reads: bool,
    fail_writes: bool,
    write_count: usize,
}

/// Slot backed by a shared in-memory cell.
#[derive(Debug, Clone)]
pub struct MemorySlot {
    key: String,
    cell: Rc<RefCell<MemoryCell>>,
}

impl MemorySlot {
    /// Creates an empty slot bound to `key`.
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            cell: Rc::new(RefCell::new(MemoryCell::default())),
        }
    }

    /// Creates a slot pre-populated with a raw snapshot.
    pub fn with_value(key: impl Into<String>, value: impl Into<String>) -> Self {
        let slot = Self::new(key);
        slot.cell.borrow_mut().value = Some(value.into());
        slot
    }

    /// Returns the currently stored raw snapshot.
    pub fn value(&self) -> Option<String> {
        self.cell.borrow().value.clone()
    }

    /// Number of successful writes so far.
    pub fn write_count(&self) -> usize {
        self.cell.borrow().write_count
    }

    /// Makes subsequent reads fail while `enabled` is set.
    pub fn fail_reads(&self, enabled: bool) {
        self.cell.borrow_mut().fail_reads = enabled;
    }

    /// Makes subsequent writes fail while `enabled` is set.
    pub fn fail_writes(&self, enabled: bool) {
        self.cell.borrow_mut().fail_writes = enabled;
    }
}

impl Slot for MemorySlot {
    fn key(&self) -> &str {
        &self.key
    }

    fn read(&self) -> SlotResult<Option<String>> {
        let cell = self.cell.borrow();
        if cell.fail_reads {
            return Err(SlotError::Unavailable(format!("read of `{}` refused", self.key)));
        }
        Ok(cell.value.clone())
    }

    fn write(&self, snapshot: &str) -> SlotResult<()> {
        let mut cell = self.cell.borrow_mut();
        if cell.fail_writes {
            return Err(SlotError::Unavailable(format!("write of `{}` refused", self.key)));
        }
        cell.value = Some(snapshot.to_string());
        cell.write_count += 1;
        Ok(())
    }
}
