//! Core of linestore: line-item collections mirrored to persistent slots.
//! Front ends render from this crate and never own collection state.

pub mod catalog;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod pricing;
pub mod service;
pub mod slot;
pub mod store;

pub use catalog::{Catalog, Product};
pub use config::{ConfigError, StoreConfig};
pub use logging::{
    init_logging, init_logging_with_level, logging_status, LogLevel, LoggingError,
};
pub use model::line_item::{CreatedAt, ItemId, LineItem, LineItemValidationError};
pub use pricing::{BulkDiscount, PricingPolicy};
pub use service::cart_service::{CartError, CartService, CartSummary};
pub use service::todo_service::{TodoService, TodoStats};
pub use slot::{load_snapshot, FileSlot, LoadError, MemorySlot, Slot, SlotError, SqliteSlot};
pub use store::{
    CollectionStore, InsertPosition, StoreError, StoreEvent, StoreResult, SubscriptionId,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// Opens a store on `slot` using the insert position from `config`.
pub fn open_store<S: Slot>(slot: S, config: &StoreConfig) -> CollectionStore<S> {
    CollectionStore::open(slot).with_insert_position(config.insert_position)
}
