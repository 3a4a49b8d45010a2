//! Shopping cart use-case service.
//!
//! # Responsibility
//! - Add catalog products to the cart, merging repeated adds into one line.
//! - Enforce stock limits on add.
//! - Summarize item count and tax-inclusive totals.
//!
//! # Invariants
//! - The line id of a cart entry is the product id.
//! - A line's quantity never grows past the product stock through `add_to_cart`.

use crate::catalog::Catalog;
use crate::model::line_item::{ItemId, LineItem};
use crate::pricing::{round_amount, PricingPolicy};
use crate::slot::Slot;
use crate::store::{CollectionStore, StoreError};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, PartialEq)]
pub enum CartError {
    UnknownProduct(String),
    OutOfStock(String),
    StockExceeded { product_id: String, stock: u32 },
    Store(StoreError),
}

impl Display for CartError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownProduct(id) => write!(f, "product not found: {id}"),
            Self::OutOfStock(id) => write!(f, "product out of stock: {id}"),
            Self::StockExceeded { product_id, stock } => write!(
                f,
                "cannot add more of {product_id}: only {stock} in stock"
            ),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for CartError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StoreError> for CartError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

/// Aggregates shown in the cart badge and checkout view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CartSummary {
    /// Number of distinct lines.
    pub line_count: usize,
    /// Sum of quantities.
    pub item_count: u64,
    /// Tax-inclusive total.
    pub total: f64,
    /// `total` rounded for display.
    pub rounded_total: i64,
}

/// Cart workflow over a collection store and a product catalog.
pub struct CartService<S: Slot> {
    store: CollectionStore<S>,
    catalog: Catalog,
    pricing: PricingPolicy,
}

impl<S: Slot> CartService<S> {
    pub fn new(store: CollectionStore<S>, catalog: Catalog, pricing: PricingPolicy) -> Self {
        Self {
            store,
            catalog,
            pricing,
        }
    }

    /// Adds one unit of a catalog product.
    ///
    /// # Errors
    /// - `UnknownProduct` when the id is not in the catalog.
    /// - `OutOfStock` when the product has no stock.
    /// - `StockExceeded` when the cart already holds the whole stock.
    pub fn add_to_cart(&mut self, product_id: &str) -> Result<LineItem, CartError> {
        let Some(product) = self.catalog.find(product_id) else {
            warn!("event=cart_add module=service status=rejected reason=unknown_product");
            return Err(CartError::UnknownProduct(product_id.to_string()));
        };
        if !product.in_stock() {
            return Err(CartError::OutOfStock(product.id.clone()));
        }

        let line_id = ItemId::from(product.id.as_str());
        let in_cart = self.store.get(&line_id).map_or(0, |line| line.quantity);
        if in_cart >= product.stock {
            return Err(CartError::StockExceeded {
                product_id: product.id.clone(),
                stock: product.stock,
            });
        }

        let line = self
            .store
            .add_with_id(line_id, &product.name, Some(product.price))?;
        info!(
            "event=cart_add module=service status=ok product_id={} quantity={}",
            line.id, line.quantity
        );
        Ok(line)
    }

    /// Sets a line quantity; `quantity <= 0` removes the line.
    pub fn update_quantity(&mut self, product_id: &str, quantity: i64) -> bool {
        self.store.set_quantity(&ItemId::from(product_id), quantity)
    }

    pub fn remove(&mut self, product_id: &str) -> bool {
        self.store.remove(&ItemId::from(product_id))
    }

    pub fn clear(&mut self) -> usize {
        self.store.clear()
    }

    pub fn summary(&self) -> CartSummary {
        let total = self.store.total_amount_with(&self.pricing);
        CartSummary {
            line_count: self.store.len(),
            item_count: self.store.total_quantity(),
            total,
            rounded_total: round_amount(total),
        }
    }

    pub fn lines(&self) -> &[LineItem] {
        self.store.items()
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn pricing(&self) -> &PricingPolicy {
        &self.pricing
    }

    pub fn store(&self) -> &CollectionStore<S> {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut CollectionStore<S> {
        &mut self.store
    }
}
