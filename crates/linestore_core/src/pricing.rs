//! Tax and bulk-discount pricing rules.
//!
//! # Invariants
//! - Tax applies to the discounted subtotal.
//! - A bulk discount applies only when quantity is strictly above the threshold.

use serde::{Deserialize, Serialize};

/// Default consumption tax rate.
pub const DEFAULT_TAX_RATE: f64 = 0.1;
/// Default bulk discount rate.
pub const DEFAULT_BULK_DISCOUNT_RATE: f64 = 0.05;
/// Quantity a line must exceed before the bulk discount applies.
pub const DEFAULT_BULK_DISCOUNT_THRESHOLD: u32 = 10;

/// Percentage discount for large quantities of one line.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BulkDiscount {
    pub threshold: u32,
    pub rate: f64,
}

impl Default for BulkDiscount {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_BULK_DISCOUNT_THRESHOLD,
            rate: DEFAULT_BULK_DISCOUNT_RATE,
        }
    }
}

/// Pricing rules applied to line totals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricingPolicy {
    pub tax_rate: f64,
    #[serde(default)]
    pub bulk_discount: Option<BulkDiscount>,
}

impl Default for PricingPolicy {
    fn default() -> Self {
        Self::tax_only(DEFAULT_TAX_RATE)
    }
}

impl PricingPolicy {
    /// Tax without any quantity discount.
    pub fn tax_only(tax_rate: f64) -> Self {
        Self {
            tax_rate,
            bulk_discount: None,
        }
    }

    /// Default tax plus the default bulk discount.
    pub fn with_bulk_discount() -> Self {
        Self {
            tax_rate: DEFAULT_TAX_RATE,
            bulk_discount: Some(BulkDiscount::default()),
        }
    }

    /// Tax-inclusive amount for `quantity` units at `unit_price`.
    pub fn line_total(&self, unit_price: f64, quantity: u32) -> f64 {
        let subtotal = unit_price * f64::from(quantity);
        let discount_rate = match self.bulk_discount {
            Some(discount) if quantity > discount.threshold => discount.rate,
            _ => 0.0,
        };
        let discounted = subtotal - subtotal * discount_rate;
        discounted + discounted * self.tax_rate
    }

    /// Tax-inclusive unit price rounded for display.
    pub fn price_with_tax(&self, unit_price: f64) -> i64 {
        round_amount(unit_price * (1.0 + self.tax_rate))
    }
}

/// Rounds an amount to the nearest whole currency unit, half away from zero.
pub fn round_amount(amount: f64) -> i64 {
    amount.round() as i64
}
