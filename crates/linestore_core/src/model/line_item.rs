//! Line item record and identifier.
//!
//! # Responsibility
//! - Define `LineItem` and its wire shape inside persisted snapshots.
//! - Provide validation used by every store write path.
//!
//! # Invariants
//! - `id` is stable for the item lifetime and never reassigned.
//! - `quantity` is at least 1; zero-quantity lines are removed, not stored.
//! - `unit_price`, when present, is finite and non-negative.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Opaque item identifier.
///
/// Snapshots written by older front ends use numeric ids (insertion
/// timestamps) while product lines use text ids, so both forms are accepted
/// and written back unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ItemId {
    Number(u64),
    Text(String),
}

impl ItemId {
    /// Generates a fresh random text id.
    pub fn generate() -> Self {
        Self::Text(Uuid::new_v4().to_string())
    }

    /// Parses user input into an id, preferring the numeric form.
    pub fn parse(value: &str) -> Self {
        let trimmed = value.trim();
        match trimmed.parse::<u64>() {
            Ok(number) => Self::Number(number),
            Err(_) => Self::Text(trimmed.to_string()),
        }
    }
}

impl Display for ItemId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(value) => write!(f, "{value}"),
            Self::Text(value) => write!(f, "{value}"),
        }
    }
}

impl From<&str> for ItemId {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for ItemId {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<u64> for ItemId {
    fn from(value: u64) -> Self {
        Self::Number(value)
    }
}

/// Validation error for line item invariants.
#[derive(Debug, Clone, PartialEq)]
pub enum LineItemValidationError {
    /// Label is empty or whitespace-only.
    BlankLabel,
    /// Quantity must be at least 1 for a stored line.
    ZeroQuantity,
    /// Unit price is negative, NaN or infinite.
    InvalidUnitPrice(f64),
}

impl Display for LineItemValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankLabel => write!(f, "label must not be blank"),
            Self::ZeroQuantity => write!(f, "quantity must be at least 1"),
            Self::InvalidUnitPrice(price) => {
                write!(f, "unit price must be finite and non-negative, got {price}")
            }
        }
    }
}

impl Error for LineItemValidationError {}

/// Insertion timestamp of a line.
///
/// Items created here carry epoch milliseconds. Todo snapshots written by the
/// browser front end carry an ISO-8601 string, and anything else is kept
/// verbatim so that rewriting a snapshot never loses the field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CreatedAt {
    EpochMs(i64),
    Iso(String),
    Other(serde_json::Value),
}

impl CreatedAt {
    /// Epoch milliseconds, when the timestamp was recorded in that form.
    pub fn epoch_ms(&self) -> Option<i64> {
        match self {
            Self::EpochMs(value) => Some(*value),
            _ => None,
        }
    }
}

/// One record of a collection: a todo entry or a cart line.
///
/// Field names follow the camelCase snapshot format. Reads also accept the
/// field names used by the todo (`text`, `completed`) and cart (`name`,
/// `price`) front ends. Unknown fields are ignored.
///
/// # Migration
/// Writes always use the canonical names (`label`, `done`, `unitPrice`).
/// The first mutation therefore migrates a legacy snapshot one way: a front
/// end that still reads `text`/`completed`/`name`/`price` from the same slot
/// will not find them afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub id: ItemId,
    #[serde(alias = "text", alias = "name")]
    pub label: String,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    /// Absent for todo entries.
    #[serde(default, alias = "price", skip_serializing_if = "Option::is_none")]
    pub unit_price: Option<f64>,
    /// Completion flag; always `false` for cart lines.
    #[serde(default, alias = "completed")]
    pub done: bool,
    /// Insertion time. Informational only; written back in the form it was read.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<CreatedAt>,
}

impl LineItem {
    /// Creates an item with a generated id, quantity 1 and `done = false`.
    pub fn new(label: impl Into<String>, unit_price: Option<f64>) -> Self {
        Self::with_id(ItemId::generate(), label, unit_price)
    }

    /// Creates an item with a caller-provided id.
    ///
    /// Used by the cart path where the product id is the line id.
    pub fn with_id(id: ItemId, label: impl Into<String>, unit_price: Option<f64>) -> Self {
        Self {
            id,
            label: label.into(),
            quantity: 1,
            unit_price,
            done: false,
            created_at: None,
        }
    }

    /// Checks item invariants before the item enters a collection.
    pub fn validate(&self) -> Result<(), LineItemValidationError> {
        if self.label.trim().is_empty() {
            return Err(LineItemValidationError::BlankLabel);
        }
        if self.quantity == 0 {
            return Err(LineItemValidationError::ZeroQuantity);
        }
        if let Some(price) = self.unit_price {
            validate_unit_price(price)?;
        }
        Ok(())
    }

    /// Returns whether this item still counts as active (not done).
    pub fn is_active(&self) -> bool {
        !self.done
    }

    /// Pre-tax amount of this line. Items without a price contribute zero.
    pub fn subtotal(&self) -> f64 {
        self.unit_price.unwrap_or(0.0) * f64::from(self.quantity)
    }
}

/// Rejects negative and non-finite prices.
pub fn validate_unit_price(price: f64) -> Result<(), LineItemValidationError> {
    if !price.is_finite() || price < 0.0 {
        return Err(LineItemValidationError::InvalidUnitPrice(price));
    }
    Ok(())
}

fn default_quantity() -> u32 {
    1
}
