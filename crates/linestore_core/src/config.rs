//! Store configuration loaded from TOML with environment overrides.
//!
//! # Invariants
//! - A missing config file yields defaults; a malformed one is an error.
//! - Returned configs have passed `StoreConfig::validate`.

use crate::pricing::{BulkDiscount, PricingPolicy, DEFAULT_TAX_RATE};
use crate::store::InsertPosition;
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io::ErrorKind;
use std::path::Path;

/// Slot key used when none is configured.
pub const DEFAULT_SLOT_KEY: &str = "linestore-items";

const ENV_SLOT_KEY: &str = "LINESTORE_SLOT_KEY";
const ENV_TAX_RATE: &str = "LINESTORE_TAX_RATE";

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "failed to read config: {err}"),
            Self::Parse(err) => write!(f, "failed to parse config: {err}"),
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Parse(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}

/// Pricing section of the config file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PricingConfig {
    pub tax_rate: f64,
    pub bulk_discount: Option<BulkDiscount>,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            tax_rate: DEFAULT_TAX_RATE,
            bulk_discount: None,
        }
    }
}

/// Top-level store configuration.
///
/// ```toml
/// slot_key = "todos"
/// insert_position = "prepend"
/// log_level = "info"
///
/// [pricing]
/// tax_rate = 0.1
/// bulk_discount = { threshold = 10, rate = 0.05 }
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    pub slot_key: String,
    pub insert_position: InsertPosition,
    pub log_level: Option<String>,
    pub pricing: PricingConfig,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            slot_key: DEFAULT_SLOT_KEY.to_string(),
            insert_position: InsertPosition::default(),
            log_level: None,
            pricing: PricingConfig::default(),
        }
    }
}

impl StoreConfig {
    /// Parses and validates a TOML document.
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads `path`, falling back to defaults when the file does not exist,
    /// then applies process environment overrides.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let config = match std::fs::read_to_string(path.as_ref()) {
            Ok(raw) => Self::from_toml_str(&raw)?,
            Err(err) if err.kind() == ErrorKind::NotFound => Self::default(),
            Err(err) => return Err(ConfigError::Io(err)),
        };
        config.with_overrides(|name| std::env::var(name).ok())
    }

    /// Applies `LINESTORE_SLOT_KEY` / `LINESTORE_TAX_RATE` style overrides
    /// resolved through `lookup`, then re-validates.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup(ENV_SLOT_KEY) {
            self.slot_key = key;
        }
        if let Some(raw_rate) = lookup(ENV_TAX_RATE) {
            self.pricing.tax_rate = raw_rate.trim().parse().map_err(|_| {
                ConfigError::Invalid(format!("{ENV_TAX_RATE} is not a number: `{raw_rate}`"))
            })?;
        }
        self.validate()?;
        Ok(self)
    }

    /// Checks key and rate bounds.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.slot_key.trim().is_empty() {
            return Err(ConfigError::Invalid("slot_key cannot be empty".to_string()));
        }
        check_rate("pricing.tax_rate", self.pricing.tax_rate)?;
        if let Some(discount) = self.pricing.bulk_discount {
            check_rate("pricing.bulk_discount.rate", discount.rate)?;
        }
        Ok(())
    }

    /// Pricing policy described by this config.
    pub fn pricing_policy(&self) -> PricingPolicy {
        PricingPolicy {
            tax_rate: self.pricing.tax_rate,
            bulk_discount: self.pricing.bulk_discount,
        }
    }
}

fn check_rate(name: &str, value: f64) -> Result<(), ConfigError> {
    if !value.is_finite() || !(0.0..=1.0).contains(&value) {
        return Err(ConfigError::Invalid(format!(
            "{name} must be within [0, 1], got {value}"
        )));
    }
    Ok(())
}
