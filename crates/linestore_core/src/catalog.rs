//! Product catalog consulted by the cart service.

use serde::{Deserialize, Serialize};

/// Sellable product with remaining stock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub price: f64,
    pub stock: u32,
    #[serde(default)]
    pub description: String,
}

impl Product {
    pub fn new(id: impl Into<String>, name: impl Into<String>, price: f64, stock: u32) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            price,
            stock,
            description: String::new(),
        }
    }

    pub fn in_stock(&self) -> bool {
        self.stock > 0
    }

    /// Stock is low but not exhausted.
    pub fn is_low_stock(&self) -> bool {
        self.stock > 0 && self.stock <= LOW_STOCK_THRESHOLD
    }
}

/// Stock level at or below which a product is flagged as running out.
pub const LOW_STOCK_THRESHOLD: u32 = 5;

/// Ordered, read-only product list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalog {
    products: Vec<Product>,
}

impl Catalog {
    pub fn new(products: Vec<Product>) -> Self {
        Self { products }
    }

    /// Parses a catalog from a JSON array of products.
    pub fn from_json_str(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    /// Built-in demo catalog.
    pub fn sample() -> Self {
        Self::new(vec![
            Product::new("product-001", "Wireless Earbuds Pro", 12800.0, 15),
            Product::new("product-002", "Smartwatch X1", 25600.0, 8),
            Product::new("product-003", "RGB Gaming Keyboard", 8900.0, 25),
            Product::new("product-004", "Portable Charger 20000mAh", 3200.0, 42),
            Product::new("product-005", "Bluetooth Speaker Pro", 15400.0, 12),
            Product::new("product-006", "LED Desk Light", 6800.0, 3),
        ])
    }

    pub fn find(&self, product_id: &str) -> Option<&Product> {
        self.products.iter().find(|product| product.id == product_id)
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }
}

#[cfg(test)]
mod tests {
    use super::Catalog;

    #[test]
    fn sample_catalog_lookup() {
        let catalog = Catalog::sample();
        let desk_light = catalog.find("product-006").unwrap();
        assert!(desk_light.is_low_stock());
        assert!(catalog.find("product-999").is_none());
    }

    #[test]
    fn from_json_defaults_description() {
        let catalog =
            Catalog::from_json_str(r#"[{"id":"p1","name":"Pen","price":120,"stock":0}]"#).unwrap();
        let pen = catalog.find("p1").unwrap();
        assert!(!pen.in_stock());
        assert!(pen.description.is_empty());
    }
}
