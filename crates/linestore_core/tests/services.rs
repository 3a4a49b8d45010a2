use linestore_core::{
    CartError, CartService, Catalog, CollectionStore, ItemId, MemorySlot, PricingPolicy, Product,
    TodoService, TodoStats,
};

fn cart(catalog: Catalog, pricing: PricingPolicy) -> CartService<MemorySlot> {
    CartService::new(
        CollectionStore::open(MemorySlot::new("shopeasy-cart")),
        catalog,
        pricing,
    )
}

#[test]
fn todo_stats_follow_toggle_and_clear() {
    let mut todos = TodoService::new(CollectionStore::open(MemorySlot::new("todos")));
    let milk = todos.add_todo("Buy milk").unwrap();
    todos.add_todo("Walk dog").unwrap();
    assert!(todos.add_todo("  ").is_err());

    assert_eq!(todos.toggle(&milk.id), Some(true));
    assert_eq!(
        todos.stats(),
        TodoStats {
            total: 2,
            active: 1,
            completed: 1
        }
    );

    assert_eq!(todos.clear_completed(), 1);
    assert_eq!(todos.stats().completed, 0);
    assert_eq!(todos.todos()[0].label, "Walk dog");
    assert!(!todos.delete(&milk.id));
}

#[test]
fn adding_a_product_twice_increments_its_line() {
    let mut cart = cart(Catalog::sample(), PricingPolicy::default());
    cart.add_to_cart("product-001").unwrap();
    let line = cart.add_to_cart("product-001").unwrap();

    assert_eq!(line.id, ItemId::from("product-001"));
    assert_eq!(line.quantity, 2);
    assert_eq!(cart.lines().len(), 1);

    let summary = cart.summary();
    assert_eq!(summary.line_count, 1);
    assert_eq!(summary.item_count, 2);
    assert_eq!(summary.rounded_total, 28160);
}

#[test]
fn stock_limits_are_enforced() {
    let catalog = Catalog::new(vec![
        Product::new("lamp", "Desk Lamp", 6800.0, 2),
        Product::new("sold-out", "Sold Out", 100.0, 0),
    ]);
    let mut cart = cart(catalog, PricingPolicy::default());

    cart.add_to_cart("lamp").unwrap();
    cart.add_to_cart("lamp").unwrap();
    assert_eq!(
        cart.add_to_cart("lamp").unwrap_err(),
        CartError::StockExceeded {
            product_id: "lamp".to_string(),
            stock: 2
        }
    );
    assert_eq!(
        cart.add_to_cart("sold-out").unwrap_err(),
        CartError::OutOfStock("sold-out".to_string())
    );
    assert_eq!(
        cart.add_to_cart("missing").unwrap_err(),
        CartError::UnknownProduct("missing".to_string())
    );
    assert_eq!(cart.summary().item_count, 2);
}

#[test]
fn quantity_updates_and_bulk_pricing() {
    let catalog = Catalog::new(vec![Product::new("pen", "Pen", 100.0, 50)]);
    let mut cart = cart(catalog, PricingPolicy::with_bulk_discount());
    cart.add_to_cart("pen").unwrap();

    assert!(cart.update_quantity("pen", 11));
    assert!((cart.summary().total - 1149.5).abs() < 1e-9);
    assert_eq!(cart.summary().rounded_total, 1150);

    assert!(cart.update_quantity("pen", 0));
    assert!(cart.lines().is_empty());
    assert!(!cart.update_quantity("pen", 3));
    assert!(!cart.remove("pen"));
}

#[test]
fn clearing_the_cart_empties_the_slot() {
    let slot = MemorySlot::new("shopeasy-cart");
    let mut cart = CartService::new(
        CollectionStore::open(slot.clone()),
        Catalog::sample(),
        PricingPolicy::default(),
    );
    cart.add_to_cart("product-003").unwrap();
    cart.add_to_cart("product-004").unwrap();

    assert_eq!(cart.clear(), 2);
    assert_eq!(slot.value().as_deref(), Some("[]"));
    assert_eq!(cart.summary().total, 0.0);
}
