//! Integration tests for Cartwheel.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p cartwheel-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `cart_checkout_flow` - Cart aggregation through a browse/purchase session
//! - `cart_persistence` - Cart snapshots surviving across store instances
//! - `debounced_search` - Debounced search input driving the filter store
//!
//! The crate itself only holds shared fixtures: a small catalog in the
//! shape the storefront renders, and a tracing bootstrap for debugging
//! failing runs with `RUST_LOG`.

use cartwheel_core::{CategoryId, CurrencyCode, Price, ProductId, ProductRef};

/// Install a tracing subscriber honoring `RUST_LOG`. Safe to call from
/// every test; only the first call wins.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init()
        .ok();
}

/// A USD price from a count of cents.
#[must_use]
pub fn usd(cents: i64) -> Price {
    Price::from_minor_units(cents, CurrencyCode::USD)
}

/// A catalog product snapshot.
#[must_use]
pub fn product(id: i32, title: &str, cents: i64, category: i32) -> ProductRef {
    ProductRef::new(ProductId::new(id), title.to_string(), usd(cents))
        .with_category(CategoryId::new(category))
}

/// The fixture catalog the flow tests browse.
#[must_use]
pub fn catalog() -> Vec<ProductRef> {
    vec![
        product(1, "Handmade Cotton Fish", 80_900, 1),
        product(2, "Awesome Concrete Shirt", 44_200, 1),
        product(3, "Practical Steel Chips", 12_000, 2),
        product(4, "Intelligent Cotton Towels", 30_500, 2),
    ]
}
