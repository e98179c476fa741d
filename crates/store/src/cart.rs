//! Cart aggregation store.
//!
//! The cart owns a mapping of product to line and derives its totals (item
//! count, summed price) from that mapping on every mutation. Totals are
//! never stored independently of their source lines and never settable from
//! outside, so a torn read is impossible: mutation and recomputation happen
//! inline in the same turn.
//!
//! The store is an explicitly constructed value scoped to a session - see
//! [`crate::session::SessionStores`] for the login/purchase/logout
//! lifecycle - and holds no locks: mutations take `&mut self`.

use core::fmt;
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use cartwheel_core::{CartId, CurrencyCode, Price, ProductId, ProductRef};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::CartError;
use crate::persist::{CartSnapshot, CartStorage};
use crate::subscription::{Listeners, SubscriptionId};

/// One cart line: a product snapshot and how many units of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    /// Snapshot of the product as it was when first added.
    pub product: ProductRef,
    /// Unit count; always at least 1.
    pub quantity: u32,
}

impl CartItem {
    /// Price of the whole line (unit price x quantity), saturating at the
    /// representable maximum.
    #[must_use]
    pub fn line_total(&self) -> Price {
        let unit = self.product.price;
        Price::from_minor_units(
            unit.minor_units().saturating_mul(i64::from(self.quantity)),
            unit.currency(),
        )
    }
}

/// Derived aggregate over the cart contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartTotals {
    /// Total unit count across all lines.
    pub count: u32,
    /// Total price across all lines.
    pub price: Price,
}

impl CartTotals {
    /// The empty-cart totals in the given currency.
    #[must_use]
    pub const fn zero(currency: CurrencyCode) -> Self {
        Self {
            count: 0,
            price: Price::zero(currency),
        }
    }
}

/// What a cart mutation did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartEventKind {
    /// A line was inserted or merged into.
    ItemAdded {
        /// The affected product.
        product_id: ProductId,
    },
    /// A line was removed.
    ItemRemoved {
        /// The removed product.
        product_id: ProductId,
    },
    /// A line's quantity was overwritten.
    QuantityChanged {
        /// The affected product.
        product_id: ProductId,
    },
    /// All lines were removed at once.
    Cleared,
}

/// Change notification delivered to subscribed listeners.
///
/// Carries the post-mutation totals so a badge or summary can re-render
/// without reading the store back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CartEvent {
    /// What happened.
    pub kind: CartEventKind,
    /// Totals after the mutation.
    pub totals: CartTotals,
}

/// Shopping cart with derived totals.
///
/// ## Invariants
///
/// - `totals.count` equals the sum of line quantities; `totals.price`
///   equals the sum of line totals. Both are recomputed inline on every
///   mutation.
/// - Lines are keyed by product ID: adding an already-present product
///   merges quantities instead of duplicating the line.
/// - Every line quantity is at least 1.
/// - All lines are priced in the cart's currency, fixed at construction.
pub struct CartStore {
    id: CartId,
    currency: CurrencyCode,
    items: BTreeMap<ProductId, CartItem>,
    totals: CartTotals,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    listeners: Listeners<CartEvent>,
    storage: Option<Box<dyn CartStorage>>,
}

impl CartStore {
    /// Create an empty, session-only cart.
    #[must_use]
    pub fn new(currency: CurrencyCode) -> Self {
        let now = Utc::now();
        Self {
            id: CartId::new(),
            currency,
            items: BTreeMap::new(),
            totals: CartTotals::zero(currency),
            created_at: now,
            updated_at: now,
            listeners: Listeners::new(),
            storage: None,
        }
    }

    /// Create a cart backed by persistent storage.
    ///
    /// A compatible snapshot left by a previous session is restored; a
    /// snapshot in a different currency is discarded with a warning, as is
    /// an unreadable one. Every subsequent mutation saves best-effort.
    #[must_use]
    pub fn with_storage(currency: CurrencyCode, storage: Box<dyn CartStorage>) -> Self {
        let mut store = Self::new(currency);

        match storage.load() {
            Ok(Some(snapshot)) if snapshot.currency == currency => {
                store.restore(snapshot);
            }
            Ok(Some(snapshot)) => {
                tracing::warn!(
                    snapshot_currency = %snapshot.currency,
                    cart_currency = %currency,
                    "Discarding persisted cart in a different currency"
                );
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!("Failed to load persisted cart: {e}");
            }
        }

        store.storage = Some(storage);
        store
    }

    fn restore(&mut self, snapshot: CartSnapshot) {
        self.id = snapshot.id;
        self.created_at = snapshot.created_at;
        self.updated_at = snapshot.updated_at;
        for line in snapshot.lines {
            if line.quantity == 0 {
                tracing::warn!(product_id = %line.product.id, "Dropping persisted line with zero quantity");
                continue;
            }
            self.items.insert(line.product.id, line);
        }
        self.recompute_totals();
    }

    /// The cart's identifier.
    #[must_use]
    pub const fn id(&self) -> CartId {
        self.id
    }

    /// The currency all lines are priced in.
    #[must_use]
    pub const fn currency(&self) -> CurrencyCode {
        self.currency
    }

    /// When the cart was created.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// When the cart was last mutated.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Current totals snapshot. Pure read, no side effects.
    #[must_use]
    pub const fn totals(&self) -> CartTotals {
        self.totals
    }

    /// Iterate the cart lines in product-ID order.
    pub fn items(&self) -> impl Iterator<Item = &CartItem> {
        self.items.values()
    }

    /// Look up the line for a product, if present.
    #[must_use]
    pub fn get(&self, product_id: ProductId) -> Option<&CartItem> {
        self.items.get(&product_id)
    }

    /// Number of distinct lines (not the unit count - see [`Self::totals`]).
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// `true` if the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// `true` if the cart has a line for the product.
    #[must_use]
    pub fn contains(&self, product_id: ProductId) -> bool {
        self.items.contains_key(&product_id)
    }

    /// Add units of a product to the cart.
    ///
    /// If the product already has a line its quantity is incremented and
    /// the original snapshot kept; duplicate adds merge, they never error.
    /// A zero quantity adds a single unit, mirroring the add-to-cart form's
    /// default.
    #[instrument(skip(self, product), fields(cart_id = %self.id, product_id = %product.id))]
    pub fn add_item(&mut self, product: ProductRef, quantity: u32) {
        let quantity = quantity.max(1);

        if product.price.currency() != self.currency {
            debug_assert_eq!(
                product.price.currency(),
                self.currency,
                "a cart prices all lines in one currency"
            );
            tracing::warn!(
                line_currency = %product.price.currency(),
                cart_currency = %self.currency,
                "Adding product priced in a foreign currency; amounts merged by minor units"
            );
        }

        let product_id = product.id;
        match self.items.entry(product_id) {
            Entry::Occupied(mut entry) => {
                let line = entry.get_mut();
                line.quantity = line.quantity.saturating_add(quantity);
            }
            Entry::Vacant(entry) => {
                entry.insert(CartItem { product, quantity });
            }
        }

        self.committed(CartEventKind::ItemAdded { product_id });
    }

    /// Remove a product's line entirely.
    ///
    /// Removing an absent product is a no-op, not an error; nothing is
    /// notified or persisted in that case. Returns the removed line.
    #[instrument(skip(self), fields(cart_id = %self.id))]
    pub fn remove_item(&mut self, product_id: ProductId) -> Option<CartItem> {
        let removed = self.items.remove(&product_id)?;
        self.committed(CartEventKind::ItemRemoved { product_id });
        Some(removed)
    }

    /// Overwrite the quantity of an existing line.
    ///
    /// A quantity below 1 fails with [`CartError::InvalidQuantity`] and
    /// leaves the cart untouched - the store never silently clamps. An
    /// absent product is a no-op `Ok`. Setting the quantity a line already
    /// has changes nothing and notifies no one.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::InvalidQuantity`] when `quantity` is zero.
    #[instrument(skip(self), fields(cart_id = %self.id))]
    pub fn change_item_quantity(
        &mut self,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<(), CartError> {
        if quantity < 1 {
            return Err(CartError::InvalidQuantity {
                requested: quantity,
            });
        }

        if let Some(line) = self.items.get_mut(&product_id) {
            if line.quantity != quantity {
                line.quantity = quantity;
                self.committed(CartEventKind::QuantityChanged { product_id });
            }
        }

        Ok(())
    }

    /// Empty the cart and reset totals to zero.
    ///
    /// Used on successful purchase and on logout. Persistent storage is
    /// cleared as well. Clearing an already-empty cart notifies no one.
    #[instrument(skip(self), fields(cart_id = %self.id))]
    pub fn clear(&mut self) {
        let had_items = !self.items.is_empty();

        self.items.clear();
        self.totals = CartTotals::zero(self.currency);

        if let Some(storage) = &self.storage {
            if let Err(e) = storage.clear() {
                tracing::warn!("Failed to clear persisted cart: {e}");
            }
        }

        if had_items {
            self.updated_at = Utc::now();
            let event = CartEvent {
                kind: CartEventKind::Cleared,
                totals: self.totals,
            };
            self.listeners.notify(&event);
        }
    }

    /// Subscribe to change notifications.
    ///
    /// The listener runs synchronously after every mutation that changed
    /// state, in subscription order. No-op mutations do not notify.
    pub fn subscribe(
        &mut self,
        listener: impl FnMut(&CartEvent) + Send + 'static,
    ) -> SubscriptionId {
        self.listeners.subscribe(listener)
    }

    /// Detach a listener. Returns `false` for an unknown or stale handle.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.listeners.unsubscribe(id)
    }

    /// Serializable record of the current cart contents.
    #[must_use]
    pub fn snapshot(&self) -> CartSnapshot {
        CartSnapshot {
            id: self.id,
            currency: self.currency,
            lines: self.items.values().cloned().collect(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    /// Finish a state-changing mutation: recompute derived totals, stamp,
    /// persist best-effort, notify.
    fn committed(&mut self, kind: CartEventKind) {
        self.recompute_totals();
        self.updated_at = Utc::now();

        if let Some(storage) = &self.storage {
            if let Err(e) = storage.save(&self.snapshot()) {
                tracing::warn!("Failed to persist cart: {e}");
            }
        }

        let event = CartEvent {
            kind,
            totals: self.totals,
        };
        self.listeners.notify(&event);
    }

    fn recompute_totals(&mut self) {
        let mut count: u32 = 0;
        let mut minor_units: i64 = 0;
        for line in self.items.values() {
            count = count.saturating_add(line.quantity);
            minor_units = minor_units.saturating_add(line.line_total().minor_units());
        }
        self.totals = CartTotals {
            count,
            price: Price::from_minor_units(minor_units, self.currency),
        };
    }
}

impl fmt::Debug for CartStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CartStore")
            .field("id", &self.id)
            .field("currency", &self.currency)
            .field("lines", &self.items.len())
            .field("totals", &self.totals)
            .field("subscribers", &self.listeners.len())
            .field("persistent", &self.storage.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    use proptest::prelude::*;

    use super::*;

    fn product(id: i32, cents: i64) -> ProductRef {
        ProductRef::new(
            ProductId::new(id),
            format!("product-{id}"),
            Price::from_minor_units(cents, CurrencyCode::USD),
        )
    }

    #[test]
    fn test_totals_worked_example() {
        // Product A at 809.00 and product B at 442.00, one unit each.
        let mut cart = CartStore::new(CurrencyCode::USD);
        cart.add_item(product(1, 80_900), 1);
        cart.add_item(product(2, 44_200), 1);

        let totals = cart.totals();
        assert_eq!(totals.count, 2);
        assert_eq!(
            totals.price,
            Price::from_minor_units(125_100, CurrencyCode::USD)
        );
        assert_eq!(totals.price.to_string(), "$1,251.00");
    }

    #[test]
    fn test_duplicate_add_merges_quantities() {
        let mut cart = CartStore::new(CurrencyCode::USD);
        cart.add_item(product(1, 1_000), 2);
        cart.add_item(product(1, 1_000), 3);

        assert_eq!(cart.len(), 1);
        assert_eq!(cart.get(ProductId::new(1)).unwrap().quantity, 5);
        assert_eq!(cart.totals().count, 5);
        assert_eq!(
            cart.totals().price,
            Price::from_minor_units(5_000, CurrencyCode::USD)
        );
    }

    #[test]
    fn test_merge_keeps_original_snapshot() {
        let mut cart = CartStore::new(CurrencyCode::USD);
        cart.add_item(product(1, 1_000), 1);

        let mut renamed = product(1, 1_000);
        renamed.title = "renamed".to_string();
        cart.add_item(renamed, 1);

        assert_eq!(cart.get(ProductId::new(1)).unwrap().product.title, "product-1");
    }

    #[test]
    fn test_add_with_zero_quantity_adds_one_unit() {
        let mut cart = CartStore::new(CurrencyCode::USD);
        cart.add_item(product(1, 1_000), 0);
        assert_eq!(cart.totals().count, 1);
    }

    #[test]
    fn test_remove_returns_line_and_recomputes() {
        let mut cart = CartStore::new(CurrencyCode::USD);
        cart.add_item(product(1, 1_000), 2);
        cart.add_item(product(2, 500), 1);

        let removed = cart.remove_item(ProductId::new(1)).unwrap();
        assert_eq!(removed.quantity, 2);
        assert_eq!(cart.totals().count, 1);
        assert_eq!(
            cart.totals().price,
            Price::from_minor_units(500, CurrencyCode::USD)
        );
    }

    #[test]
    fn test_remove_absent_is_idempotent() {
        let mut cart = CartStore::new(CurrencyCode::USD);
        cart.add_item(product(1, 1_000), 1);
        let before = cart.totals();

        assert!(cart.remove_item(ProductId::new(99)).is_none());
        assert_eq!(cart.totals(), before);
        assert_eq!(cart.len(), 1);
    }

    #[test]
    fn test_change_quantity_overwrites() {
        let mut cart = CartStore::new(CurrencyCode::USD);
        cart.add_item(product(1, 1_000), 2);

        cart.change_item_quantity(ProductId::new(1), 7).unwrap();
        assert_eq!(cart.get(ProductId::new(1)).unwrap().quantity, 7);
        assert_eq!(cart.totals().count, 7);
    }

    #[test]
    fn test_change_quantity_rejects_zero() {
        let mut cart = CartStore::new(CurrencyCode::USD);
        cart.add_item(product(1, 1_000), 2);
        let before = cart.totals();

        let err = cart.change_item_quantity(ProductId::new(1), 0).unwrap_err();
        assert_eq!(err, CartError::InvalidQuantity { requested: 0 });
        assert_eq!(cart.totals(), before);
        assert_eq!(cart.get(ProductId::new(1)).unwrap().quantity, 2);
    }

    #[test]
    fn test_change_quantity_absent_is_noop_ok() {
        let mut cart = CartStore::new(CurrencyCode::USD);
        cart.add_item(product(1, 1_000), 1);
        let before = cart.totals();

        cart.change_item_quantity(ProductId::new(99), 3).unwrap();
        assert_eq!(cart.totals(), before);
        assert!(!cart.contains(ProductId::new(99)));
    }

    #[test]
    fn test_clear_resets_totals() {
        let mut cart = CartStore::new(CurrencyCode::USD);
        cart.add_item(product(1, 80_900), 1);
        cart.add_item(product(2, 44_200), 3);

        cart.clear();
        assert!(cart.is_empty());
        assert_eq!(cart.totals(), CartTotals::zero(CurrencyCode::USD));
    }

    #[test]
    fn test_listeners_observe_mutations_with_totals() {
        let events = Arc::new(AtomicU32::new(0));
        let mut cart = CartStore::new(CurrencyCode::USD);

        let observed = Arc::clone(&events);
        cart.subscribe(move |event: &CartEvent| {
            observed.fetch_add(1, Ordering::SeqCst);
            // Totals in the event always match a recompute over the lines.
            assert_eq!(event.totals.price.currency(), CurrencyCode::USD);
        });

        cart.add_item(product(1, 1_000), 1); // ItemAdded
        cart.change_item_quantity(ProductId::new(1), 4).unwrap(); // QuantityChanged
        cart.remove_item(ProductId::new(1)); // ItemRemoved
        cart.clear(); // empty cart: no event

        assert_eq!(events.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_noop_mutations_do_not_notify() {
        let events = Arc::new(AtomicU32::new(0));
        let mut cart = CartStore::new(CurrencyCode::USD);
        cart.add_item(product(1, 1_000), 2);

        let observed = Arc::clone(&events);
        cart.subscribe(move |_: &CartEvent| {
            observed.fetch_add(1, Ordering::SeqCst);
        });

        cart.remove_item(ProductId::new(99));
        cart.change_item_quantity(ProductId::new(99), 3).unwrap();
        cart.change_item_quantity(ProductId::new(1), 2).unwrap(); // same quantity

        assert_eq!(events.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_unsubscribe_stops_notifications() {
        let events = Arc::new(AtomicU32::new(0));
        let mut cart = CartStore::new(CurrencyCode::USD);

        let observed = Arc::clone(&events);
        let id = cart.subscribe(move |_: &CartEvent| {
            observed.fetch_add(1, Ordering::SeqCst);
        });

        cart.add_item(product(1, 1_000), 1);
        assert!(cart.unsubscribe(id));
        cart.add_item(product(2, 1_000), 1);

        assert_eq!(events.load(Ordering::SeqCst), 1);
    }

    /// Unit price derived from the ID so duplicate adds carry identical
    /// snapshots and the aggregation invariant holds across merges.
    fn cents_for(id: i32) -> i64 {
        i64::from(id) * 100 + 50
    }

    proptest! {
        #[test]
        fn totals_match_sums_over_add_sequences(
            adds in proptest::collection::vec((1..50_i32, 1..10_u32), 0..40)
        ) {
            let mut cart = CartStore::new(CurrencyCode::USD);
            let mut expected_count: u32 = 0;
            let mut expected_minor: i64 = 0;

            for (id, quantity) in adds {
                cart.add_item(product(id, cents_for(id)), quantity);
                expected_count += quantity;
                expected_minor += cents_for(id) * i64::from(quantity);
            }

            let totals = cart.totals();
            prop_assert_eq!(totals.count, expected_count);
            prop_assert_eq!(totals.price.minor_units(), expected_minor);
            prop_assert_eq!(totals.price.currency(), CurrencyCode::USD);
        }
    }
}
