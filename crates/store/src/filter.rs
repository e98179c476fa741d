//! Product filter state for the home-page listing.
//!
//! Criteria are combined with AND: a product must match the title search,
//! the selected category, and the price bounds to pass. An unset criterion
//! never excludes anything, so the default filter passes the whole catalog.

use core::fmt;

use cartwheel_core::{CategoryId, Price, ProductRef};
use tracing::instrument;

use crate::subscription::{Listeners, SubscriptionId};

/// Filtering criteria applied to the product list.
///
/// Price bounds are inclusive and compared by minor units; the catalog and
/// the bounds are assumed to share one currency, like the cart.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProductFilter {
    /// Case-insensitive title substring.
    pub title: Option<String>,
    /// Exact category match.
    pub category: Option<CategoryId>,
    /// Lowest unit price allowed, inclusive.
    pub min_price: Option<Price>,
    /// Highest unit price allowed, inclusive.
    pub max_price: Option<Price>,
}

impl ProductFilter {
    /// `true` if the product passes every set criterion.
    #[must_use]
    pub fn matches(&self, product: &ProductRef) -> bool {
        if let Some(title) = &self.title {
            if !product
                .title
                .to_lowercase()
                .contains(&title.to_lowercase())
            {
                return false;
            }
        }

        if let Some(category) = self.category {
            if product.category != Some(category) {
                return false;
            }
        }

        if let Some(min) = self.min_price {
            if product.price.minor_units() < min.minor_units() {
                return false;
            }
        }

        if let Some(max) = self.max_price {
            if product.price.minor_units() > max.minor_units() {
                return false;
            }
        }

        true
    }

    /// `true` if no criterion is set.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.category.is_none()
            && self.min_price.is_none()
            && self.max_price.is_none()
    }
}

/// Change notification carrying the new criteria.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterEvent {
    /// The criteria after the change.
    pub filter: ProductFilter,
}

/// Store holding the current filter criteria.
///
/// Setters take `Option` so a single criterion can be cleared without
/// resetting the rest. Setting a criterion to the value it already has
/// changes nothing and notifies no one.
#[derive(Default)]
pub struct FilterStore {
    filter: ProductFilter,
    listeners: Listeners<FilterEvent>,
}

impl FilterStore {
    /// An empty filter: everything passes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The current criteria.
    #[must_use]
    pub const fn filter(&self) -> &ProductFilter {
        &self.filter
    }

    /// Set or clear the title search.
    ///
    /// Blank input clears the criterion - the search box emits an empty
    /// string when erased.
    #[instrument(skip(self))]
    pub fn set_title(&mut self, title: Option<String>) {
        let title = title.filter(|t| !t.trim().is_empty());
        if self.filter.title != title {
            self.filter.title = title;
            self.changed();
        }
    }

    /// Set or clear the category.
    #[instrument(skip(self))]
    pub fn set_category(&mut self, category: Option<CategoryId>) {
        if self.filter.category != category {
            self.filter.category = category;
            self.changed();
        }
    }

    /// Set or clear the inclusive lower price bound.
    #[instrument(skip(self))]
    pub fn set_min_price(&mut self, min_price: Option<Price>) {
        if self.filter.min_price != min_price {
            self.filter.min_price = min_price;
            self.changed();
        }
    }

    /// Set or clear the inclusive upper price bound.
    #[instrument(skip(self))]
    pub fn set_max_price(&mut self, max_price: Option<Price>) {
        if self.filter.max_price != max_price {
            self.filter.max_price = max_price;
            self.changed();
        }
    }

    /// Clear every criterion at once.
    #[instrument(skip(self))]
    pub fn reset(&mut self) {
        if !self.filter.is_empty() {
            self.filter = ProductFilter::default();
            self.changed();
        }
    }

    /// The products passing the current criteria, in input order.
    #[must_use]
    pub fn apply<'a>(&self, products: &'a [ProductRef]) -> Vec<&'a ProductRef> {
        products.iter().filter(|p| self.filter.matches(p)).collect()
    }

    /// Subscribe to criteria changes.
    pub fn subscribe(
        &mut self,
        listener: impl FnMut(&FilterEvent) + Send + 'static,
    ) -> SubscriptionId {
        self.listeners.subscribe(listener)
    }

    /// Detach a listener. Returns `false` for an unknown or stale handle.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.listeners.unsubscribe(id)
    }

    fn changed(&mut self) {
        let event = FilterEvent {
            filter: self.filter.clone(),
        };
        self.listeners.notify(&event);
    }
}

impl fmt::Debug for FilterStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterStore")
            .field("filter", &self.filter)
            .field("subscribers", &self.listeners.len())
            .finish_non_exhaustive()
    }
}
