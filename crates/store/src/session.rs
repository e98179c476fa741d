//! Session-scoped store lifecycle.
//!
//! Client state is never ambient: a [`SessionStores`] value is constructed
//! when a session begins and handed by reference to whatever consumes it.
//! Cart contents are created at session or login scope, emptied on
//! successful purchase, and emptied again on logout.

use cartwheel_core::{CurrencyCode, UserId};
use tracing::instrument;

use crate::cart::CartStore;
use crate::filter::FilterStore;
use crate::persist::CartStorage;

/// The client-state containers owned by one session.
#[derive(Debug)]
pub struct SessionStores {
    user: Option<UserId>,
    /// The session's shopping cart.
    pub cart: CartStore,
    /// The session's product filter criteria.
    pub filters: FilterStore,
}

impl SessionStores {
    /// Stores for a browsing session with no signed-in user.
    ///
    /// The cart is ephemeral: closing the session discards it.
    #[must_use]
    pub fn anonymous(currency: CurrencyCode) -> Self {
        Self {
            user: None,
            cart: CartStore::new(currency),
            filters: FilterStore::new(),
        }
    }

    /// Stores for a signed-in user, with the cart persistence policy the
    /// caller chose for them.
    #[must_use]
    pub fn signed_in(user: UserId, currency: CurrencyCode, storage: Box<dyn CartStorage>) -> Self {
        Self {
            user: Some(user),
            cart: CartStore::with_storage(currency, storage),
            filters: FilterStore::new(),
        }
    }

    /// The signed-in user, if any.
    #[must_use]
    pub const fn user(&self) -> Option<UserId> {
        self.user
    }

    /// A purchase went through: the bought lines leave the cart.
    ///
    /// Filter criteria survive - the shopper returns to the listing they
    /// were browsing.
    #[instrument(skip(self), fields(user = ?self.user))]
    pub fn complete_purchase(&mut self) {
        self.cart.clear();
    }

    /// End the signed-in session: cart emptied, filters reset, user gone.
    #[instrument(skip(self), fields(user = ?self.user))]
    pub fn sign_out(&mut self) {
        self.cart.clear();
        self.filters.reset();
        self.user = None;
    }
}
