//! Cartwheel Store - client-side state containers.
//!
//! The storefront UI keeps a small amount of state outside the page tree:
//! the shopping cart with its derived totals, the product filter criteria,
//! and a debounce wrapper that keeps bursty inputs (search typing, repeated
//! clicks) from flooding their consumers.
//!
//! Stores are plain owned values constructed at session scope and passed by
//! reference to whatever renders them - there is no ambient global state.
//! Consumers that need change notifications subscribe a listener and detach
//! it with the returned [`SubscriptionId`].
//!
//! # Modules
//!
//! - [`cart`] - Cart aggregation store with derived count/price totals
//! - [`filter`] - Product filter criteria for the home page listing
//! - [`debounce`] - Trailing-edge debounce for UI callbacks
//! - [`persist`] - Optional cart persistence across sessions
//! - [`session`] - Session-scoped store lifecycle (login, purchase, logout)

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod debounce;
pub mod error;
pub mod filter;
pub mod persist;
pub mod session;
pub mod subscription;

pub use cart::{CartEvent, CartEventKind, CartItem, CartStore, CartTotals};
pub use debounce::{Debounced, debounce};
pub use error::{CartError, StorageError};
pub use filter::{FilterEvent, FilterStore, ProductFilter};
pub use persist::{CartSnapshot, CartStorage, JsonFileStorage, MemoryStorage};
pub use session::SessionStores;
pub use subscription::SubscriptionId;
