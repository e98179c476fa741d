//! Cartwheel Core - Shared types library.
//!
//! This crate provides the domain types used across all Cartwheel components:
//! - `store` - Client-side state containers (cart, filters, debounce)
//! - `integration-tests` - Cross-crate flow tests
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no timers, no state
//! containers. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, prices, and product
//!   snapshots

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
