//! Store error types.

use thiserror::Error;

/// Errors raised by cart mutations.
///
/// Only [`CartStore::change_item_quantity`](crate::cart::CartStore::change_item_quantity)
/// is fallible; the other mutations are total over their domain.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum CartError {
    /// The requested quantity is below the minimum of 1.
    ///
    /// The store never clamps: the caller decides whether an invalid input
    /// is surfaced to the user or dropped.
    #[error("invalid quantity {requested}: a cart line holds at least 1 unit")]
    InvalidQuantity {
        /// The rejected quantity.
        requested: u32,
    },
}

/// Errors raised by cart persistence backends.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading or writing the backing store failed.
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// The snapshot could not be encoded or decoded.
    #[error("snapshot serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}
