//! Cart persistence across browser sessions.
//!
//! Whether a cart outlives its session is a policy choice, not a fixed
//! behavior: a [`CartStore`](crate::cart::CartStore) built with
//! `CartStore::new` is ephemeral, one built with `CartStore::with_storage`
//! restores the previous snapshot and saves after every mutation. The store
//! treats persistence as best-effort - a failing backend degrades to an
//! ephemeral cart with a warning, never a failing mutation.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use cartwheel_core::{CartId, CurrencyCode};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::cart::CartItem;
use crate::error::StorageError;

/// Serializable record of a cart's contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartSnapshot {
    /// Identifier of the cart the snapshot was taken from.
    pub id: CartId,
    /// Currency the lines are priced in.
    pub currency: CurrencyCode,
    /// The cart lines in iteration order.
    pub lines: Vec<CartItem>,
    /// When the cart was created.
    pub created_at: DateTime<Utc>,
    /// When the cart was last mutated.
    pub updated_at: DateTime<Utc>,
}

/// Backend a cart saves its snapshot to.
pub trait CartStorage: Send {
    /// Load the stored snapshot, or `None` if nothing is stored.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the backend cannot be read or the stored
    /// snapshot cannot be decoded.
    fn load(&self) -> Result<Option<CartSnapshot>, StorageError>;

    /// Replace the stored snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the snapshot cannot be encoded or the
    /// backend cannot be written.
    fn save(&self, snapshot: &CartSnapshot) -> Result<(), StorageError>;

    /// Remove any stored snapshot. Clearing an empty backend succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the backend cannot be written.
    fn clear(&self) -> Result<(), StorageError>;
}

/// Snapshot stored as a JSON file on disk.
///
/// The desktop analog of browser local storage. Saves write a sibling temp
/// file and rename it over the target, so a crash mid-save leaves the old
/// snapshot intact rather than a torn file.
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    /// Storage at the given file path. The parent directory must exist.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The file the snapshot is stored at.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CartStorage for JsonFileStorage {
    fn load(&self) -> Result<Option<CartSnapshot>, StorageError> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, snapshot: &CartSnapshot) -> Result<(), StorageError> {
        let json = serde_json::to_vec_pretty(snapshot)?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, &json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Snapshot held in memory.
///
/// Useful in tests and for short-lived kiosk sessions where "persistence"
/// only needs to span store instances, not processes. Clones share the
/// same slot.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    slot: Arc<Mutex<Option<CartSnapshot>>>,
}

impl MemoryStorage {
    /// An empty in-memory slot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl CartStorage for MemoryStorage {
    fn load(&self) -> Result<Option<CartSnapshot>, StorageError> {
        Ok(self.slot.lock().clone())
    }

    fn save(&self, snapshot: &CartSnapshot) -> Result<(), StorageError> {
        *self.slot.lock() = Some(snapshot.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        *self.slot.lock() = None;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use cartwheel_core::{Price, ProductId, ProductRef};

    use super::*;

    fn snapshot() -> CartSnapshot {
        let now = Utc::now();
        CartSnapshot {
            id: CartId::new(),
            currency: CurrencyCode::USD,
            lines: vec![CartItem {
                product: ProductRef::new(
                    ProductId::new(1),
                    "product-1".to_string(),
                    Price::from_minor_units(80_900, CurrencyCode::USD),
                ),
                quantity: 2,
            }],
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_json_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonFileStorage::new(dir.path().join("cart.json"));

        assert!(storage.load().unwrap().is_none());

        let snap = snapshot();
        storage.save(&snap).unwrap();
        assert_eq!(storage.load().unwrap(), Some(snap));
    }

    #[test]
    fn test_json_file_save_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonFileStorage::new(dir.path().join("cart.json"));

        let mut snap = snapshot();
        storage.save(&snap).unwrap();

        snap.lines.clear();
        storage.save(&snap).unwrap();
        assert_eq!(storage.load().unwrap().unwrap().lines.len(), 0);
    }

    #[test]
    fn test_json_file_clear_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonFileStorage::new(dir.path().join("cart.json"));

        storage.save(&snapshot()).unwrap();
        storage.clear().unwrap();
        storage.clear().unwrap();
        assert!(storage.load().unwrap().is_none());
        assert!(!storage.path().exists());
    }

    #[test]
    fn test_json_file_load_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cart.json");
        fs::write(&path, b"not json").unwrap();

        let storage = JsonFileStorage::new(path);
        assert!(matches!(
            storage.load(),
            Err(StorageError::Serialization(_))
        ));
    }

    #[test]
    fn test_memory_storage_shares_slot_across_clones() {
        let storage = MemoryStorage::new();
        let view = storage.clone();

        storage.save(&snapshot()).unwrap();
        assert!(view.load().unwrap().is_some());

        view.clear().unwrap();
        assert!(storage.load().unwrap().is_none());
    }
}
