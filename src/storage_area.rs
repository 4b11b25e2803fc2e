//! Flat string-keyed storage substrate.
//!
//! Everything the persistence layer keeps lives in a single flat map of
//! string keys to string values, the same shape as browser `localStorage`.
//! [`StorageArea`] is the seam: production code uses the LMDB-backed
//! [`LmdbStorage`](crate::lmdb_storage::LmdbStorage), tests and ephemeral
//! sessions use [`MemoryStorage`].

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use crate::app_response::AppResponse;

/// Synchronous key-value store with `localStorage` semantics.
///
/// Every call is independent; there are no multi-key transactions, and two
/// handles writing the same key race with last-write-wins semantics.
pub trait StorageArea: Send + Sync {
    /// Returns the stored value, or `None` when the key is absent.
    fn get_item(&self, key: &str) -> Result<Option<String>, AppResponse>;

    fn set_item(&self, key: &str, value: &str) -> Result<(), AppResponse>;

    /// Removes the key. Removing an absent key is not an error.
    fn remove_item(&self, key: &str) -> Result<(), AppResponse>;

    /// Removes every key.
    fn clear(&self) -> Result<(), AppResponse>;

    /// Lists all keys currently stored, in ascending order.
    fn keys(&self) -> Result<Vec<String>, AppResponse>;
}

/// In-memory [`StorageArea`], used for tests and for sessions that must not
/// touch disk.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: Mutex<BTreeMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, BTreeMap<String, String>>, AppResponse> {
        self.items
            .lock()
            .map_err(|_| AppResponse::DatabaseError("Memory storage lock poisoned".to_string()))
    }
}

impl StorageArea for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, AppResponse> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), AppResponse> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), AppResponse> {
        self.lock()?.remove(key);
        Ok(())
    }

    fn clear(&self) -> Result<(), AppResponse> {
        self.lock()?.clear();
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, AppResponse> {
        Ok(self.lock()?.keys().cloned().collect())
    }
}

impl<S: StorageArea + ?Sized> StorageArea for std::sync::Arc<S> {
    fn get_item(&self, key: &str) -> Result<Option<String>, AppResponse> {
        (**self).get_item(key)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), AppResponse> {
        (**self).set_item(key, value)
    }

    fn remove_item(&self, key: &str) -> Result<(), AppResponse> {
        (**self).remove_item(key)
    }

    fn clear(&self) -> Result<(), AppResponse> {
        (**self).clear()
    }

    fn keys(&self) -> Result<Vec<String>, AppResponse> {
        (**self).keys()
    }
}
