//! Opaque per-user preferences.

use log::warn;
use serde_json::{Map, Value as JsonValue};

use crate::storage_area::StorageArea;
use crate::storage_keys::StorageKey;
use crate::user_storage::UserStorage;

/// View over the `userPreferences` record. Saving replaces the whole value.
pub struct Preferences<'a, S: StorageArea> {
    storage: &'a UserStorage<S>,
}

impl<'a, S: StorageArea> Preferences<'a, S> {
    pub(crate) fn new(storage: &'a UserStorage<S>) -> Self {
        Self { storage }
    }

    pub fn save(&self, preferences: &JsonValue) {
        if let Err(e) = self.storage.write_json(StorageKey::UserPreferences, preferences) {
            warn!("Error saving preferences: {e}");
        }
    }

    /// Stored preferences, or an empty object when none are stored or the
    /// stored value cannot be read.
    pub fn get(&self) -> JsonValue {
        match self.storage.read_json(StorageKey::UserPreferences) {
            Ok(Some(preferences)) => preferences,
            Ok(None) => JsonValue::Object(Map::new()),
            Err(e) => {
                warn!("Error getting preferences: {e}");
                JsonValue::Object(Map::new())
            }
        }
    }

    pub fn clear(&self) {
        if let Err(e) = self.storage.remove(StorageKey::UserPreferences) {
            warn!("Error clearing preferences: {e}");
        }
    }
}
