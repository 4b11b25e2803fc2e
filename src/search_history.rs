//! Recent search terms of the signed-in user.

use log::warn;

use crate::app_response::AppResponse;
use crate::storage_area::StorageArea;
use crate::storage_keys::StorageKey;
use crate::user_storage::UserStorage;

/// Maximum number of remembered search terms.
pub const MAX_RECENT_SEARCHES: usize = 5;

/// View over the `recentSearches` collection.
///
/// The list is most-recent-first, holds no duplicates, never holds blank
/// terms and is never longer than [`MAX_RECENT_SEARCHES`].
pub struct SearchHistory<'a, S: StorageArea> {
    storage: &'a UserStorage<S>,
}

impl<'a, S: StorageArea> SearchHistory<'a, S> {
    pub(crate) fn new(storage: &'a UserStorage<S>) -> Self {
        Self { storage }
    }

    /// Records a submitted search and returns the updated list.
    ///
    /// The term is trimmed; a blank term leaves the history untouched. A
    /// term already present moves to the front.
    pub fn add(&self, term: &str) -> Vec<String> {
        self.try_add(term).unwrap_or_else(|e| {
            warn!("Error adding search term: {e}");
            Vec::new()
        })
    }

    pub fn get(&self) -> Vec<String> {
        self.load().unwrap_or_else(|e| {
            warn!("Error getting search history: {e}");
            Vec::new()
        })
    }

    /// Removes every occurrence of `term` (exact match) and returns the
    /// updated list.
    pub fn remove(&self, term: &str) -> Vec<String> {
        self.try_remove(term).unwrap_or_else(|e| {
            warn!("Error removing search term: {e}");
            Vec::new()
        })
    }

    pub fn clear(&self) {
        if let Err(e) = self.storage.remove(StorageKey::RecentSearches) {
            warn!("Error clearing search history: {e}");
        }
    }

    fn try_add(&self, term: &str) -> Result<Vec<String>, AppResponse> {
        let searches = self.load()?;
        let term = term.trim();
        if term.is_empty() {
            return Ok(searches);
        }

        let mut updated = Vec::with_capacity(MAX_RECENT_SEARCHES);
        updated.push(term.to_string());
        updated.extend(searches.into_iter().filter(|existing| existing != term));
        updated.truncate(MAX_RECENT_SEARCHES);

        self.storage.write_json(StorageKey::RecentSearches, &updated)?;
        Ok(updated)
    }

    fn try_remove(&self, term: &str) -> Result<Vec<String>, AppResponse> {
        let mut searches = self.load()?;
        searches.retain(|existing| existing != term);
        self.storage.write_json(StorageKey::RecentSearches, &searches)?;
        Ok(searches)
    }

    /// Stored list with blank entries dropped, so values written by older
    /// clients cannot break the invariants.
    fn load(&self) -> Result<Vec<String>, AppResponse> {
        let searches: Vec<String> = self
            .storage
            .read_json(StorageKey::RecentSearches)?
            .unwrap_or_default();
        Ok(searches
            .into_iter()
            .filter(|term| !term.trim().is_empty())
            .collect())
    }
}
