//! Favorite movies of the signed-in user.
//!
//! Favorites are stored as the full catalog records so the "my list" view
//! can render without going back to the network. The store is the single
//! source of truth: nothing here caches, and every call re-reads it.

use log::warn;
use serde_json::Value as JsonValue;

use crate::app_response::AppResponse;
use crate::movie_model::MovieId;
use crate::storage_area::StorageArea;
use crate::storage_keys::StorageKey;
use crate::user_storage::UserStorage;

/// View over the `favoriteMovies` collection.
pub struct Favorites<'a, S: StorageArea> {
    storage: &'a UserStorage<S>,
}

impl<'a, S: StorageArea> Favorites<'a, S> {
    pub(crate) fn new(storage: &'a UserStorage<S>) -> Self {
        Self { storage }
    }

    /// Adds `movie` unless a favorite with the same id already exists.
    ///
    /// Records without an identifiable `id` are rejected: the current set is
    /// returned unchanged and a warning is logged.
    pub fn add(&self, movie: &JsonValue) -> Vec<JsonValue> {
        self.try_add(movie).unwrap_or_else(|e| {
            warn!("Error adding favorite movie: {e}");
            Vec::new()
        })
    }

    /// Removes the favorite with `id`. The collection is written back even
    /// when nothing matched.
    pub fn remove(&self, id: &MovieId) -> Vec<JsonValue> {
        self.try_remove(id).unwrap_or_else(|e| {
            warn!("Error removing favorite movie: {e}");
            Vec::new()
        })
    }

    pub fn get(&self) -> Vec<JsonValue> {
        self.load().unwrap_or_else(|e| {
            warn!("Error getting favorite movies: {e}");
            Vec::new()
        })
    }

    pub fn is_favorite(&self, id: &MovieId) -> bool {
        match self.load() {
            Ok(favorites) => favorites.iter().any(|movie| id.matches(movie)),
            Err(e) => {
                warn!("Error checking favorite status: {e}");
                false
            }
        }
    }

    /// Adds or removes `movie` depending on its current state. Returns
    /// whether it is a favorite afterwards.
    pub fn toggle(&self, movie: &JsonValue) -> bool {
        let Some(id) = MovieId::of_record(movie) else {
            warn!("Cannot toggle favorite: movie record has no usable id");
            return false;
        };
        if self.is_favorite(&id) {
            self.remove(&id);
            false
        } else {
            self.add(movie).iter().any(|m| id.matches(m))
        }
    }

    pub fn clear(&self) {
        if let Err(e) = self.storage.remove(StorageKey::FavoriteMovies) {
            warn!("Error clearing favorites: {e}");
        }
    }

    fn try_add(&self, movie: &JsonValue) -> Result<Vec<JsonValue>, AppResponse> {
        let mut favorites = self.load()?;
        let Some(id) = MovieId::of_record(movie) else {
            warn!("Rejected favorite without a usable id");
            return Ok(favorites);
        };

        if favorites.iter().any(|existing| id.matches(existing)) {
            return Ok(favorites);
        }

        favorites.push(movie.clone());
        self.storage.write_json(StorageKey::FavoriteMovies, &favorites)?;
        Ok(favorites)
    }

    fn try_remove(&self, id: &MovieId) -> Result<Vec<JsonValue>, AppResponse> {
        let mut favorites = self.load()?;
        favorites.retain(|movie| !id.matches(movie));
        self.storage.write_json(StorageKey::FavoriteMovies, &favorites)?;
        Ok(favorites)
    }

    fn load(&self) -> Result<Vec<JsonValue>, AppResponse> {
        Ok(self
            .storage
            .read_json(StorageKey::FavoriteMovies)?
            .unwrap_or_default())
    }
}
