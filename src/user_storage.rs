//! Per-user persistence over a flat [`StorageArea`].
//!
//! [`UserStorage`] binds a store to the identity of the signed-in user. The
//! identity is the namespace of the per-user collections (recent searches,
//! favorites, preferences); it is held explicitly on the handle and mirrored
//! to the `currentUser` key so a reopened handle resumes the same session.
//!
//! Storage faults never escape this layer: every public operation logs the
//! failure and degrades to an empty value. Fallible building blocks
//! (`read_json`, `write_json`, ...) return `Result<_, AppResponse>` and are
//! only used inside the crate.

use log::{info, warn};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::app_response::AppResponse;
use crate::auth::AuthService;
use crate::favorites::Favorites;
use crate::preferences::Preferences;
use crate::search_history::SearchHistory;
use crate::storage_area::StorageArea;
use crate::storage_keys::StorageKey;

pub struct UserStorage<S: StorageArea> {
    store: S,
    namespace: Option<String>,
}

/// Presence of one key in a [`StorageStatus`] report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyStatus {
    pub key: String,
    pub exists: bool,
}

/// Snapshot of which session keys are present in the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageStatus {
    /// At least three of the checked keys are present.
    pub is_complete: bool,
    pub status: Vec<KeyStatus>,
    pub current_user: Option<String>,
}

impl<S: StorageArea> UserStorage<S> {
    /// Wraps `store`, restoring the session identity persisted in it.
    pub fn open(store: S) -> Self {
        let namespace = match store.get_item(StorageKey::CurrentUser.as_str()) {
            Ok(user) => user.filter(|u| !u.trim().is_empty()),
            Err(e) => {
                warn!("Could not restore current user: {e}");
                None
            }
        };
        if let Some(user) = &namespace {
            info!("Restored session for {user}");
        }
        Self { store, namespace }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// The identity collections are namespaced under, if a user is signed in.
    pub fn current_user(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Physical storage key of `key` for the current namespace.
    pub fn key(&self, key: StorageKey) -> String {
        key.resolve(self.current_user())
    }

    pub fn search_history(&self) -> SearchHistory<'_, S> {
        SearchHistory::new(self)
    }

    pub fn favorites(&self) -> Favorites<'_, S> {
        Favorites::new(self)
    }

    pub fn preferences(&self) -> Preferences<'_, S> {
        Preferences::new(self)
    }

    pub fn auth(&mut self) -> AuthService<'_, S> {
        AuthService::new(self)
    }

    /// Records `identity` as the active user and binds the namespace.
    ///
    /// Blank identities are rejected with a warning and leave the session
    /// untouched. Returns whether the identity was recorded.
    pub fn init_user(&mut self, identity: &str) -> bool {
        let identity = identity.trim();
        if identity.is_empty() {
            warn!("Refusing to initialize session with an empty identity");
            return false;
        }

        match self.store.set_item(StorageKey::CurrentUser.as_str(), identity) {
            Ok(()) => {
                info!("Session initialized for {identity}");
                self.namespace = Some(identity.to_string());
                true
            }
            Err(e) => {
                warn!("Error initializing user {identity}: {e}");
                false
            }
        }
    }

    /// Full logout wipe.
    ///
    /// Removes the current user's collections and every recognized global
    /// key, including the credential table, then unbinds the namespace.
    pub fn clear_user_data(&mut self) {
        let mut keys: Vec<String> = StorageKey::ALL
            .iter()
            .filter(|key| key.is_per_user())
            .map(|key| self.key(*key))
            .collect();
        keys.extend(StorageKey::ALL.iter().map(|key| key.as_str().to_string()));

        for key in &keys {
            if let Err(e) = self.store.remove_item(key) {
                warn!("Error clearing user data key '{key}': {e}");
            }
        }

        if let Some(user) = self.namespace.take() {
            info!("Cleared all stored data for {user}");
        }
    }

    /// API key of the signed-in user, if any.
    pub fn api_key(&self) -> Option<String> {
        match self.store.get_item(StorageKey::ApiKey.as_str()) {
            Ok(key) => key.filter(|k| !k.is_empty()),
            Err(e) => {
                warn!("Error reading API key: {e}");
                None
            }
        }
    }

    /// Drops the login flag and the API key.
    ///
    /// Used when the metadata API rejects the key: the session is over and
    /// the user must sign in again.
    pub fn invalidate_credentials(&self) {
        for key in [StorageKey::IsLoggedIn, StorageKey::ApiKey] {
            if let Err(e) = self.store.remove_item(key.as_str()) {
                warn!("Error removing '{key}' while invalidating credentials: {e}");
            }
        }
        info!("Stored credentials invalidated");
    }

    pub fn storage_status(&self) -> StorageStatus {
        let checked = [
            StorageKey::IsLoggedIn,
            StorageKey::ApiKey,
            StorageKey::FavoriteMovies,
            StorageKey::RecentSearches,
            StorageKey::UserPreferences,
        ];

        let mut status = Vec::with_capacity(checked.len());
        for key in checked {
            let key = self.key(key);
            match self.store.get_item(&key) {
                Ok(value) => status.push(KeyStatus { exists: value.is_some(), key }),
                Err(e) => {
                    warn!("Error checking storage status: {e}");
                    return StorageStatus {
                        is_complete: false,
                        status: Vec::new(),
                        current_user: None,
                    };
                }
            }
        }

        StorageStatus {
            is_complete: status.iter().filter(|s| s.exists).count() >= 3,
            status,
            current_user: self.namespace.clone(),
        }
    }

    pub(crate) fn read_json<T: DeserializeOwned>(
        &self,
        key: StorageKey,
    ) -> Result<Option<T>, AppResponse> {
        match self.store.get_item(&self.key(key))? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    pub(crate) fn write_json<T: Serialize + ?Sized>(
        &self,
        key: StorageKey,
        value: &T,
    ) -> Result<(), AppResponse> {
        let raw = serde_json::to_string(value)?;
        self.store.set_item(&self.key(key), &raw)
    }

    pub(crate) fn remove(&self, key: StorageKey) -> Result<(), AppResponse> {
        self.store.remove_item(&self.key(key))
    }
}
