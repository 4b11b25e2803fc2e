//! Storage key names and per-user namespacing.

use serde::{Deserialize, Serialize};

/// Every key the persistence layer knows about.
///
/// The string names match what existing client stores already contain, so
/// they must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StorageKey {
    CurrentUser,
    IsLoggedIn,
    ApiKey,
    RememberedEmail,
    RecentSearches,
    FavoriteMovies,
    UserPreferences,
    Users,
}

impl StorageKey {
    pub const ALL: [StorageKey; 8] = [
        StorageKey::CurrentUser,
        StorageKey::IsLoggedIn,
        StorageKey::ApiKey,
        StorageKey::RememberedEmail,
        StorageKey::RecentSearches,
        StorageKey::FavoriteMovies,
        StorageKey::UserPreferences,
        StorageKey::Users,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            StorageKey::CurrentUser => "currentUser",
            StorageKey::IsLoggedIn => "isLoggedIn",
            StorageKey::ApiKey => "TMDB-Key",
            StorageKey::RememberedEmail => "rememberedEmail",
            StorageKey::RecentSearches => "recentSearches",
            StorageKey::FavoriteMovies => "favoriteMovies",
            StorageKey::UserPreferences => "userPreferences",
            StorageKey::Users => "users",
        }
    }

    /// Whether the key is stored once per signed-in user.
    pub fn is_per_user(self) -> bool {
        matches!(
            self,
            StorageKey::RecentSearches | StorageKey::FavoriteMovies | StorageKey::UserPreferences
        )
    }

    /// Resolves the physical key for `namespace`.
    ///
    /// Per-user keys are prefixed with `"{namespace}_"`; without a namespace,
    /// and for global keys, the bare name is used.
    pub fn resolve(self, namespace: Option<&str>) -> String {
        match namespace {
            Some(user) if self.is_per_user() => format!("{user}_{}", self.as_str()),
            _ => self.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for StorageKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
