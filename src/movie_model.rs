//! Movie record identity.
//!
//! Catalog records are kept as opaque JSON objects: the persistence layer
//! never interprets their fields except for `id`, which identifies a
//! favorite. [`MovieId`] is that identity.

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value as JsonValue};

/// Identifier of a movie record, as found in its `id` field.
///
/// The metadata API uses numeric ids, but records coming from other sources
/// may carry string ids. Numbers compare by value (`42.0` is `42`), but a
/// number never equals a string: `42` and `"42"` are different ids.
///
/// # Examples
///
/// ```rust
/// use movie_shelf_core::movie_model::MovieId;
/// use serde_json::json;
///
/// let movie = json!({"id": 42, "title": "Dune"});
/// assert_eq!(MovieId::of_record(&movie), Some(MovieId::from(42_i64)));
/// assert_ne!(MovieId::from(42_i64), MovieId::from("42"));
///
/// // Records without a usable id cannot become favorites.
/// assert_eq!(MovieId::of_record(&json!({"title": "untitled"})), None);
/// assert_eq!(MovieId::of_record(&json!({"id": ""})), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MovieId {
    Number(Number),
    Text(String),
}

impl MovieId {
    /// Interprets a bare JSON value as an id.
    ///
    /// Null, empty strings, zero and non-scalar values are not identifiable.
    pub fn from_value(value: &JsonValue) -> Option<Self> {
        Self::lookup(value).filter(|id| match id {
            MovieId::Number(n) => n.as_f64() != Some(0.0),
            MovieId::Text(s) => !s.is_empty(),
        })
    }

    /// Interprets any number or string as an id to search for. Unlike
    /// [`MovieId::from_value`], `0` and `""` are accepted; they simply never
    /// match a stored favorite.
    pub fn lookup(value: &JsonValue) -> Option<Self> {
        match value {
            JsonValue::Number(n) => Some(MovieId::Number(normalize(n))),
            JsonValue::String(s) => Some(MovieId::Text(s.clone())),
            _ => None,
        }
    }

    /// Extracts the id of a record (a JSON object with an `id` field).
    pub fn of_record(record: &JsonValue) -> Option<Self> {
        record.as_object()?.get("id").and_then(Self::from_value)
    }

    pub fn to_value(&self) -> JsonValue {
        match self {
            MovieId::Number(n) => JsonValue::Number(n.clone()),
            MovieId::Text(s) => JsonValue::String(s.clone()),
        }
    }

    /// Whether `record` carries this id.
    pub fn matches(&self, record: &JsonValue) -> bool {
        Self::of_record(record).as_ref() == Some(self)
    }
}

/// Integral floats become integers so `42.0` and `42` compare equal.
fn normalize(n: &Number) -> Number {
    const EXACT_LIMIT: f64 = 9_007_199_254_740_992.0;
    match n.as_f64() {
        Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < EXACT_LIMIT => {
            Number::from(f as i64)
        }
        _ => n.clone(),
    }
}

impl From<i64> for MovieId {
    fn from(id: i64) -> Self {
        MovieId::Number(Number::from(id))
    }
}

impl From<u64> for MovieId {
    fn from(id: u64) -> Self {
        MovieId::Number(Number::from(id))
    }
}

impl From<i32> for MovieId {
    fn from(id: i32) -> Self {
        MovieId::Number(Number::from(id))
    }
}

impl From<&str> for MovieId {
    fn from(id: &str) -> Self {
        MovieId::Text(id.to_string())
    }
}

impl From<String> for MovieId {
    fn from(id: String) -> Self {
        MovieId::Text(id)
    }
}

impl std::fmt::Display for MovieId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MovieId::Number(n) => write!(f, "{n}"),
            MovieId::Text(s) => f.write_str(s),
        }
    }
}
