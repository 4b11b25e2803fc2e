//! # Movie Shelf Core
//!
//! Local-first core of a movie browsing client. It keeps the client's
//! persistent state in a flat key-value store, drives the looping banner
//! carousel, and wraps the few requests the client makes to the movie
//! metadata API.
//!
//! ## Features
//!
//! - **Per-user persistence**: recent searches, favorites and preferences,
//!   namespaced by the signed-in identity ([`user_storage::UserStorage`])
//! - **Pluggable storage**: LMDB on disk ([`lmdb_storage::LmdbStorage`]) or
//!   in memory ([`storage_area::MemoryStorage`])
//! - **Fault containment**: storage faults are logged and degrade to empty
//!   values, they never reach the UI
//! - **Local accounts**: a credential table keyed by email, with the metadata
//!   API key as password ([`auth::AuthService`])
//! - **Banner carousel**: explicit `Idle`/`Animating` state machine with
//!   cancelable timers ([`carousel::Carousel`])
//! - **FFI surface**: C-compatible functions returning JSON responses
//!
//! ## Quick Start
//!
//! ```rust
//! use movie_shelf_core::storage_area::MemoryStorage;
//! use movie_shelf_core::user_storage::UserStorage;
//! use serde_json::json;
//!
//! let mut storage = UserStorage::open(MemoryStorage::new());
//! storage.init_user("viewer@example.com");
//!
//! storage.search_history().add("dune");
//! storage.search_history().add("matrix");
//! assert_eq!(storage.search_history().add("dune"), vec!["dune", "matrix"]);
//!
//! storage.favorites().add(&json!({"id": 42, "title": "X"}));
//! assert_eq!(storage.favorites().get().len(), 1);
//! ```
//!
//! ## FFI Functions
//!
//! Every function returning `*const c_char` returns a JSON-encoded
//! [`AppResponse`] (`{"Ok": "<payload>"}`, `{"BadRequest": "..."}`, ...).
//! Release it with [`free_response`].
//!
//! - [`create_store`] / [`create_store_with_config`] / [`close_store`]
//! - [`init_user`], [`current_user`], [`clear_user_data`]
//! - [`search_history_add`], [`search_history_get`], [`search_history_remove`], [`search_history_clear`]
//! - [`favorites_add`], [`favorites_remove`], [`favorites_get`], [`favorites_is_favorite`], [`favorites_clear`]
//! - [`preferences_save`], [`preferences_get`], [`preferences_clear`]

pub mod app_response;
pub mod auth;
pub mod carousel;
pub mod catalog;
pub mod config;
pub mod favorites;
pub mod lmdb_storage;
pub mod movie_filter;
pub mod movie_model;
pub mod preferences;
pub mod search_history;
pub mod storage_area;
pub mod storage_keys;
pub mod timer;
pub mod user_storage;

use std::ffi::{CStr, CString};
use std::os::raw::c_char;

use log::{info, warn};
use serde::Serialize;
use serde_json::Value as JsonValue;

pub use crate::app_response::AppResponse;
use crate::config::CoreConfig;
use crate::lmdb_storage::LmdbStorage;
use crate::movie_model::MovieId;
use crate::user_storage::UserStorage;

/// Store handle passed across the FFI boundary.
pub type ShelfState = UserStorage<LmdbStorage>;

/// Opens (or creates) the store `{name}.lmdb` and restores the session
/// persisted in it.
///
/// # Returns
///
/// A pointer to the [`ShelfState`], or null when `name` is null, not UTF-8,
/// or the environment cannot be opened. The caller owns the pointer and
/// releases it with [`close_store`].
///
/// # Examples
///
/// ```no_run
/// use std::ffi::CString;
/// use movie_shelf_core::{create_store, close_store};
///
/// let name = CString::new("movie_shelf").unwrap();
/// let state = create_store(name.as_ptr());
/// assert!(!state.is_null());
/// close_store(state);
/// ```
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn create_store(name: *const c_char) -> *mut ShelfState {
    if name.is_null() {
        warn!("Null name pointer passed to create_store");
        return std::ptr::null_mut();
    }

    let name_str = match unsafe { CStr::from_ptr(name).to_str() } {
        Ok(s) => s.to_string(),
        Err(e) => {
            warn!("Invalid UTF-8 in name parameter: {e}");
            return std::ptr::null_mut();
        }
    };

    open_state(CoreConfig {
        database_name: name_str,
        ..CoreConfig::default()
    })
}

/// Like [`create_store`], reading the store location and map size from a
/// JSON [`CoreConfig`] document. Missing fields take their defaults.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn create_store_with_config(config_json: *const c_char) -> *mut ShelfState {
    if config_json.is_null() {
        warn!("Null config pointer passed to create_store_with_config");
        return std::ptr::null_mut();
    }

    let raw = match unsafe { CStr::from_ptr(config_json).to_str() } {
        Ok(s) => s,
        Err(e) => {
            warn!("Invalid UTF-8 in config parameter: {e}");
            return std::ptr::null_mut();
        }
    };

    match CoreConfig::from_json_str(raw) {
        Ok(config) => open_state(config),
        Err(e) => {
            warn!("Rejected store configuration: {e}");
            std::ptr::null_mut()
        }
    }
}

fn open_state(config: CoreConfig) -> *mut ShelfState {
    info!("Opening store '{}'", config.database_name);
    match LmdbStorage::init_with_map_size(config.database_name, config.map_size_bytes) {
        Ok(store) => Box::into_raw(Box::new(UserStorage::open(store))),
        Err(e) => {
            warn!("❌ Failed to open store: {e}");
            std::ptr::null_mut()
        }
    }
}

/// Closes the store and releases the handle. The pointer must not be used
/// afterwards.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn close_store(state: *mut ShelfState) -> *const c_char {
    if state.is_null() {
        let error = AppResponse::BadRequest("Null state pointer passed to close_store".to_string());
        return response_to_c_string(&error);
    }

    let state = unsafe { Box::from_raw(state) };
    let store = state.into_store();
    if let Err(e) = store.flush() {
        warn!("Flush before close failed: {e}");
    }
    drop(store);

    response_to_c_string(&AppResponse::success("Store closed successfully"))
}

/// Releases a response string returned by any function of this library.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn free_response(response: *const c_char) {
    if response.is_null() {
        return;
    }
    unsafe {
        drop(CString::from_raw(response as *mut c_char));
    }
}

/// Signs `identity` in as the namespace of the per-user collections.
///
/// Answers `Ok(identity)`, or `ValidationError` for a blank identity.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn init_user(state: *mut ShelfState, identity: *const c_char) -> *const c_char {
    let state = match unsafe { state.as_mut() } {
        Some(s) => s,
        None => return null_state("init_user"),
    };
    let identity = match c_ptr_to_string(identity, "identity") {
        Ok(identity) => identity,
        Err(error_ptr) => return error_ptr,
    };

    if state.init_user(&identity) {
        response_to_c_string(&AppResponse::Ok(identity.trim().to_string()))
    } else {
        response_to_c_string(&AppResponse::ValidationError(
            "Identity could not be recorded".to_string(),
        ))
    }
}

/// Answers `Ok(identity)` for the signed-in user, `NotFound` otherwise.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn current_user(state: *mut ShelfState) -> *const c_char {
    let state = match unsafe { state.as_ref() } {
        Some(s) => s,
        None => return null_state("current_user"),
    };
    match state.current_user() {
        Some(user) => response_to_c_string(&AppResponse::Ok(user.to_string())),
        None => response_to_c_string(&AppResponse::NotFound("No user signed in".to_string())),
    }
}

/// Full logout: removes every stored key and unbinds the session.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn clear_user_data(state: *mut ShelfState) -> *const c_char {
    let state = match unsafe { state.as_mut() } {
        Some(s) => s,
        None => return null_state("clear_user_data"),
    };
    state.clear_user_data();
    response_to_c_string(&AppResponse::success("User data cleared"))
}

/// Records a search term. Answers `Ok` with the updated list as a JSON
/// array, most recent first.
///
/// # Examples
///
/// ```no_run
/// use std::ffi::CString;
/// use movie_shelf_core::{create_store, search_history_add};
///
/// let name = CString::new("movie_shelf").unwrap();
/// let state = create_store(name.as_ptr());
///
/// let term = CString::new("dune").unwrap();
/// let response = search_history_add(state, term.as_ptr());
/// // {"Ok":"[\"dune\"]"}
/// ```
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn search_history_add(state: *mut ShelfState, term: *const c_char) -> *const c_char {
    let state = match unsafe { state.as_ref() } {
        Some(s) => s,
        None => return null_state("search_history_add"),
    };
    let term = match c_ptr_to_string(term, "term") {
        Ok(term) => term,
        Err(error_ptr) => return error_ptr,
    };
    json_response(&state.search_history().add(&term))
}

#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn search_history_get(state: *mut ShelfState) -> *const c_char {
    let state = match unsafe { state.as_ref() } {
        Some(s) => s,
        None => return null_state("search_history_get"),
    };
    json_response(&state.search_history().get())
}

#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn search_history_remove(
    state: *mut ShelfState,
    term: *const c_char,
) -> *const c_char {
    let state = match unsafe { state.as_ref() } {
        Some(s) => s,
        None => return null_state("search_history_remove"),
    };
    let term = match c_ptr_to_string(term, "term") {
        Ok(term) => term,
        Err(error_ptr) => return error_ptr,
    };
    json_response(&state.search_history().remove(&term))
}

#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn search_history_clear(state: *mut ShelfState) -> *const c_char {
    let state = match unsafe { state.as_ref() } {
        Some(s) => s,
        None => return null_state("search_history_clear"),
    };
    state.search_history().clear();
    response_to_c_string(&AppResponse::success("Search history cleared"))
}

/// Adds a movie record (a JSON object with an `id`) to the favorites.
///
/// # JSON Format
///
/// ```json
/// { "id": 42, "title": "Dune", "poster_path": "/dune.jpg" }
/// ```
///
/// Answers `Ok` with the updated favorites as a JSON array. Malformed JSON
/// answers `SerializationError`; a record without a usable id leaves the
/// favorites unchanged.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn favorites_add(
    state: *mut ShelfState,
    movie_json: *const c_char,
) -> *const c_char {
    let state = match unsafe { state.as_ref() } {
        Some(s) => s,
        None => return null_state("favorites_add"),
    };
    let json_str = match c_ptr_to_string(movie_json, "JSON") {
        Ok(json) => json,
        Err(error_ptr) => return error_ptr,
    };
    let movie: JsonValue = match serde_json::from_str(&json_str) {
        Ok(movie) => movie,
        Err(e) => {
            let error = AppResponse::SerializationError(format!("Invalid JSON: {e}"));
            return response_to_c_string(&error);
        }
    };
    json_response(&state.favorites().add(&movie))
}

/// Removes a favorite. `id_json` is the id as JSON: `42` or `"42"`.
///
/// Any id is accepted; one that matches nothing (`0`, `""`, `null`, ...)
/// answers the unchanged favorites.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn favorites_remove(
    state: *mut ShelfState,
    id_json: *const c_char,
) -> *const c_char {
    let state = match unsafe { state.as_ref() } {
        Some(s) => s,
        None => return null_state("favorites_remove"),
    };
    match movie_id_from_c(id_json) {
        Ok(Some(id)) => json_response(&state.favorites().remove(&id)),
        Ok(None) => json_response(&state.favorites().get()),
        Err(error_ptr) => error_ptr,
    }
}

#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn favorites_get(state: *mut ShelfState) -> *const c_char {
    let state = match unsafe { state.as_ref() } {
        Some(s) => s,
        None => return null_state("favorites_get"),
    };
    json_response(&state.favorites().get())
}

/// Answers `Ok("true")` or `Ok("false")`; ids never added answer `false`.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn favorites_is_favorite(
    state: *mut ShelfState,
    id_json: *const c_char,
) -> *const c_char {
    let state = match unsafe { state.as_ref() } {
        Some(s) => s,
        None => return null_state("favorites_is_favorite"),
    };
    let is_favorite = match movie_id_from_c(id_json) {
        Ok(Some(id)) => state.favorites().is_favorite(&id),
        Ok(None) => false,
        Err(error_ptr) => return error_ptr,
    };
    json_response(&is_favorite)
}

#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn favorites_clear(state: *mut ShelfState) -> *const c_char {
    let state = match unsafe { state.as_ref() } {
        Some(s) => s,
        None => return null_state("favorites_clear"),
    };
    state.favorites().clear();
    response_to_c_string(&AppResponse::success("Favorites cleared"))
}

/// Replaces the stored preferences with the given JSON value.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn preferences_save(
    state: *mut ShelfState,
    json_ptr: *const c_char,
) -> *const c_char {
    let state = match unsafe { state.as_ref() } {
        Some(s) => s,
        None => return null_state("preferences_save"),
    };
    let json_str = match c_ptr_to_string(json_ptr, "JSON") {
        Ok(json) => json,
        Err(error_ptr) => return error_ptr,
    };
    let preferences: JsonValue = match serde_json::from_str(&json_str) {
        Ok(value) => value,
        Err(e) => {
            let error = AppResponse::SerializationError(format!("Invalid JSON: {e}"));
            return response_to_c_string(&error);
        }
    };
    state.preferences().save(&preferences);
    response_to_c_string(&AppResponse::success("Preferences saved"))
}

#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn preferences_get(state: *mut ShelfState) -> *const c_char {
    let state = match unsafe { state.as_ref() } {
        Some(s) => s,
        None => return null_state("preferences_get"),
    };
    json_response(&state.preferences().get())
}

#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn preferences_clear(state: *mut ShelfState) -> *const c_char {
    let state = match unsafe { state.as_ref() } {
        Some(s) => s,
        None => return null_state("preferences_clear"),
    };
    state.preferences().clear();
    response_to_c_string(&AppResponse::success("Preferences cleared"))
}

fn null_state(function: &str) -> *const c_char {
    let error = AppResponse::BadRequest(format!("Null state pointer passed to {function}"));
    response_to_c_string(&error)
}

/// Wraps `value`, serialized as JSON, in an `Ok` response.
fn json_response<T: Serialize + ?Sized>(value: &T) -> *const c_char {
    match serde_json::to_string(value) {
        Ok(json) => response_to_c_string(&AppResponse::Ok(json)),
        Err(e) => {
            let error = AppResponse::SerializationError(format!("Failed to serialize result: {e}"));
            response_to_c_string(&error)
        }
    }
}

/// Parses the id argument. `None` is a well-formed value that cannot name
/// any stored favorite (`null`, booleans, arrays, objects).
fn movie_id_from_c(id_json: *const c_char) -> Result<Option<MovieId>, *const c_char> {
    let raw = c_ptr_to_string(id_json, "id")?;
    let value: JsonValue = serde_json::from_str(&raw).map_err(|e| {
        response_to_c_string(&AppResponse::SerializationError(format!("Invalid id JSON: {e}")))
    })?;
    Ok(MovieId::lookup(&value))
}

/// Converts an [`AppResponse`] to a C-compatible string.
///
/// Returns null if serialization or C string creation fails. The caller
/// releases the string with [`free_response`].
fn response_to_c_string(response: &AppResponse) -> *const c_char {
    let json = match serde_json::to_string(response) {
        Ok(j) => j,
        Err(e) => {
            warn!("Error serializing response: {e}");
            return std::ptr::null();
        }
    };

    match CString::new(json) {
        Ok(c_str) => c_str.into_raw(),
        Err(e) => {
            warn!("Error creating CString: {e}");
            std::ptr::null()
        }
    }
}

/// Converts a C string pointer to a Rust `String`.
///
/// On a null pointer or invalid UTF-8, returns the `BadRequest` response to
/// hand back to the caller, already converted to a C string.
fn c_ptr_to_string(ptr: *const c_char, field_name: &str) -> Result<String, *const c_char> {
    if ptr.is_null() {
        let error = AppResponse::BadRequest(format!("Null {field_name} pointer"));
        return Err(response_to_c_string(&error));
    }

    match unsafe { CStr::from_ptr(ptr).to_str() } {
        Ok(s) => Ok(s.to_string()),
        Err(e) => {
            let error = AppResponse::BadRequest(format!("Invalid UTF-8 in {field_name}: {e}"));
            Err(response_to_c_string(&error))
        }
    }
}
