use std::fmt::{Display, Formatter};

use lmdb::Error as LmdbError;
use serde::{Deserialize, Serialize};
use serde_json::Error as SerdeError;

/// Outcome of a storage, session or FFI operation.
///
/// Serialized as an externally tagged JSON object (`{"Ok": "..."}`,
/// `{"NotFound": "..."}`) when handed across the FFI boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AppResponse {
    DatabaseError(String),
    SerializationError(String),
    NotFound(String),
    ValidationError(String),
    BadRequest(String),
    Unauthorized(String),
    Ok(String),
}

impl Display for AppResponse {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            AppResponse::DatabaseError(msg) => write!(f, "Database error: {}", msg),
            AppResponse::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
            AppResponse::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppResponse::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            AppResponse::BadRequest(msg) => write!(f, "Bad Request: {}", msg),
            AppResponse::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            AppResponse::Ok(msg) => write!(f, "Ok: {}", msg),
        }
    }
}

impl std::error::Error for AppResponse {}

impl From<LmdbError> for AppResponse {
    fn from(err: LmdbError) -> Self {
        match err {
            LmdbError::NotFound => AppResponse::NotFound("Key not found".to_string()),
            LmdbError::MapFull => {
                AppResponse::DatabaseError("Storage quota exceeded (map full)".to_string())
            }
            LmdbError::Corrupted | LmdbError::Panic => {
                AppResponse::DatabaseError(format!("Database is corrupted: {}", err))
            }
            _ => AppResponse::DatabaseError(format!("LMDB error: {}", err)),
        }
    }
}

impl From<SerdeError> for AppResponse {
    fn from(err: SerdeError) -> Self {
        AppResponse::SerializationError(format!("JSON serialization error: {}", err))
    }
}

impl From<std::io::Error> for AppResponse {
    fn from(err: std::io::Error) -> Self {
        AppResponse::DatabaseError(format!("IO error: {}", err))
    }
}

impl AppResponse {
    pub fn success(msg: impl Into<String>) -> Self {
        AppResponse::Ok(msg.into())
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, AppResponse::Ok(_))
    }
}
