//! Runtime configuration.
//!
//! Hosts pass configuration as a JSON document (usually straight from the
//! FFI boundary). Every field has a default, so `{}` is a valid document.

use serde::{Deserialize, Serialize};

use crate::app_response::AppResponse;
use crate::lmdb_storage::DEFAULT_MAP_SIZE;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    /// Store location; the LMDB environment lives at `{database_name}.lmdb`.
    pub database_name: String,
    pub map_size_bytes: usize,
    pub catalog: CatalogConfig,
    pub carousel: CarouselConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub base_url: String,
    pub image_base_url: String,
    pub language: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CarouselConfig {
    /// Length of one slide transition.
    pub transition_ms: u64,
    /// Period of the auto-advance timer.
    pub auto_advance_ms: u64,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            database_name: "movie_shelf".to_string(),
            map_size_bytes: DEFAULT_MAP_SIZE,
            catalog: CatalogConfig::default(),
            carousel: CarouselConfig::default(),
        }
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.themoviedb.org/3".to_string(),
            image_base_url: "https://image.tmdb.org/t/p/".to_string(),
            language: "ko-KR".to_string(),
            timeout_secs: 10,
        }
    }
}

impl Default for CarouselConfig {
    fn default() -> Self {
        Self {
            transition_ms: 300,
            auto_advance_ms: 5000,
        }
    }
}

impl CoreConfig {
    pub fn from_json_str(json: &str) -> Result<Self, AppResponse> {
        let config: CoreConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AppResponse> {
        if self.database_name.trim().is_empty() {
            return Err(AppResponse::ValidationError(
                "database_name cannot be empty".to_string(),
            ));
        }
        if self.map_size_bytes == 0 {
            return Err(AppResponse::ValidationError(
                "map_size_bytes must be positive".to_string(),
            ));
        }
        if self.carousel.transition_ms == 0 || self.carousel.auto_advance_ms == 0 {
            return Err(AppResponse::ValidationError(
                "carousel timings must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
