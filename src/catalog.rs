//! Request plumbing for the movie metadata API.
//!
//! The API is reached directly with the signed-in user's key (`api_key`
//! query parameter). Listing endpoints answer `{"results": [...]}`, detail
//! endpoints a flat object. HTTP is behind the [`Transport`] trait so views
//! and tests can swap it; [`HttpTransport`] is the blocking `reqwest`
//! implementation.
//!
//! A 401 ends the session: the stored credentials are dropped and the
//! caller gets [`CatalogError::Unauthorized`].

use std::fmt::{Display, Formatter};
use std::time::Duration;

use log::{debug, warn};
use reqwest::Url;
use serde_json::Value as JsonValue;

use crate::app_response::AppResponse;
use crate::config::CatalogConfig;
use crate::movie_model::MovieId;
use crate::storage_area::StorageArea;
use crate::user_storage::UserStorage;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    /// No API key is stored; the user has to sign in.
    MissingApiKey,
    /// The API rejected the key.
    Unauthorized,
    RequestFailed(String),
    InvalidResponse(String),
    InvalidUrl(String),
}

impl Display for CatalogError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            CatalogError::MissingApiKey => write!(f, "No API key stored, sign in required"),
            CatalogError::Unauthorized => write!(f, "API key rejected, sign in again"),
            CatalogError::RequestFailed(msg) => write!(f, "API request failed: {}", msg),
            CatalogError::InvalidResponse(msg) => write!(f, "Invalid API response: {}", msg),
            CatalogError::InvalidUrl(msg) => write!(f, "Invalid API URL: {}", msg),
        }
    }
}

impl std::error::Error for CatalogError {}

impl From<CatalogError> for AppResponse {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::MissingApiKey | CatalogError::Unauthorized => {
                AppResponse::Unauthorized(err.to_string())
            }
            CatalogError::InvalidResponse(_) => AppResponse::SerializationError(err.to_string()),
            CatalogError::InvalidUrl(_) => AppResponse::BadRequest(err.to_string()),
            CatalogError::RequestFailed(_) => AppResponse::DatabaseError(err.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    Trending,
    NowPlaying,
    TopRated,
    Popular,
    Discover,
    Search,
    Details(MovieId),
    Videos(MovieId),
}

impl Endpoint {
    pub fn path(&self) -> String {
        match self {
            Endpoint::Trending => "/trending/movie/week".to_string(),
            Endpoint::NowPlaying => "/movie/now_playing".to_string(),
            Endpoint::TopRated => "/movie/top_rated".to_string(),
            Endpoint::Popular => "/movie/popular".to_string(),
            Endpoint::Discover => "/discover/movie".to_string(),
            Endpoint::Search => "/search/movie".to_string(),
            Endpoint::Details(id) => format!("/movie/{id}"),
            Endpoint::Videos(id) => format!("/movie/{id}/videos"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeClass {
    Small,
    Medium,
    Large,
    Original,
}

/// Image rendition requested from the image CDN.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSize {
    Poster(SizeClass),
    Backdrop(SizeClass),
    Profile(SizeClass),
}

impl ImageSize {
    pub fn token(self) -> &'static str {
        use SizeClass::*;
        match self {
            ImageSize::Poster(Small) => "w185",
            ImageSize::Poster(Medium) => "w342",
            ImageSize::Poster(Large) => "w500",
            ImageSize::Backdrop(Small) => "w300",
            ImageSize::Backdrop(Medium) => "w780",
            ImageSize::Backdrop(Large) => "w1280",
            ImageSize::Profile(Small) => "w45",
            ImageSize::Profile(Medium) => "w185",
            ImageSize::Profile(Large) => "h632",
            ImageSize::Poster(Original)
            | ImageSize::Backdrop(Original)
            | ImageSize::Profile(Original) => "original",
        }
    }
}

/// Raw HTTP answer handed back by a [`Transport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    pub body: String,
}

pub trait Transport: Send + Sync {
    fn get(&self, url: &str) -> Result<HttpReply, CatalogError>;
}

pub struct HttpTransport {
    client: reqwest::blocking::Client,
}

impl HttpTransport {
    pub fn new(config: &CatalogConfig) -> Result<Self, CatalogError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| CatalogError::RequestFailed(format!("Could not build HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    fn get(&self, url: &str) -> Result<HttpReply, CatalogError> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| CatalogError::RequestFailed(e.without_url().to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .map_err(|e| CatalogError::RequestFailed(e.without_url().to_string()))?;
        Ok(HttpReply { status, body })
    }
}

pub struct CatalogClient<T: Transport> {
    config: CatalogConfig,
    transport: T,
}

impl CatalogClient<HttpTransport> {
    pub fn with_http(config: CatalogConfig) -> Result<Self, CatalogError> {
        let transport = HttpTransport::new(&config)?;
        Ok(Self::new(config, transport))
    }
}

impl<T: Transport> CatalogClient<T> {
    pub fn new(config: CatalogConfig, transport: T) -> Self {
        Self { config, transport }
    }

    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    /// Full request URL: `api_key` and `language` first, then `params`.
    pub fn build_url(
        &self,
        endpoint: &Endpoint,
        api_key: &str,
        params: &[(String, String)],
    ) -> Result<String, CatalogError> {
        let base = format!("{}{}", self.config.base_url.trim_end_matches('/'), endpoint.path());
        let mut query: Vec<(&str, &str)> = vec![
            ("api_key", api_key),
            ("language", self.config.language.as_str()),
        ];
        query.extend(params.iter().map(|(k, v)| (k.as_str(), v.as_str())));

        Url::parse_with_params(&base, &query)
            .map(String::from)
            .map_err(|e| CatalogError::InvalidUrl(e.to_string()))
    }

    /// Requests `endpoint` with the API key of the signed-in user.
    ///
    /// An unauthorized answer invalidates the stored credentials.
    pub fn fetch<S: StorageArea>(
        &self,
        session: &UserStorage<S>,
        endpoint: &Endpoint,
        params: &[(String, String)],
    ) -> Result<JsonValue, CatalogError> {
        let api_key = session.api_key().ok_or(CatalogError::MissingApiKey)?;
        match self.fetch_with_key(&api_key, endpoint, params) {
            Err(CatalogError::Unauthorized) => {
                warn!("API key rejected while requesting {}", endpoint.path());
                session.invalidate_credentials();
                Err(CatalogError::Unauthorized)
            }
            other => other,
        }
    }

    /// Like [`CatalogClient::fetch`], returning the `results` array of a
    /// listing endpoint.
    pub fn fetch_listing<S: StorageArea>(
        &self,
        session: &UserStorage<S>,
        endpoint: &Endpoint,
        params: &[(String, String)],
    ) -> Result<Vec<JsonValue>, CatalogError> {
        self.fetch(session, endpoint, params).map(results_of)
    }

    /// Best trailer for a movie, preferring the configured language.
    pub fn fetch_trailer<S: StorageArea>(
        &self,
        session: &UserStorage<S>,
        movie_id: &MovieId,
    ) -> Result<Option<JsonValue>, CatalogError> {
        let videos = self.fetch_listing(session, &Endpoint::Videos(movie_id.clone()), &[])?;
        let language = self.config.language.split('-').next().unwrap_or_default();
        Ok(select_trailer(&videos, language).cloned())
    }

    pub fn fetch_with_key(
        &self,
        api_key: &str,
        endpoint: &Endpoint,
        params: &[(String, String)],
    ) -> Result<JsonValue, CatalogError> {
        let url = self.build_url(endpoint, api_key, params)?;
        debug!("GET {}", endpoint.path());

        let reply = self.transport.get(&url)?;
        match reply.status {
            200..=299 => serde_json::from_str(&reply.body)
                .map_err(|e| CatalogError::InvalidResponse(e.to_string())),
            401 => Err(CatalogError::Unauthorized),
            status => Err(CatalogError::RequestFailed(format!(
                "{} answered HTTP {status}",
                endpoint.path()
            ))),
        }
    }

    /// Probes the API with `api_key`; used when registering an account.
    pub fn validate_api_key(&self, api_key: &str) -> bool {
        match self.fetch_with_key(api_key, &Endpoint::Popular, &[]) {
            Ok(_) => true,
            Err(e) => {
                debug!("API key validation failed: {e}");
                false
            }
        }
    }

    /// CDN URL of an image, or `None` when the record has no image path.
    pub fn image_url(&self, path: Option<&str>, size: ImageSize) -> Option<String> {
        let path = path.filter(|p| !p.is_empty())?;
        Some(format!("{}{}{}", self.config.image_base_url, size.token(), path))
    }
}

/// Items of a listing document. Documents without `results` are returned as
/// a single item, arrays as they are.
pub fn results_of(document: JsonValue) -> Vec<JsonValue> {
    match document {
        JsonValue::Object(mut object) => match object.remove("results") {
            Some(JsonValue::Array(results)) => results,
            Some(other) => {
                object.insert("results".to_string(), other);
                vec![JsonValue::Object(object)]
            }
            None => vec![JsonValue::Object(object)],
        },
        JsonValue::Array(items) => items,
        JsonValue::Null => Vec::new(),
        other => vec![other],
    }
}

/// Movies usable as banner slides: those with a non-blank overview.
pub fn banner_candidates(results: &[JsonValue]) -> Vec<JsonValue> {
    results
        .iter()
        .filter(|movie| {
            movie
                .get("overview")
                .and_then(JsonValue::as_str)
                .is_some_and(|overview| !overview.trim().is_empty())
        })
        .cloned()
        .collect()
}

/// Picks a YouTube trailer, in `language` (ISO 639-1) when one exists.
pub fn select_trailer<'v>(videos: &'v [JsonValue], language: &str) -> Option<&'v JsonValue> {
    let field = |video: &JsonValue, name: &str| -> Option<String> {
        video
            .get(name)
            .and_then(JsonValue::as_str)
            .map(str::to_string)
    };
    let is_trailer = |video: &&JsonValue| {
        field(*video, "type").as_deref() == Some("Trailer")
            && field(*video, "site").as_deref() == Some("YouTube")
    };

    videos
        .iter()
        .filter(is_trailer)
        .find(|video| field(*video, "iso_639_1").as_deref() == Some(language))
        .or_else(|| videos.iter().find(is_trailer))
}

/// Identifies one request issued on behalf of a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestTicket(u64);

/// Drops responses that arrive for a view that was torn down or has issued
/// a newer request since.
#[derive(Debug)]
pub struct RequestTracker {
    generation: u64,
    mounted: bool,
}

impl Default for RequestTracker {
    fn default() -> Self {
        Self {
            generation: 0,
            mounted: true,
        }
    }
}

impl RequestTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&mut self) -> RequestTicket {
        self.generation += 1;
        RequestTicket(self.generation)
    }

    /// Whether a response for `ticket` may still be applied.
    pub fn accepts(&self, ticket: RequestTicket) -> bool {
        self.mounted && ticket.0 == self.generation
    }

    pub fn teardown(&mut self) {
        self.mounted = false;
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }
}
