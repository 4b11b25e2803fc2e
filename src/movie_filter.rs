//! Browse and search filters.
//!
//! A [`MovieFilter`] produces the query parameters of the discover and
//! search endpoints and re-applies the same constraints to the returned
//! page, since search results ignore most of them server-side.

use std::cmp::Ordering;
use std::str::FromStr;

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::app_response::AppResponse;

pub const GENRES: [(u32, &str); 19] = [
    (28, "Action"),
    (12, "Adventure"),
    (16, "Animation"),
    (35, "Comedy"),
    (80, "Crime"),
    (99, "Documentary"),
    (18, "Drama"),
    (10751, "Family"),
    (14, "Fantasy"),
    (36, "History"),
    (27, "Horror"),
    (10402, "Music"),
    (9648, "Mystery"),
    (10749, "Romance"),
    (878, "Science Fiction"),
    (10770, "TV Movie"),
    (53, "Thriller"),
    (10752, "War"),
    (37, "Western"),
];

pub fn genre_label(id: u32) -> Option<&'static str> {
    GENRES.iter().find(|(genre, _)| *genre == id).map(|(_, label)| *label)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatingRange {
    pub label: &'static str,
    pub min: f64,
    pub max: f64,
}

pub const RATING_RANGES: [RatingRange; 7] = [
    RatingRange {
        label: "9 and above",
        min: 9.0,
        max: 10.0,
    },
    RatingRange {
        label: "8-9",
        min: 8.0,
        max: 8.9,
    },
    RatingRange {
        label: "7-8",
        min: 7.0,
        max: 7.9,
    },
    RatingRange {
        label: "6-7",
        min: 6.0,
        max: 6.9,
    },
    RatingRange {
        label: "5-6",
        min: 5.0,
        max: 5.9,
    },
    RatingRange {
        label: "4-5",
        min: 4.0,
        max: 4.9,
    },
    RatingRange {
        label: "below 4",
        min: 0.0,
        max: 3.9,
    },
];

/// Minimum vote counts keeping obscure titles out of the results.
const DISCOVER_MIN_VOTES: u32 = 50;
const SEARCH_MIN_VOTES: u32 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortOrder {
    #[default]
    #[serde(rename = "popularity.desc")]
    PopularityDesc,
    #[serde(rename = "popularity.asc")]
    PopularityAsc,
    #[serde(rename = "vote_average.desc")]
    VoteAverageDesc,
    #[serde(rename = "vote_average.asc")]
    VoteAverageAsc,
    #[serde(rename = "release_date.desc")]
    ReleaseDateDesc,
    #[serde(rename = "release_date.asc")]
    ReleaseDateAsc,
}

impl SortOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::PopularityDesc => "popularity.desc",
            SortOrder::PopularityAsc => "popularity.asc",
            SortOrder::VoteAverageDesc => "vote_average.desc",
            SortOrder::VoteAverageAsc => "vote_average.asc",
            SortOrder::ReleaseDateDesc => "release_date.desc",
            SortOrder::ReleaseDateAsc => "release_date.asc",
        }
    }

    /// Stable in-place sort of movie records.
    pub fn sort(self, movies: &mut [JsonValue]) {
        let by_number = |field: &'static str| {
            move |a: &JsonValue, b: &JsonValue| {
                number_field(a, field)
                    .partial_cmp(&number_field(b, field))
                    .unwrap_or(Ordering::Equal)
            }
        };

        match self {
            SortOrder::PopularityDesc => movies.sort_by(|a, b| by_number("popularity")(b, a)),
            SortOrder::PopularityAsc => movies.sort_by(by_number("popularity")),
            SortOrder::VoteAverageDesc => movies.sort_by(|a, b| by_number("vote_average")(b, a)),
            SortOrder::VoteAverageAsc => movies.sort_by(by_number("vote_average")),
            SortOrder::ReleaseDateDesc => {
                movies.sort_by(|a, b| release_date(b).cmp(&release_date(a)))
            }
            SortOrder::ReleaseDateAsc => {
                movies.sort_by(|a, b| release_date(a).cmp(&release_date(b)))
            }
        }
    }
}

impl FromStr for SortOrder {
    type Err = AppResponse;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [
            SortOrder::PopularityDesc,
            SortOrder::PopularityAsc,
            SortOrder::VoteAverageDesc,
            SortOrder::VoteAverageAsc,
            SortOrder::ReleaseDateDesc,
            SortOrder::ReleaseDateAsc,
        ]
        .into_iter()
        .find(|order| order.as_str() == s)
        .ok_or_else(|| AppResponse::ValidationError(format!("Unknown sort order: {s}")))
    }
}

/// Which endpoint the filter feeds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryKind {
    Discover,
    Search { query: String },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovieFilter {
    pub with_genres: Option<u32>,
    pub vote_average_gte: Option<f64>,
    pub vote_average_lte: Option<f64>,
    pub primary_release_year: Option<u16>,
    pub sort_by: SortOrder,
}

impl MovieFilter {
    pub fn with_rating_range(mut self, range: &RatingRange) -> Self {
        self.vote_average_gte = Some(range.min);
        self.vote_average_lte = Some(range.max);
        self
    }

    /// Query parameters for `kind`, limited to titles released up to today
    /// (UTC).
    pub fn query_params(&self, kind: &QueryKind, page: u32) -> Vec<(String, String)> {
        self.query_params_on(kind, page, Utc::now().date_naive())
    }

    pub fn query_params_on(
        &self,
        kind: &QueryKind,
        page: u32,
        today: NaiveDate,
    ) -> Vec<(String, String)> {
        let mut params: Vec<(String, String)> = Vec::new();
        let mut push = |key: &str, value: String| params.push((key.to_string(), value));

        match kind {
            QueryKind::Discover => {
                push("page", page.to_string());
                push("sort_by", self.sort_by.as_str().to_string());
                push("vote_count.gte", DISCOVER_MIN_VOTES.to_string());
            }
            QueryKind::Search { query } => {
                push("query", query.clone());
                push("page", page.to_string());
                push("include_adult", "false".to_string());
                push("vote_count.gte", SEARCH_MIN_VOTES.to_string());
            }
        }
        push("release_date.lte", today.format("%Y-%m-%d").to_string());

        if let Some(genre) = self.with_genres {
            push("with_genres", genre.to_string());
        }
        if let Some(year) = self.primary_release_year {
            push("primary_release_year", year.to_string());
        }
        if let (Some(gte), Some(lte)) = (self.vote_average_gte, self.vote_average_lte) {
            push("vote_average.gte", gte.to_string());
            push("vote_average.lte", lte.to_string());
        }
        params
    }

    /// Keeps records with a poster whose rating lies in range, sorted by
    /// [`MovieFilter::sort_by`].
    pub fn apply(&self, results: Vec<JsonValue>) -> Vec<JsonValue> {
        let min = self.vote_average_gte.unwrap_or(0.0);
        let max = self.vote_average_lte.unwrap_or(10.0);

        let mut movies: Vec<JsonValue> = results
            .into_iter()
            .filter(|movie| {
                let has_poster = movie
                    .get("poster_path")
                    .and_then(JsonValue::as_str)
                    .is_some_and(|path| !path.is_empty());
                let rating = movie.get("vote_average").and_then(JsonValue::as_f64);
                has_poster && rating.is_some_and(|r| r >= min && r <= max)
            })
            .collect();

        self.sort_by.sort(&mut movies);
        movies
    }
}

fn number_field(movie: &JsonValue, field: &str) -> f64 {
    movie.get(field).and_then(JsonValue::as_f64).unwrap_or(0.0)
}

/// Release date as an ISO string; missing dates sort as 1900.
fn release_date(movie: &JsonValue) -> &str {
    movie
        .get("release_date")
        .and_then(JsonValue::as_str)
        .filter(|date| !date.is_empty())
        .unwrap_or("1900")
}
