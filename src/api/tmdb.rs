//! TMDB (The Movie Database) API client
//!
//! Provides browse rows for the home page and per-movie genres + trailer.
//! API docs: https://developer.themoviedb.org/docs

use anyhow::Result;
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::models::{Genre, MediaType, Movie, MovieExtras};

/// TMDB API error types
#[derive(Error, Debug)]
pub enum TmdbError {
    #[error("Resource not found (404)")]
    NotFound,

    #[error("Rate limited (429)")]
    RateLimited,

    #[error("Unauthorized (401): check the TMDB API key")]
    Unauthorized,

    #[error("Server error: {0}")]
    ServerError(u16),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
}

/// Home page rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Row {
    Trending,
    NetflixOriginals,
    TopRated,
    Action,
    Comedy,
    Horror,
    Romance,
    Documentaries,
}

impl Row {
    /// Rows in display order
    pub const ALL: [Row; 8] = [
        Row::Trending,
        Row::NetflixOriginals,
        Row::TopRated,
        Row::Action,
        Row::Comedy,
        Row::Horror,
        Row::Romance,
        Row::Documentaries,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            Row::Trending => "Trending Now",
            Row::NetflixOriginals => "Netflix Originals",
            Row::TopRated => "Top Rated",
            Row::Action => "Action Thrillers",
            Row::Comedy => "Comedies",
            Row::Horror => "Scary Movies",
            Row::Romance => "Romance Movies",
            Row::Documentaries => "Documentaries",
        }
    }

    fn endpoint(&self) -> &'static str {
        match self {
            Row::Trending => "/trending/all/week?language=en-US",
            Row::NetflixOriginals => "/discover/tv?with_networks=213",
            Row::TopRated => "/movie/top_rated?language=en-US",
            Row::Action => "/discover/movie?language=en-US&with_genres=28",
            Row::Comedy => "/discover/movie?language=en-US&with_genres=35",
            Row::Horror => "/discover/movie?language=en-US&with_genres=27",
            Row::Romance => "/discover/movie?language=en-US&with_genres=10749",
            Row::Documentaries => "/discover/movie?language=en-US&with_genres=99",
        }
    }
}

/// TMDB API client
pub struct TmdbClient {
    api_key: String,
    base_url: String,
    client: reqwest::Client,
}

impl TmdbClient {
    /// Create a new TMDB client with the given v3 API key
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(api_key, "https://api.themoviedb.org/3")
    }

    /// Create a client with a custom base URL (for testing)
    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: base_url.into(),
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .unwrap_or_default(),
        }
    }

    /// Make one authenticated GET request
    async fn get<T: for<'de> Deserialize<'de>>(&self, endpoint: &str) -> Result<T> {
        let url = format!("{}{}", self.base_url, endpoint);
        debug!(endpoint, "tmdb request");

        let response = self
            .client
            .get(&url)
            .query(&[("api_key", self.api_key.as_str())])
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(TmdbError::from)?;

        match response.status() {
            StatusCode::OK => {
                let body = response.text().await.map_err(TmdbError::from)?;
                let parsed: T = serde_json::from_str(&body).map_err(|e| {
                    TmdbError::InvalidResponse(format!("JSON parse error: {}", e))
                })?;
                Ok(parsed)
            }
            StatusCode::NOT_FOUND => Err(TmdbError::NotFound.into()),
            StatusCode::UNAUTHORIZED => Err(TmdbError::Unauthorized.into()),
            StatusCode::TOO_MANY_REQUESTS => Err(TmdbError::RateLimited.into()),
            status => Err(TmdbError::ServerError(status.as_u16()).into()),
        }
    }

    /// Fetch one home page row
    pub async fn row(&self, row: Row) -> Result<Vec<Movie>> {
        let response: ListResponse = self.get(row.endpoint()).await?;
        Ok(response.into_movies())
    }

    /// Look up a single title by id
    pub async fn details(&self, id: u64, kind: MediaType) -> Result<Movie> {
        let endpoint = format!("/{}/{}?language=en-US", kind.path(), id);
        let mut movie: Movie = self.get(&endpoint).await?;
        movie.media_type = Some(kind);
        Ok(movie)
    }

    /// Genres and trailer for a movie or TV show
    pub async fn movie_extras(&self, movie: &Movie) -> Result<MovieExtras> {
        let endpoint = format!(
            "/{}/{}?language=en-US&append_to_response=videos",
            movie.kind().path(),
            movie.id
        );
        let response: ExtrasResponse = self.get(&endpoint).await?;
        Ok(response.into_extras())
    }
}

// =============================================================================
// Response Structures (internal deserialization)
// =============================================================================

#[derive(Debug, Deserialize)]
struct ListResponse {
    #[serde(default)]
    results: Vec<serde_json::Value>,
}

impl ListResponse {
    /// Keep movies and shows; "person" and malformed entries are dropped
    fn into_movies(self) -> Vec<Movie> {
        self.results
            .into_iter()
            .filter(|raw| raw.get("media_type").and_then(|m| m.as_str()) != Some("person"))
            .filter_map(|raw| serde_json::from_value(raw).ok())
            .collect()
    }
}

#[derive(Debug, Deserialize)]
struct ExtrasResponse {
    #[serde(default)]
    genres: Vec<Genre>,
    #[serde(default)]
    videos: Option<VideosRaw>,
}

#[derive(Debug, Deserialize)]
struct VideosRaw {
    #[serde(default)]
    results: Vec<VideoRaw>,
}

#[derive(Debug, Deserialize)]
struct VideoRaw {
    key: String,
    #[serde(rename = "type")]
    kind: String,
}

impl ExtrasResponse {
    fn into_extras(self) -> MovieExtras {
        let trailer = self
            .videos
            .and_then(|v| v.results.into_iter().find(|video| video.kind == "Trailer"))
            .map(|video| video.key);

        MovieExtras {
            genres: self.genres,
            trailer,
        }
    }
}
