//! Data structures and types for flixtui
//!
//! Contains all shared models used across the application organized by domain:
//! - **Catalogue**: TMDB movies, genres and per-movie extras
//! - **Accounts**: signed-in user, profiles
//! - **Subscription**: plan catalogue and benefits
//! - **Lists**: user-scoped collections ("myList", "Liked")

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Catalogue Models (TMDB)
// =============================================================================

/// Media type discriminator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    #[default]
    Movie,
    Tv,
}

impl MediaType {
    /// Path segment used by the metadata API
    pub fn path(&self) -> &'static str {
        match self {
            MediaType::Movie => "movie",
            MediaType::Tv => "tv",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaType::Movie => write!(f, "Movie"),
            MediaType::Tv => write!(f, "TV Show"),
        }
    }
}

/// A movie or TV show as returned by TMDB list endpoints.
///
/// The same shape is stored verbatim in the user's list documents, so every
/// optional field stays optional on the way back in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Movie {
    pub id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_name: Option<String>,
    #[serde(default)]
    pub overview: String,
    #[serde(default)]
    pub vote_average: f64,
    #[serde(default)]
    pub vote_count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_air_date: Option<String>,
    #[serde(default)]
    pub original_language: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<MediaType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poster_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backdrop_path: Option<String>,
    #[serde(default)]
    pub genre_ids: Vec<u64>,
}

impl Movie {
    /// Title shown to the user: movies use `title`, TV uses `name`
    pub fn display_title(&self) -> &str {
        self.title
            .as_deref()
            .or(self.name.as_deref())
            .or(self.original_name.as_deref())
            .unwrap_or("Untitled")
    }

    /// Release date for movies, first air date for TV
    pub fn released(&self) -> Option<&str> {
        self.release_date
            .as_deref()
            .or(self.first_air_date.as_deref())
            .filter(|d| !d.is_empty())
    }

    /// Year extracted from the release date
    pub fn year(&self) -> Option<u16> {
        self.released().and_then(extract_year)
    }

    /// Media type, guessing TV when only TV-style fields are present
    pub fn kind(&self) -> MediaType {
        match self.media_type {
            Some(kind) => kind,
            None if self.title.is_none() && self.first_air_date.is_some() => MediaType::Tv,
            None => MediaType::Movie,
        }
    }

    /// "Match" percentage shown in the detail modal, e.g. `78.00`
    pub fn match_percent(&self) -> String {
        format!("{:.2}", self.vote_average * 10.0)
    }
}

impl fmt::Display for Movie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let year_str = self.year().map(|y| format!(" ({})", y)).unwrap_or_default();
        write!(f, "{}{}", self.display_title(), year_str)
    }
}

/// Genre entry from TMDB
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genre {
    pub id: u64,
    pub name: String,
}

/// Extra metadata fetched when a movie is opened in the modal
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MovieExtras {
    pub genres: Vec<Genre>,
    /// YouTube key of the first trailer, if any
    pub trailer: Option<String>,
}

impl MovieExtras {
    /// Comma separated genre names
    pub fn genres_str(&self) -> String {
        self.genres
            .iter()
            .map(|g| g.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Playable trailer URL
    pub fn trailer_url(&self) -> Option<String> {
        self.trailer
            .as_ref()
            .map(|key| format!("https://www.youtube.com/watch?v={}", key))
    }
}

/// Extract year from a date string like "2022-03-04"
pub fn extract_year(date: &str) -> Option<u16> {
    if date.len() >= 4 {
        date.get(..4)?.parse().ok()
    } else {
        None
    }
}

// =============================================================================
// Account Models
// =============================================================================

/// Signed-in user as reported by the identity provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub uid: String,
    pub email: String,
    /// Bearer token for the document store
    pub id_token: String,
    #[serde(default)]
    pub refresh_token: String,
    /// When `id_token` stops being accepted; `None` if the provider did not say
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

impl User {
    /// Token expires within a minute of `now`
    pub fn token_expiring(&self, now: DateTime<Utc>) -> bool {
        self.expires_at
            .is_some_and(|at| at - Duration::seconds(60) <= now)
    }
}

/// Viewer profile stored under `users/{uid}/profiles`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    #[serde(rename = "profileIcon")]
    pub profile_icon: String,
}

impl Profile {
    pub fn new(name: impl Into<String>, profile_icon: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            profile_icon: profile_icon.into(),
        }
    }

    /// First profile of a fresh account, named after the email's local part
    pub fn default_for(user: &User) -> Self {
        let name = user.email.split('@').next().unwrap_or_default();
        let name = if name.is_empty() { "Profile" } else { name };
        Self::new(name, "yellow")
    }
}

// =============================================================================
// Subscription Models
// =============================================================================

/// A subscription plan from the fixed catalogue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub id: String,
    pub name: String,
    /// Monthly price in dollars
    pub price: f64,
    #[serde(rename = "videoQuality")]
    pub video_quality: String,
    pub resolution: String,
    pub portability: bool,
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - ${:.2}/mo - {} ({})",
            self.name, self.price, self.video_quality, self.resolution
        )
    }
}

/// Benefits listed above the plan table
pub const SUBS_BENEFITS: &[&str] = &[
    "Watch all you want. Ad-free.",
    "Recommendations just for you.",
    "Change or cancel your plan anytime.",
];

/// The plan catalogue offered on the plan selector
pub fn subs_plans() -> Vec<Plan> {
    vec![
        Plan {
            id: "basic".into(),
            name: "Basic".into(),
            price: 9.99,
            video_quality: "Good".into(),
            resolution: "480p".into(),
            portability: true,
        },
        Plan {
            id: "standard".into(),
            name: "Standard".into(),
            price: 15.49,
            video_quality: "Better".into(),
            resolution: "1080p".into(),
            portability: true,
        },
        Plan {
            id: "premium".into(),
            name: "Premium".into(),
            price: 19.99,
            video_quality: "Best".into(),
            resolution: "4K+HDR".into(),
            portability: true,
        },
    ]
}

/// Look up a catalogue plan by id or (case-insensitive) name
pub fn find_plan(key: &str) -> Option<Plan> {
    subs_plans()
        .into_iter()
        .find(|p| p.id == key || p.name.eq_ignore_ascii_case(key))
}

// =============================================================================
// List Models
// =============================================================================

/// User-scoped movie collections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ListKind {
    MyList,
    Liked,
}

impl ListKind {
    /// Collection name in the document store
    pub fn collection(&self) -> &'static str {
        match self {
            ListKind::MyList => "myList",
            ListKind::Liked => "Liked",
        }
    }

    /// Message shown when the collection is empty
    pub fn empty_message(&self) -> &'static str {
        match self {
            ListKind::MyList => "You have no movies in your list.",
            ListKind::Liked => "You have not liked any movies yet.",
        }
    }

    /// Hint shown under the empty message
    pub fn empty_hint(&self) -> &'static str {
        match self {
            ListKind::MyList => "Go back home and add some movies.",
            ListKind::Liked => "Would you not go back home and like some movies.",
        }
    }
}

impl fmt::Display for ListKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListKind::MyList => write!(f, "My List"),
            ListKind::Liked => write!(f, "Liked"),
        }
    }
}
