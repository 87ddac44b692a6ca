//! Display-ready values produced by the response normalizer.
//!
//! Every value here is built fresh per call and owned by the caller.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// One page of a paginated listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Paginated<T> {
    /// Items on this page.
    pub items: Vec<T>,
    /// Page number reported by upstream (authoritative, starts at 1).
    pub page: u32,
    /// Total number of pages available upstream (at least 1).
    pub total_pages: u32,
    /// Total number of results across all pages.
    pub total_results: u32,
}

impl<T> Paginated<T> {
    /// Returns `true` if there is no page after this one.
    #[must_use]
    pub const fn is_last(&self) -> bool {
        self.page >= self.total_pages
    }
}

/// Movie summary used by discovery, search, recommendation and watchlist lists.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MovieListItem {
    /// TMDB movie ID.
    pub id: u64,
    /// Localized title, or the original title when the localized one is blank.
    pub title: String,
    /// First `-`-delimited segment of the release date, empty if unknown.
    pub release_year: String,
    /// Vote average rounded to one decimal.
    pub rating: f64,
    /// Fully resolved poster URL, empty if absent.
    pub poster_url: String,
    /// Fully resolved backdrop URL, empty if absent.
    pub backdrop_url: String,
}

impl MovieListItem {
    /// Badge tier for this item's rating.
    #[must_use]
    pub fn rating_tier(&self) -> RatingTier {
        RatingTier::for_rating(self.rating)
    }
}

/// Person summary from `search/person`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PersonListItem {
    /// TMDB person ID.
    pub id: u64,
    /// Display name.
    pub name: String,
    /// Department the person is known for (e.g. "Acting").
    pub known_for_department: String,
    /// Fully resolved profile image URL, empty if absent.
    pub profile_url: String,
}

/// Company summary from `search/company`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompanyListItem {
    /// TMDB company ID.
    pub id: u64,
    /// Company name.
    pub name: String,
    /// Fully resolved logo URL, empty if absent.
    pub logo_url: String,
}

/// Genre entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenreListItem {
    /// TMDB genre ID.
    pub id: u64,
    /// Localized genre name.
    pub name: String,
}

/// Full movie aggregate returned by the detail fetch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Movie {
    /// TMDB movie ID.
    pub id: u64,
    /// Localized title (falls back to the original title).
    pub title: String,
    /// Original title.
    pub original_title: String,
    /// Release date as reported upstream (`YYYY-MM-DD`), empty if unknown.
    pub release_date: String,
    /// Year part of `release_date`.
    pub release_year: String,
    /// Runtime in minutes; absent for unreleased titles.
    pub runtime: Option<u32>,
    /// Vote average rounded to one decimal.
    pub vote_average: f64,
    /// Number of votes.
    pub vote_count: u32,
    /// Overview text.
    pub overview: Option<String>,
    /// Fully resolved poster URL, empty if absent.
    pub poster_url: String,
    /// Fully resolved backdrop URL, empty if absent.
    pub backdrop_url: String,
    /// Genres.
    pub genres: Vec<GenreListItem>,
    /// Trailers and clips from the supported video host.
    pub videos: Vec<Video>,
    /// Posters followed by backdrops.
    pub images: Vec<Image>,
}

/// Playable video attached to a movie.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Video {
    /// Video title.
    pub name: String,
    /// Hosting site.
    pub site: String,
    /// Host-specific key.
    pub key: String,
    /// Playback URL built from `key`.
    pub url: String,
}

/// Image asset attached to a movie.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Image {
    /// Fully resolved image URL.
    pub url: String,
}

/// Cast and crew of a movie.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Credits {
    /// Cast members in billing order.
    pub cast: Vec<CastMember>,
    /// Crew members.
    pub crew: Vec<CrewMember>,
}

/// A cast member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CastMember {
    /// TMDB person ID.
    pub id: u64,
    /// Person name.
    pub name: String,
    /// Character played.
    pub character: String,
    /// Fully resolved profile URL, empty if absent.
    pub profile_url: String,
}

/// A crew member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrewMember {
    /// TMDB person ID.
    pub id: u64,
    /// Person name.
    pub name: String,
    /// Job title (e.g. "Director").
    pub job: String,
    /// Fully resolved profile URL, empty if absent.
    pub profile_url: String,
}

/// The signed-in user's relation to a movie.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AccountState {
    /// Marked as favorite.
    pub favorite: bool,
    /// On the watchlist.
    pub watchlist: bool,
    /// User rating (0-10), `None` if not rated.
    pub rating: Option<u8>,
}

/// Authenticated account details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserAccount {
    /// Numeric account ID used by watchlist and favorite endpoints.
    pub id: u64,
    /// Account username.
    pub username: String,
}

/// Request token issued by the first step of the authentication handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    /// Opaque request token.
    pub request_token: String,
    /// Absolute expiry.
    pub expires_at: DateTime<Utc>,
}

/// Badge colour tier for a rating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RatingTier {
    /// `[0.1, 5.0)`
    Red,
    /// `[5.0, 8.0)`
    Amber,
    /// `[8.0, 10.1)`
    Green,
    /// Unrated (`0`) or out of range.
    Neutral,
}

impl RatingTier {
    /// Picks the tier for a (rounded) rating.
    #[must_use]
    pub fn for_rating(rating: f64) -> Self {
        if (0.1..5.0).contains(&rating) {
            Self::Red
        } else if (5.0..8.0).contains(&rating) {
            Self::Amber
        } else if (8.0..10.1).contains(&rating) {
            Self::Green
        } else {
            Self::Neutral
        }
    }
}

/// Rounds a raw upstream rating to one decimal place.
#[must_use]
pub fn round_rating(raw: f64) -> f64 {
    (raw * 10.0).round() / 10.0
}
