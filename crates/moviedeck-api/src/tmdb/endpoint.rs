//! Request builder: one `Endpoint` variant per logical TMDB operation.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use reqwest::Method;
use serde_json::json;

use super::params::{DiscoverFilters, Locale};

/// Minimum vote count for the "latest" preset.
const LATEST_MIN_VOTE_COUNT: &str = "10";

/// Sort key for the "latest" preset.
const LATEST_SORT_BY: &str = "primary_release_date.desc";

/// Parameters merged into every request.
#[derive(Debug, Clone)]
pub struct CommonParams<'a> {
    /// API key.
    pub api_key: &'a str,
    /// Language/region preference.
    pub locale: &'a Locale,
}

/// Wire-level request description produced by [`Endpoint::request`].
#[derive(Debug, Clone, PartialEq)]
pub struct RequestSpec {
    /// Path relative to the API base URL (no leading slash).
    pub path: String,
    /// HTTP method.
    pub method: Method,
    /// URL query parameters.
    pub query: BTreeMap<&'static str, String>,
    /// JSON body for state-mutating operations.
    pub body: Option<serde_json::Value>,
}

/// Logical TMDB operations.
#[derive(Debug, Clone)]
#[allow(missing_docs)]
pub enum Endpoint<'a> {
    /// `movie/now_playing`.
    NowPlaying { page: u32 },
    /// `discover/movie` with the fixed "latest" preset.
    Latest { page: u32, today: NaiveDate },
    /// `movie/upcoming`.
    Upcoming { page: u32 },
    /// `movie/popular`.
    Popular { page: u32 },
    /// `movie/top_rated`.
    TopRated { page: u32 },
    /// `discover/movie` with caller filters.
    DiscoverByFilters {
        filters: &'a DiscoverFilters,
        page: u32,
    },
    /// `search/movie`.
    SearchMovies { query: &'a str, page: u32 },
    /// `search/person`.
    SearchPeople { query: &'a str, page: u32 },
    /// `search/company`.
    SearchCompanies { query: &'a str, page: u32 },
    /// `genre/movie/list`.
    Genres,
    /// `authentication/token/new`.
    RequestToken,
    /// `authentication/session/new`.
    CreateSession { request_token: &'a str },
    /// `authentication/session` (DELETE).
    DeleteSession { session_id: &'a str },
    /// `account`.
    Account { session_id: &'a str },
    /// `movie/{id}` with videos and images appended.
    MovieDetails { id: u64 },
    /// `movie/{id}/account_states`.
    MovieAccountState { id: u64, session_id: &'a str },
    /// `movie/{id}/rating` (POST).
    RateMovie {
        id: u64,
        rating: u8,
        session_id: &'a str,
    },
    /// `movie/{id}/rating` (DELETE).
    RemoveRating { id: u64, session_id: &'a str },
    /// `account/{account_id}/watchlist`.
    WatchlistStatus {
        account_id: u64,
        movie_id: u64,
        value: bool,
        session_id: &'a str,
    },
    /// `account/{account_id}/favorite`.
    FavoriteStatus {
        account_id: u64,
        movie_id: u64,
        value: bool,
        session_id: &'a str,
    },
    /// `account/{account_id}/watchlist/movies`.
    Watchlist {
        account_id: u64,
        page: u32,
        session_id: &'a str,
    },
    /// `movie/{id}/credits`.
    MovieCredits { id: u64 },
    /// `movie/{id}/recommendations`.
    Recommendations { id: u64, page: u32 },
    /// `movie/{id}/similar`.
    Similar { id: u64, page: u32 },
}

/// Which base parameters an endpoint carries.
enum BaseParams<'a> {
    /// API key, language, region and image language.
    Common,
    /// API key only.
    Key,
    /// API key and session ID.
    Session(&'a str),
}

impl Endpoint<'_> {
    /// Path relative to the API base URL.
    #[must_use]
    pub fn path(&self) -> String {
        match self {
            Self::NowPlaying { .. } => String::from("movie/now_playing"),
            Self::Latest { .. } | Self::DiscoverByFilters { .. } => String::from("discover/movie"),
            Self::Upcoming { .. } => String::from("movie/upcoming"),
            Self::Popular { .. } => String::from("movie/popular"),
            Self::TopRated { .. } => String::from("movie/top_rated"),
            Self::SearchMovies { .. } => String::from("search/movie"),
            Self::SearchPeople { .. } => String::from("search/person"),
            Self::SearchCompanies { .. } => String::from("search/company"),
            Self::Genres => String::from("genre/movie/list"),
            Self::RequestToken => String::from("authentication/token/new"),
            Self::CreateSession { .. } => String::from("authentication/session/new"),
            Self::DeleteSession { .. } => String::from("authentication/session"),
            Self::Account { .. } => String::from("account"),
            Self::MovieDetails { id } => format!("movie/{id}"),
            Self::MovieAccountState { id, .. } => format!("movie/{id}/account_states"),
            Self::RateMovie { id, .. } | Self::RemoveRating { id, .. } => {
                format!("movie/{id}/rating")
            }
            Self::WatchlistStatus { account_id, .. } => format!("account/{account_id}/watchlist"),
            Self::FavoriteStatus { account_id, .. } => format!("account/{account_id}/favorite"),
            Self::Watchlist { account_id, .. } => format!("account/{account_id}/watchlist/movies"),
            Self::MovieCredits { id } => format!("movie/{id}/credits"),
            Self::Recommendations { id, .. } => format!("movie/{id}/recommendations"),
            Self::Similar { id, .. } => format!("movie/{id}/similar"),
        }
    }

    /// HTTP method.
    #[must_use]
    pub fn method(&self) -> Method {
        match self {
            Self::CreateSession { .. }
            | Self::RateMovie { .. }
            | Self::WatchlistStatus { .. }
            | Self::FavoriteStatus { .. } => Method::POST,
            Self::DeleteSession { .. } | Self::RemoveRating { .. } => Method::DELETE,
            _ => Method::GET,
        }
    }

    fn base_params(&self) -> BaseParams<'_> {
        match self {
            Self::RequestToken | Self::CreateSession { .. } | Self::DeleteSession { .. } => {
                BaseParams::Key
            }
            Self::Account { session_id }
            | Self::RateMovie { session_id, .. }
            | Self::RemoveRating { session_id, .. }
            | Self::WatchlistStatus { session_id, .. }
            | Self::FavoriteStatus { session_id, .. } => BaseParams::Session(*session_id),
            _ => BaseParams::Common,
        }
    }

    /// Call-specific query parameters. These win over base parameters.
    fn own_query(&self) -> Vec<(&'static str, String)> {
        match self {
            Self::NowPlaying { page }
            | Self::Upcoming { page }
            | Self::Popular { page }
            | Self::TopRated { page }
            | Self::Recommendations { page, .. }
            | Self::Similar { page, .. } => vec![("page", page.to_string())],
            Self::Latest { page, today } => vec![
                ("page", page.to_string()),
                (
                    "primary_release_date.lte",
                    today.format("%Y-%m-%d").to_string(),
                ),
                ("vote_count.gte", String::from(LATEST_MIN_VOTE_COUNT)),
                ("sort_by", String::from(LATEST_SORT_BY)),
            ],
            Self::DiscoverByFilters { filters, page } => {
                let mut query = filters.to_query();
                query.push(("page", page.to_string()));
                query
            }
            Self::SearchMovies { query, page }
            | Self::SearchPeople { query, page }
            | Self::SearchCompanies { query, page } => {
                vec![("query", String::from(*query)), ("page", page.to_string())]
            }
            Self::MovieDetails { .. } => vec![
                ("append_to_response", String::from("videos,images")),
                ("include_image_language", String::from("en,null")),
            ],
            Self::MovieAccountState { session_id, .. } => {
                vec![("session_id", String::from(*session_id))]
            }
            Self::Watchlist {
                page, session_id, ..
            } => vec![
                ("page", page.to_string()),
                ("session_id", String::from(*session_id)),
            ],
            _ => Vec::new(),
        }
    }

    fn body(&self) -> Option<serde_json::Value> {
        match self {
            Self::CreateSession { request_token } => {
                Some(json!({ "request_token": request_token }))
            }
            Self::DeleteSession { session_id } => Some(json!({ "session_id": session_id })),
            Self::RateMovie { rating, .. } => Some(json!({ "value": rating })),
            Self::WatchlistStatus {
                movie_id, value, ..
            } => Some(json!({
                "media_type": "movie",
                "media_id": movie_id,
                "watchlist": value,
            })),
            Self::FavoriteStatus {
                movie_id, value, ..
            } => Some(json!({
                "media_type": "movie",
                "media_id": movie_id,
                "favorite": value,
            })),
            _ => None,
        }
    }

    /// Builds the wire-level request.
    #[must_use]
    pub fn request(&self, common: &CommonParams<'_>) -> RequestSpec {
        let mut query = BTreeMap::new();
        query.insert("api_key", String::from(common.api_key));
        match self.base_params() {
            BaseParams::Common => {
                query.insert("language", common.locale.language.clone());
                query.insert("region", common.locale.region.clone());
                query.insert("include_image_language", common.locale.image_languages());
            }
            BaseParams::Key => {}
            BaseParams::Session(session_id) => {
                query.insert("session_id", String::from(session_id));
            }
        }
        query.extend(self.own_query());

        RequestSpec {
            path: self.path(),
            method: self.method(),
            query,
            body: self.body(),
        }
    }
}
