//! TMDB API response types.
//!
//! Fields the service may omit or null are `Option` or `#[serde(default)]`;
//! normalization into display values happens in `normalize`.

use serde::Deserialize;

// --- Shared ---

/// Paginated envelope shared by every listing endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbPage<T> {
    /// Current page number.
    pub page: u32,
    /// Page results.
    pub results: Vec<T>,
    /// Total number of pages.
    pub total_pages: u32,
    /// Total number of results.
    #[serde(default)]
    pub total_results: u32,
}

/// Status body returned by mutations and error responses.
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbStatus {
    /// TMDB status code (not the HTTP status).
    #[serde(default)]
    pub status_code: Option<i32>,
    /// Human-readable status message.
    #[serde(default)]
    pub status_message: Option<String>,
    /// Success flag.
    #[serde(default)]
    pub success: Option<bool>,
}

// --- Listings ---

/// A movie in a discovery, search, recommendation or watchlist page.
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbMovieResult {
    /// TMDB movie ID.
    pub id: u64,
    /// Localized title.
    #[serde(default)]
    pub title: Option<String>,
    /// Original title.
    #[serde(default)]
    pub original_title: Option<String>,
    /// Release date (YYYY-MM-DD, empty or null).
    #[serde(default)]
    pub release_date: Option<String>,
    /// Vote average.
    #[serde(default)]
    pub vote_average: f64,
    /// Poster image path.
    #[serde(default)]
    pub poster_path: Option<String>,
    /// Backdrop image path.
    #[serde(default)]
    pub backdrop_path: Option<String>,
}

/// A person in a `search/person` page.
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbPersonResult {
    /// TMDB person ID.
    pub id: u64,
    /// Name.
    pub name: String,
    /// Department the person is known for.
    #[serde(default)]
    pub known_for_department: Option<String>,
    /// Profile image path.
    #[serde(default)]
    pub profile_path: Option<String>,
}

/// A company in a `search/company` page.
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbCompanyResult {
    /// TMDB company ID.
    pub id: u64,
    /// Company name.
    pub name: String,
    /// Logo image path.
    #[serde(default)]
    pub logo_path: Option<String>,
}

// --- Genres ---

/// Response from `genre/movie/list`.
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbGenreList {
    /// All movie genres.
    pub genres: Vec<TmdbGenre>,
}

/// Genre entry.
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbGenre {
    /// Genre ID.
    pub id: u64,
    /// Localized genre name.
    pub name: String,
}

// --- Movie Details ---

/// Response from `movie/{id}` with `append_to_response=videos,images`.
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbMovieDetails {
    /// TMDB movie ID.
    pub id: u64,
    /// Localized title.
    #[serde(default)]
    pub title: Option<String>,
    /// Original title.
    #[serde(default)]
    pub original_title: Option<String>,
    /// Release date.
    #[serde(default)]
    pub release_date: Option<String>,
    /// Runtime in minutes.
    #[serde(default)]
    pub runtime: Option<u32>,
    /// Vote average.
    #[serde(default)]
    pub vote_average: f64,
    /// Vote count.
    #[serde(default)]
    pub vote_count: u32,
    /// Overview text.
    #[serde(default)]
    pub overview: Option<String>,
    /// Poster image path.
    #[serde(default)]
    pub poster_path: Option<String>,
    /// Backdrop image path.
    #[serde(default)]
    pub backdrop_path: Option<String>,
    /// Genres.
    #[serde(default)]
    pub genres: Vec<TmdbGenre>,
    /// Appended videos.
    #[serde(default)]
    pub videos: Option<TmdbVideoList>,
    /// Appended images.
    #[serde(default)]
    pub images: Option<TmdbImageSet>,
}

/// Appended `videos` block.
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbVideoList {
    /// Videos.
    pub results: Vec<TmdbVideo>,
}

/// A video entry.
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbVideo {
    /// Title.
    pub name: String,
    /// Hosting site (e.g. "YouTube").
    pub site: String,
    /// Site-specific key.
    pub key: String,
}

/// Appended `images` block.
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbImageSet {
    /// Poster images.
    #[serde(default)]
    pub posters: Vec<TmdbImage>,
    /// Backdrop images.
    #[serde(default)]
    pub backdrops: Vec<TmdbImage>,
}

/// An image entry.
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbImage {
    /// Relative image path.
    pub file_path: String,
}

// --- Credits ---

/// Response from `movie/{id}/credits`.
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbCredits {
    /// Cast.
    #[serde(default)]
    pub cast: Vec<TmdbCast>,
    /// Crew.
    #[serde(default)]
    pub crew: Vec<TmdbCrew>,
}

/// Cast entry.
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbCast {
    /// Person ID.
    pub id: u64,
    /// Name.
    pub name: String,
    /// Character.
    #[serde(default)]
    pub character: Option<String>,
    /// Profile image path.
    #[serde(default)]
    pub profile_path: Option<String>,
}

/// Crew entry.
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbCrew {
    /// Person ID.
    pub id: u64,
    /// Name.
    pub name: String,
    /// Job.
    #[serde(default)]
    pub job: Option<String>,
    /// Profile image path.
    #[serde(default)]
    pub profile_path: Option<String>,
}

// --- Account States ---

/// Response from `movie/{id}/account_states`.
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbAccountStates {
    /// Favorite flag.
    pub favorite: bool,
    /// Watchlist flag.
    pub watchlist: bool,
    /// Rating, in one of two shapes.
    #[serde(default)]
    pub rated: Option<TmdbRated>,
}

/// The two shapes of the `rated` field.
///
/// Variants are tried in order: `{"value": 8.0}` first, then a bare boolean.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(untagged)]
pub enum TmdbRated {
    /// `{"value": <number>}`.
    Rated {
        /// Rating value.
        value: f64,
    },
    /// `false` when not rated.
    Flag(bool),
}

// --- Authentication ---

/// Response from `authentication/token/new`.
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbRequestToken {
    /// Success flag.
    #[serde(default)]
    pub success: bool,
    /// Expiry (`YYYY-MM-DD HH:MM:SS UTC`).
    pub expires_at: String,
    /// Request token.
    pub request_token: String,
}

/// Response from `authentication/session/new`.
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbSession {
    /// Success flag.
    #[serde(default)]
    pub success: bool,
    /// Session ID.
    pub session_id: String,
}

/// Response from `account`.
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbAccount {
    /// Account ID.
    pub id: u64,
    /// Username.
    #[serde(default)]
    pub username: String,
}
