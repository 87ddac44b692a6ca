//! Capability traits, one per TMDB resource area.
//!
//! Each trait is implemented by `TmdbClient` and can be replaced by a mock
//! in tests. `trait_variant::make` generates the `Send`-bound variant.
#![allow(clippy::future_not_send)]

use super::params::DiscoverFilters;
use crate::error::ApiError;
use crate::model::{
    AccountState, CompanyListItem, Credits, GenreListItem, IssuedToken, Movie, MovieListItem,
    Paginated, PersonListItem, UserAccount,
};

/// Discovery feeds.
#[allow(clippy::module_name_repetitions)]
#[trait_variant::make(DiscoverApi: Send)]
pub trait LocalDiscoverApi {
    /// Movies now in theatres.
    ///
    /// # Errors
    ///
    /// Returns the classified error of a failed request.
    async fn now_playing(&self, page: u32) -> Result<Paginated<MovieListItem>, ApiError>;

    /// Most recent releases with a minimum number of votes.
    ///
    /// # Errors
    ///
    /// Returns the classified error of a failed request.
    async fn latest(&self, page: u32) -> Result<Paginated<MovieListItem>, ApiError>;

    /// Upcoming releases.
    ///
    /// # Errors
    ///
    /// Returns the classified error of a failed request.
    async fn upcoming(&self, page: u32) -> Result<Paginated<MovieListItem>, ApiError>;

    /// Popular movies.
    ///
    /// # Errors
    ///
    /// Returns the classified error of a failed request.
    async fn popular(&self, page: u32) -> Result<Paginated<MovieListItem>, ApiError>;

    /// Top rated movies.
    ///
    /// # Errors
    ///
    /// Returns the classified error of a failed request.
    async fn top_rated(&self, page: u32) -> Result<Paginated<MovieListItem>, ApiError>;

    /// Movies matching caller-supplied filters.
    ///
    /// # Errors
    ///
    /// Returns the classified error of a failed request.
    async fn discover(
        &self,
        filters: &DiscoverFilters,
        page: u32,
    ) -> Result<Paginated<MovieListItem>, ApiError>;
}

/// Movie search.
#[allow(clippy::module_name_repetitions)]
#[trait_variant::make(MovieSearchApi: Send)]
pub trait LocalMovieSearchApi {
    /// Searches movies by keyword. Page 1 supersedes in-flight requests.
    ///
    /// # Errors
    ///
    /// Returns the classified error of a failed request.
    async fn search_movies(
        &self,
        query: &str,
        page: u32,
    ) -> Result<Paginated<MovieListItem>, ApiError>;
}

/// Person search.
#[allow(clippy::module_name_repetitions)]
#[trait_variant::make(PersonSearchApi: Send)]
pub trait LocalPersonSearchApi {
    /// Searches people by keyword. Page 1 supersedes in-flight requests.
    ///
    /// # Errors
    ///
    /// Returns the classified error of a failed request.
    async fn search_people(
        &self,
        query: &str,
        page: u32,
    ) -> Result<Paginated<PersonListItem>, ApiError>;
}

/// Company search.
#[allow(clippy::module_name_repetitions)]
#[trait_variant::make(CompanySearchApi: Send)]
pub trait LocalCompanySearchApi {
    /// Searches companies by keyword. Page 1 supersedes in-flight requests.
    ///
    /// # Errors
    ///
    /// Returns the classified error of a failed request.
    async fn search_companies(
        &self,
        query: &str,
        page: u32,
    ) -> Result<Paginated<CompanyListItem>, ApiError>;
}

/// Genre list.
#[allow(clippy::module_name_repetitions)]
#[trait_variant::make(GenreApi: Send)]
pub trait LocalGenreApi {
    /// All movie genres.
    ///
    /// # Errors
    ///
    /// Returns the classified error of a failed request.
    async fn genres(&self) -> Result<Vec<GenreListItem>, ApiError>;
}

/// Movie detail and related listings.
#[allow(clippy::module_name_repetitions)]
#[trait_variant::make(MovieDetailApi: Send)]
pub trait LocalMovieDetailApi {
    /// Full movie aggregate (details, videos and images in one request).
    ///
    /// # Errors
    ///
    /// Returns the classified error of a failed request.
    async fn movie(&self, id: u64) -> Result<Movie, ApiError>;

    /// Cast and crew.
    ///
    /// # Errors
    ///
    /// Returns the classified error of a failed request.
    async fn credits(&self, id: u64) -> Result<Credits, ApiError>;

    /// Recommendations based on a movie.
    ///
    /// # Errors
    ///
    /// Returns the classified error of a failed request.
    async fn recommendations(
        &self,
        id: u64,
        page: u32,
    ) -> Result<Paginated<MovieListItem>, ApiError>;

    /// Movies similar to a movie.
    ///
    /// # Errors
    ///
    /// Returns the classified error of a failed request.
    async fn similar(&self, id: u64, page: u32) -> Result<Paginated<MovieListItem>, ApiError>;
}

/// Authentication handshake endpoints.
#[allow(clippy::module_name_repetitions)]
#[trait_variant::make(AuthApi: Send)]
pub trait LocalAuthApi {
    /// Requests a new request token.
    ///
    /// # Errors
    ///
    /// Returns the classified error of a failed request, or `Unknown` if the
    /// expiry cannot be parsed.
    async fn request_token(&self) -> Result<IssuedToken, ApiError>;

    /// Exchanges an approved request token for a session ID.
    ///
    /// # Errors
    ///
    /// Returns the classified error of a failed request.
    async fn create_session(&self, request_token: &str) -> Result<String, ApiError>;

    /// Deletes a session upstream.
    ///
    /// # Errors
    ///
    /// Returns the classified error of a failed request.
    async fn delete_session(&self, session_id: &str) -> Result<(), ApiError>;

    /// Account of a session.
    ///
    /// # Errors
    ///
    /// Returns the classified error of a failed request.
    async fn account(&self, session_id: &str) -> Result<UserAccount, ApiError>;

    /// Web page where the user approves a request token.
    fn authorization_url(&self, request_token: &str) -> String;
}

/// Session-scoped account endpoints.
#[allow(clippy::module_name_repetitions)]
#[trait_variant::make(AccountApi: Send)]
pub trait LocalAccountApi {
    /// The session's favorite/watchlist/rating state for a movie.
    ///
    /// # Errors
    ///
    /// Returns the classified error of a failed request.
    async fn movie_account_state(
        &self,
        movie_id: u64,
        session_id: &str,
    ) -> Result<AccountState, ApiError>;

    /// Rates a movie (0-10).
    ///
    /// # Errors
    ///
    /// Returns the classified error of a failed request.
    async fn rate_movie(&self, movie_id: u64, rating: u8, session_id: &str)
    -> Result<(), ApiError>;

    /// Removes the session's rating of a movie.
    ///
    /// # Errors
    ///
    /// Returns the classified error of a failed request.
    async fn remove_rating(&self, movie_id: u64, session_id: &str) -> Result<(), ApiError>;

    /// Adds a movie to, or removes it from, the watchlist.
    ///
    /// # Errors
    ///
    /// Returns the classified error of a failed request.
    async fn set_watchlist(
        &self,
        account_id: u64,
        movie_id: u64,
        value: bool,
        session_id: &str,
    ) -> Result<(), ApiError>;

    /// Marks or unmarks a movie as favorite.
    ///
    /// # Errors
    ///
    /// Returns the classified error of a failed request.
    async fn set_favorite(
        &self,
        account_id: u64,
        movie_id: u64,
        value: bool,
        session_id: &str,
    ) -> Result<(), ApiError>;

    /// One page of the account's movie watchlist.
    ///
    /// # Errors
    ///
    /// Returns the classified error of a failed request.
    async fn account_watchlist(
        &self,
        account_id: u64,
        page: u32,
        session_id: &str,
    ) -> Result<Paginated<MovieListItem>, ApiError>;
}

/// Account mutations and listings for the signed-in user.
///
/// Implementations resolve the session (and, where needed, the account ID)
/// before calling upstream; without a session every call fails with
/// `ApiError::AuthenticationFail` and no request is sent.
#[allow(clippy::module_name_repetitions)]
#[trait_variant::make(AccountActionsApi: Send)]
pub trait LocalAccountActionsApi {
    /// Adds a movie to the watchlist.
    ///
    /// # Errors
    ///
    /// `AuthenticationFail` without a session, else the classified error.
    async fn add_to_watchlist(&self, movie_id: u64) -> Result<(), ApiError>;

    /// Removes a movie from the watchlist.
    ///
    /// # Errors
    ///
    /// `AuthenticationFail` without a session, else the classified error.
    async fn remove_from_watchlist(&self, movie_id: u64) -> Result<(), ApiError>;

    /// Marks a movie as favorite.
    ///
    /// # Errors
    ///
    /// `AuthenticationFail` without a session, else the classified error.
    async fn favorite_on(&self, movie_id: u64) -> Result<(), ApiError>;

    /// Unmarks a movie as favorite.
    ///
    /// # Errors
    ///
    /// `AuthenticationFail` without a session, else the classified error.
    async fn favorite_off(&self, movie_id: u64) -> Result<(), ApiError>;

    /// Rates a movie (0-10).
    ///
    /// # Errors
    ///
    /// `AuthenticationFail` without a session, else the classified error.
    async fn rate(&self, movie_id: u64, rating: u8) -> Result<(), ApiError>;

    /// Removes the rating of a movie.
    ///
    /// # Errors
    ///
    /// `AuthenticationFail` without a session, else the classified error.
    async fn unrate(&self, movie_id: u64) -> Result<(), ApiError>;

    /// Favorite/watchlist/rating state of a movie.
    ///
    /// # Errors
    ///
    /// `AuthenticationFail` without a session, else the classified error.
    async fn account_state(&self, movie_id: u64) -> Result<AccountState, ApiError>;

    /// One page of the watchlist.
    ///
    /// # Errors
    ///
    /// `AuthenticationFail` without a session, else the classified error.
    async fn watchlist(&self, page: u32) -> Result<Paginated<MovieListItem>, ApiError>;
}
