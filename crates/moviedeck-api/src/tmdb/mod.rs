//! TMDB API client module.
//!
//! Builds requests for TMDB API v3, paces and cancels them, and normalizes
//! responses into the domain model.

mod account;
mod api;
mod client;
mod discover;
mod endpoint;
mod movie;
mod normalize;
mod pacer;
mod params;
mod search;
pub mod types;

pub use account::AccountActions;
#[allow(clippy::module_name_repetitions)]
pub use api::{
    AccountActionsApi, AccountApi, AuthApi, CompanySearchApi, DiscoverApi, GenreApi,
    LocalAccountActionsApi, LocalAccountApi, LocalAuthApi, LocalCompanySearchApi,
    LocalDiscoverApi, LocalGenreApi, LocalMovieDetailApi, LocalMovieSearchApi,
    LocalPersonSearchApi, MovieDetailApi, MovieSearchApi, PersonSearchApi,
};
#[allow(clippy::module_name_repetitions)]
pub use client::{TmdbClient, TmdbClientBuilder};
pub use endpoint::{CommonParams, Endpoint, RequestSpec};
pub use normalize::{ImageKind, Normalizer, image_url, release_year};
pub use params::{DiscoverFilters, Locale, SortBy, SortField, SortOrder};
