//! TMDB client library for moviedeck.
//!
//! Provides the TMDB API client, the response model it normalizes into,
//! paging helpers and the session authentication state machine.

/// Session authentication and credential persistence.
pub mod auth;

/// Error taxonomy.
pub mod error;

/// Normalized domain model.
pub mod model;

/// Incremental paging of list results.
pub mod paging;

/// TMDB API client.
pub mod tmdb;
