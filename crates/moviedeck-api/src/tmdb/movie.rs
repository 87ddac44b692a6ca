//! Movie detail, credits, recommendations, similar titles and genres.

use tracing::instrument;

use super::api::{LocalGenreApi, LocalMovieDetailApi};
use super::client::TmdbClient;
use super::endpoint::Endpoint;
use super::normalize;
use super::types::{TmdbCredits, TmdbGenreList, TmdbMovieDetails};
use crate::error::ApiError;
use crate::model::{Credits, GenreListItem, Movie, MovieListItem, Paginated};

impl LocalMovieDetailApi for TmdbClient {
    #[instrument(skip_all, fields(id = id))]
    async fn movie(&self, id: u64) -> Result<Movie, ApiError> {
        let raw: TmdbMovieDetails = self.send(&Endpoint::MovieDetails { id }).await?;
        Ok(self.normalizer.movie(raw))
    }

    #[instrument(skip_all, fields(id = id))]
    async fn credits(&self, id: u64) -> Result<Credits, ApiError> {
        let raw: TmdbCredits = self.send(&Endpoint::MovieCredits { id }).await?;
        Ok(self.normalizer.credits(raw))
    }

    #[instrument(skip_all, fields(id = id))]
    async fn recommendations(
        &self,
        id: u64,
        page: u32,
    ) -> Result<Paginated<MovieListItem>, ApiError> {
        self.movie_page(Endpoint::Recommendations { id, page }).await
    }

    #[instrument(skip_all, fields(id = id))]
    async fn similar(&self, id: u64, page: u32) -> Result<Paginated<MovieListItem>, ApiError> {
        self.movie_page(Endpoint::Similar { id, page }).await
    }
}

impl LocalGenreApi for TmdbClient {
    #[instrument(skip_all)]
    async fn genres(&self) -> Result<Vec<GenreListItem>, ApiError> {
        let raw: TmdbGenreList = self.send(&Endpoint::Genres).await?;
        Ok(raw.genres.into_iter().map(normalize::genre).collect())
    }
}
