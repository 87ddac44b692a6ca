//! Keyword search for movies, people and companies.
//!
//! A first-page search means a new keyword, so it supersedes searches the
//! client still has in flight. Other requests are unaffected.

use tracing::instrument;

use super::api::{LocalCompanySearchApi, LocalMovieSearchApi, LocalPersonSearchApi};
use super::client::TmdbClient;
use super::endpoint::Endpoint;
use super::normalize::Normalizer;
use super::types::{TmdbCompanyResult, TmdbMovieResult, TmdbPage, TmdbPersonResult};
use crate::error::ApiError;
use crate::model::{CompanyListItem, MovieListItem, Paginated, PersonListItem};

impl LocalMovieSearchApi for TmdbClient {
    #[instrument(skip_all)]
    async fn search_movies(
        &self,
        query: &str,
        page: u32,
    ) -> Result<Paginated<MovieListItem>, ApiError> {
        let raw: TmdbPage<TmdbMovieResult> = self
            .send_search(&Endpoint::SearchMovies { query, page }, page)
            .await?;
        Ok(self.normalizer.page(raw, Normalizer::movie_item))
    }
}

impl LocalPersonSearchApi for TmdbClient {
    #[instrument(skip_all)]
    async fn search_people(
        &self,
        query: &str,
        page: u32,
    ) -> Result<Paginated<PersonListItem>, ApiError> {
        let raw: TmdbPage<TmdbPersonResult> = self
            .send_search(&Endpoint::SearchPeople { query, page }, page)
            .await?;
        Ok(self.normalizer.page(raw, Normalizer::person_item))
    }
}

impl LocalCompanySearchApi for TmdbClient {
    #[instrument(skip_all)]
    async fn search_companies(
        &self,
        query: &str,
        page: u32,
    ) -> Result<Paginated<CompanyListItem>, ApiError> {
        let raw: TmdbPage<TmdbCompanyResult> = self
            .send_search(&Endpoint::SearchCompanies { query, page }, page)
            .await?;
        Ok(self.normalizer.page(raw, Normalizer::company_item))
    }
}
