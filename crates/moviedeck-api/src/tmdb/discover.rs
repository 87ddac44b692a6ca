//! Discovery feeds.

use chrono::Local;
use tracing::instrument;

use super::api::LocalDiscoverApi;
use super::client::TmdbClient;
use super::endpoint::Endpoint;
use super::normalize::Normalizer;
use super::params::DiscoverFilters;
use super::types::{TmdbMovieResult, TmdbPage};
use crate::error::ApiError;
use crate::model::{MovieListItem, Paginated};

impl TmdbClient {
    pub(super) async fn movie_page(
        &self,
        endpoint: Endpoint<'_>,
    ) -> Result<Paginated<MovieListItem>, ApiError> {
        let raw: TmdbPage<TmdbMovieResult> = self.send(&endpoint).await?;
        Ok(self.normalizer.page(raw, Normalizer::movie_item))
    }
}

impl LocalDiscoverApi for TmdbClient {
    #[instrument(skip_all)]
    async fn now_playing(&self, page: u32) -> Result<Paginated<MovieListItem>, ApiError> {
        self.movie_page(Endpoint::NowPlaying { page }).await
    }

    #[instrument(skip_all)]
    async fn latest(&self, page: u32) -> Result<Paginated<MovieListItem>, ApiError> {
        let today = Local::now().date_naive();
        self.movie_page(Endpoint::Latest { page, today }).await
    }

    #[instrument(skip_all)]
    async fn upcoming(&self, page: u32) -> Result<Paginated<MovieListItem>, ApiError> {
        self.movie_page(Endpoint::Upcoming { page }).await
    }

    #[instrument(skip_all)]
    async fn popular(&self, page: u32) -> Result<Paginated<MovieListItem>, ApiError> {
        self.movie_page(Endpoint::Popular { page }).await
    }

    #[instrument(skip_all)]
    async fn top_rated(&self, page: u32) -> Result<Paginated<MovieListItem>, ApiError> {
        self.movie_page(Endpoint::TopRated { page }).await
    }

    #[instrument(skip_all)]
    async fn discover(
        &self,
        filters: &DiscoverFilters,
        page: u32,
    ) -> Result<Paginated<MovieListItem>, ApiError> {
        self.movie_page(Endpoint::DiscoverByFilters { filters, page })
            .await
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::indexing_slicing)]
    #![allow(clippy::float_cmp)]

    use std::time::Duration;

    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::model::RatingTier;
    use crate::paging::PagedList;
    use crate::tmdb::params::{SortBy, SortField, SortOrder};

    fn client_for(server: &MockServer) -> TmdbClient {
        TmdbClient::builder()
            .base_url(format!("{}/3/", server.uri()).parse().unwrap())
            .image_base_url("https://image.tmdb.org/t/p")
            .api_key("test-key")
            .user_agent("test/0.0.0")
            .min_interval(Duration::from_millis(0))
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_now_playing_normalizes_items() {
        // Arrange
        let server = MockServer::start().await;
        let json = include_str!("../../../../fixtures/tmdb/movie_now_playing.json");
        Mock::given(method("GET"))
            .and(path("/3/movie/now_playing"))
            .and(query_param("page", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_string(json))
            .mount(&server)
            .await;
        let client = client_for(&server);

        // Act
        let page = client.now_playing(1).await.unwrap();

        // Assert
        assert_eq!(page.page, 1);
        assert_eq!(page.total_pages, 5);
        assert_eq!(page.items.len(), 1);
        let item = &page.items[0];
        assert_eq!(item.id, 42);
        assert_eq!(item.title, "X");
        assert_eq!(item.release_year, "2024");
        assert_eq!(item.rating, 7.8);
        assert_eq!(item.poster_url, "https://image.tmdb.org/t/p/w500/p.jpg");
        assert_eq!(item.backdrop_url, "");
        assert_eq!(item.rating_tier(), RatingTier::Amber);
    }

    #[tokio::test]
    async fn test_latest_uses_discover_preset() {
        // Arrange
        let server = MockServer::start().await;
        let json = include_str!("../../../../fixtures/tmdb/movie_now_playing.json");
        let today = Local::now().date_naive().format("%Y-%m-%d").to_string();
        Mock::given(method("GET"))
            .and(path("/3/discover/movie"))
            .and(query_param("primary_release_date.lte", today.as_str()))
            .and(query_param("vote_count.gte", "10"))
            .and(query_param("sort_by", "primary_release_date.desc"))
            .respond_with(ResponseTemplate::new(200).set_body_string(json))
            .expect(1)
            .mount(&server)
            .await;
        let client = client_for(&server);

        // Act & Assert (mock expect(1) verifies the preset)
        client.latest(1).await.unwrap();
    }

    #[tokio::test]
    async fn test_discover_second_page_keeps_filters() {
        // Arrange
        let server = MockServer::start().await;
        let json = include_str!("../../../../fixtures/tmdb/movie_now_playing.json");
        for page in ["1", "2"] {
            Mock::given(method("GET"))
                .and(path("/3/discover/movie"))
                .and(query_param("page", page))
                .and(query_param("with_genres", "28,12"))
                .and(query_param("without_genres", "27"))
                .and(query_param("with_people", "287"))
                .and(query_param("with_companies", "420"))
                .and(query_param("vote_average.gte", "5"))
                .and(query_param("vote_average.lte", "9"))
                .and(query_param("vote_count.gte", "50"))
                .and(query_param("primary_release_date.gte", "1990-01-01"))
                .and(query_param("primary_release_date.lte", "2020-12-31"))
                .and(query_param("with_runtime.gte", "80"))
                .and(query_param("with_runtime.lte", "200"))
                .and(query_param("sort_by", "vote_count.desc"))
                .respond_with(ResponseTemplate::new(200).set_body_string(json))
                .expect(1)
                .mount(&server)
                .await;
        }
        let client = client_for(&server);
        let filters = DiscoverFilters {
            genres: vec![28, 12],
            exclude_genres: vec![27],
            people: vec![287],
            companies: vec![420],
            vote_average_min: 5,
            vote_average_max: 9,
            min_vote_count: 50,
            release_year_from: Some(1990),
            release_year_to: Some(2020),
            runtime_min: 80,
            runtime_max: 200,
            sort_by: SortBy::new(SortField::VoteCount, SortOrder::Desc),
        };

        // Act
        let first = client.discover(&filters, 1).await.unwrap();
        let second = client.discover(&filters, 2).await.unwrap();

        // Assert
        assert_eq!(first.total_pages, 5);
        assert_eq!(second.items.len(), 1);
    }

    #[tokio::test]
    async fn test_paged_list_walks_feed_to_last_page() {
        // Arrange
        let server = MockServer::start().await;
        let body = |page: u32| {
            format!(
                r#"{{"page":{page},"total_pages":2,"total_results":2,"results":[{{"id":{page},"title":"M{page}","vote_average":6.0}}]}}"#
            )
        };
        for page in [1u32, 2] {
            Mock::given(method("GET"))
                .and(path("/3/movie/popular"))
                .and(query_param("page", page.to_string()))
                .respond_with(ResponseTemplate::new(200).set_body_string(body(page)))
                .expect(1)
                .mount(&server)
                .await;
        }
        let client = client_for(&server);
        let mut list = PagedList::new();

        // Act
        while let Some(ticket) = list.request_next() {
            let page = client.popular(ticket.page).await.unwrap();
            list.insert(ticket.generation, page);
        }

        // Assert
        let ids: Vec<u64> = list.items().map(|m| m.id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(list.next_page(), None);
    }
}
