//! Authentication handshake and session-scoped account endpoints.
#![allow(clippy::future_not_send)]

use chrono::NaiveDateTime;
use tracing::instrument;

use super::api::{LocalAccountActionsApi, LocalAccountApi, LocalAuthApi};
use super::client::TmdbClient;
use super::endpoint::Endpoint;
use super::normalize;
use super::types::{TmdbAccount, TmdbAccountStates, TmdbRequestToken, TmdbSession, TmdbStatus};
use crate::auth::LocalAuthentication;
use crate::error::ApiError;
use crate::model::{AccountState, IssuedToken, MovieListItem, Paginated, UserAccount};

/// Expiry format of issued request tokens.
const TOKEN_EXPIRY_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";

impl TmdbClient {
    /// Sends a mutation and checks the reported status.
    async fn mutate(&self, endpoint: Endpoint<'_>) -> Result<(), ApiError> {
        let status: TmdbStatus = self.send(&endpoint).await?;
        if status.success == Some(false) {
            tracing::warn!(
                path = %endpoint.path(),
                status_code = ?status.status_code,
                "TMDB rejected the mutation"
            );
            return Err(ApiError::Unknown);
        }
        Ok(())
    }
}

/// Parses the expiry of an issued request token.
fn parse_token_expiry(raw: &TmdbRequestToken) -> Result<IssuedToken, ApiError> {
    let expires_at = NaiveDateTime::parse_from_str(&raw.expires_at, TOKEN_EXPIRY_FORMAT)
        .map_err(|e| {
            tracing::warn!(expires_at = %raw.expires_at, error = %e, "unparseable token expiry");
            ApiError::Unknown
        })?
        .and_utc();
    Ok(IssuedToken {
        request_token: raw.request_token.clone(),
        expires_at,
    })
}

impl LocalAuthApi for TmdbClient {
    #[instrument(skip_all)]
    async fn request_token(&self) -> Result<IssuedToken, ApiError> {
        let raw: TmdbRequestToken = self.send(&Endpoint::RequestToken).await?;
        if !raw.success {
            tracing::warn!("token request reported failure");
            return Err(ApiError::Unknown);
        }
        parse_token_expiry(&raw)
    }

    #[instrument(skip_all)]
    async fn create_session(&self, request_token: &str) -> Result<String, ApiError> {
        let raw: TmdbSession = self.send(&Endpoint::CreateSession { request_token }).await?;
        if !raw.success || raw.session_id.is_empty() {
            tracing::warn!("session creation reported failure");
            return Err(ApiError::Unknown);
        }
        Ok(raw.session_id)
    }

    #[instrument(skip_all)]
    async fn delete_session(&self, session_id: &str) -> Result<(), ApiError> {
        self.mutate(Endpoint::DeleteSession { session_id }).await
    }

    #[instrument(skip_all)]
    async fn account(&self, session_id: &str) -> Result<UserAccount, ApiError> {
        let raw: TmdbAccount = self.send(&Endpoint::Account { session_id }).await?;
        Ok(normalize::account(raw))
    }

    fn authorization_url(&self, request_token: &str) -> String {
        self.authorization_page(request_token)
    }
}

impl LocalAccountApi for TmdbClient {
    #[instrument(skip_all, fields(movie_id = movie_id))]
    async fn movie_account_state(
        &self,
        movie_id: u64,
        session_id: &str,
    ) -> Result<AccountState, ApiError> {
        let raw: TmdbAccountStates = self
            .send(&Endpoint::MovieAccountState {
                id: movie_id,
                session_id,
            })
            .await?;
        normalize::account_state(raw)
    }

    #[instrument(skip_all, fields(movie_id = movie_id))]
    async fn rate_movie(
        &self,
        movie_id: u64,
        rating: u8,
        session_id: &str,
    ) -> Result<(), ApiError> {
        self.mutate(Endpoint::RateMovie {
            id: movie_id,
            rating,
            session_id,
        })
        .await
    }

    #[instrument(skip_all, fields(movie_id = movie_id))]
    async fn remove_rating(&self, movie_id: u64, session_id: &str) -> Result<(), ApiError> {
        self.mutate(Endpoint::RemoveRating {
            id: movie_id,
            session_id,
        })
        .await
    }

    #[instrument(skip_all, fields(movie_id = movie_id))]
    async fn set_watchlist(
        &self,
        account_id: u64,
        movie_id: u64,
        value: bool,
        session_id: &str,
    ) -> Result<(), ApiError> {
        self.mutate(Endpoint::WatchlistStatus {
            account_id,
            movie_id,
            value,
            session_id,
        })
        .await
    }

    #[instrument(skip_all, fields(movie_id = movie_id))]
    async fn set_favorite(
        &self,
        account_id: u64,
        movie_id: u64,
        value: bool,
        session_id: &str,
    ) -> Result<(), ApiError> {
        self.mutate(Endpoint::FavoriteStatus {
            account_id,
            movie_id,
            value,
            session_id,
        })
        .await
    }

    #[instrument(skip_all)]
    async fn account_watchlist(
        &self,
        account_id: u64,
        page: u32,
        session_id: &str,
    ) -> Result<Paginated<MovieListItem>, ApiError> {
        self.movie_page(Endpoint::Watchlist {
            account_id,
            page,
            session_id,
        })
        .await
    }
}

/// Account actions of the signed-in user.
///
/// Resolves the session from `auth` on every call; the account ID is
/// fetched only by the watchlist and favorite operations.
#[derive(Debug)]
pub struct AccountActions<'a, A, S> {
    api: &'a A,
    auth: &'a S,
}

impl<'a, A, S> AccountActions<'a, A, S>
where
    A: LocalAccountApi + Sync,
    S: LocalAuthentication + Sync,
{
    /// Binds account endpoints to an authentication state machine.
    pub const fn new(api: &'a A, auth: &'a S) -> Self {
        Self { api, auth }
    }

    async fn session(&self) -> Result<String, ApiError> {
        self.auth.current_session_id().await.ok_or_else(|| {
            tracing::debug!("account action attempted without a session");
            ApiError::AuthenticationFail
        })
    }

    async fn session_and_account(&self) -> Result<(String, u64), ApiError> {
        let (session_id, account) = self.auth.session_account().await?;
        Ok((session_id, account.id))
    }

    async fn watchlist_to(&self, movie_id: u64, value: bool) -> Result<(), ApiError> {
        let (session_id, account_id) = self.session_and_account().await?;
        self.api
            .set_watchlist(account_id, movie_id, value, &session_id)
            .await
    }

    async fn favorite_to(&self, movie_id: u64, value: bool) -> Result<(), ApiError> {
        let (session_id, account_id) = self.session_and_account().await?;
        self.api
            .set_favorite(account_id, movie_id, value, &session_id)
            .await
    }
}

impl<A, S> LocalAccountActionsApi for AccountActions<'_, A, S>
where
    A: LocalAccountApi + Sync,
    S: LocalAuthentication + Sync,
{
    async fn add_to_watchlist(&self, movie_id: u64) -> Result<(), ApiError> {
        self.watchlist_to(movie_id, true).await
    }

    async fn remove_from_watchlist(&self, movie_id: u64) -> Result<(), ApiError> {
        self.watchlist_to(movie_id, false).await
    }

    async fn favorite_on(&self, movie_id: u64) -> Result<(), ApiError> {
        self.favorite_to(movie_id, true).await
    }

    async fn favorite_off(&self, movie_id: u64) -> Result<(), ApiError> {
        self.favorite_to(movie_id, false).await
    }

    async fn rate(&self, movie_id: u64, rating: u8) -> Result<(), ApiError> {
        if rating > 10 {
            tracing::warn!(rating, "rating out of range");
            return Err(ApiError::Unknown);
        }
        let session_id = self.session().await?;
        self.api.rate_movie(movie_id, rating, &session_id).await
    }

    async fn unrate(&self, movie_id: u64) -> Result<(), ApiError> {
        let session_id = self.session().await?;
        self.api.remove_rating(movie_id, &session_id).await
    }

    async fn account_state(&self, movie_id: u64) -> Result<AccountState, ApiError> {
        let session_id = self.session().await?;
        self.api.movie_account_state(movie_id, &session_id).await
    }

    async fn watchlist(&self, page: u32) -> Result<Paginated<MovieListItem>, ApiError> {
        let (session_id, account_id) = self.session_and_account().await?;
        self.api
            .account_watchlist(account_id, page, &session_id)
            .await
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use std::time::Duration;

    use chrono::{TimeZone, Utc};
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::auth::{Authenticator, CredentialState, MemoryCredentialStore};

    fn client_for(server: &MockServer) -> TmdbClient {
        TmdbClient::builder()
            .base_url(format!("{}/3/", server.uri()).parse().unwrap())
            .api_key("test-key")
            .user_agent("test/0.0.0")
            .min_interval(Duration::from_millis(0))
            .build()
            .unwrap()
    }

    fn signed_in(client: TmdbClient) -> Authenticator<TmdbClient, MemoryCredentialStore> {
        Authenticator::new(
            client,
            MemoryCredentialStore::with_state(CredentialState::session_active("sess")),
        )
    }

    async fn mount_account(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/3/account"))
            .and(query_param("session_id", "sess"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(include_str!("../../../../fixtures/tmdb/account.json")),
            )
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_request_token_parses_expiry() {
        // Arrange
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/3/authentication/token/new"))
            .respond_with(ResponseTemplate::new(200).set_body_string(include_str!(
                "../../../../fixtures/tmdb/authentication_token_new.json"
            )))
            .mount(&server)
            .await;
        let client = client_for(&server);

        // Act
        let token = client.request_token().await.unwrap();

        // Assert
        assert_eq!(
            token.request_token,
            "ff5c7eeb5a8870efe3cd7fc5c282cffd26800ecd"
        );
        assert_eq!(
            token.expires_at,
            Utc.with_ymd_and_hms(2030, 1, 1, 12, 0, 0).unwrap()
        );
    }

    #[tokio::test]
    async fn test_request_token_with_bad_expiry_is_unknown() {
        // Arrange
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/3/authentication/token/new"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": true,
                "expires_at": "tomorrow",
                "request_token": "t"
            })))
            .mount(&server)
            .await;
        let client = client_for(&server);

        // Act
        let result = client.request_token().await;

        // Assert
        assert_eq!(result.unwrap_err(), ApiError::Unknown);
    }

    #[tokio::test]
    async fn test_authorization_url() {
        // Arrange
        let server = MockServer::start().await;
        let client = client_for(&server);

        // Act
        let url = client.authorization_url("abc");

        // Assert
        assert_eq!(url, "https://www.themoviedb.org/authenticate/abc");
    }

    #[tokio::test]
    async fn test_account_state_with_rating() {
        // Arrange
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/3/movie/550/account_states"))
            .and(query_param("session_id", "sess"))
            .respond_with(ResponseTemplate::new(200).set_body_string(include_str!(
                "../../../../fixtures/tmdb/movie_account_states_rated.json"
            )))
            .mount(&server)
            .await;
        let auth = signed_in(client_for(&server));
        let actions = AccountActions::new(auth.backend(), &auth);

        // Act
        let state = actions.account_state(550).await.unwrap();

        // Assert
        assert!(state.favorite);
        assert!(!state.watchlist);
        assert_eq!(state.rating, Some(9));
    }

    #[tokio::test]
    async fn test_rate_sends_value() {
        // Arrange
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/3/movie/550/rating"))
            .and(query_param("session_id", "sess"))
            .and(body_json(serde_json::json!({ "value": 8 })))
            .respond_with(ResponseTemplate::new(201).set_body_string(include_str!(
                "../../../../fixtures/tmdb/status_success.json"
            )))
            .expect(1)
            .mount(&server)
            .await;
        let auth = signed_in(client_for(&server));
        let actions = AccountActions::new(auth.backend(), &auth);

        // Act & Assert
        actions.rate(550, 8).await.unwrap();
    }

    #[tokio::test]
    async fn test_rate_out_of_range_sends_nothing() {
        // Arrange
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(201))
            .expect(0)
            .mount(&server)
            .await;
        let auth = signed_in(client_for(&server));
        let actions = AccountActions::new(auth.backend(), &auth);

        // Act
        let result = actions.rate(550, 11).await;

        // Assert
        assert_eq!(result.unwrap_err(), ApiError::Unknown);
    }

    #[tokio::test]
    async fn test_unrate_deletes_rating() {
        // Arrange
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/3/movie/550/rating"))
            .respond_with(ResponseTemplate::new(200).set_body_string(include_str!(
                "../../../../fixtures/tmdb/status_success.json"
            )))
            .expect(1)
            .mount(&server)
            .await;
        let auth = signed_in(client_for(&server));
        let actions = AccountActions::new(auth.backend(), &auth);

        // Act & Assert
        actions.unrate(550).await.unwrap();
    }

    #[tokio::test]
    async fn test_add_to_watchlist_resolves_account() {
        // Arrange
        let server = MockServer::start().await;
        mount_account(&server).await;
        Mock::given(method("POST"))
            .and(path("/3/account/548/watchlist"))
            .and(query_param("session_id", "sess"))
            .and(body_json(serde_json::json!({
                "media_type": "movie",
                "media_id": 550,
                "watchlist": true
            })))
            .respond_with(ResponseTemplate::new(201).set_body_string(include_str!(
                "../../../../fixtures/tmdb/status_success.json"
            )))
            .expect(1)
            .mount(&server)
            .await;
        let auth = signed_in(client_for(&server));
        let actions = AccountActions::new(auth.backend(), &auth);

        // Act & Assert
        actions.add_to_watchlist(550).await.unwrap();
    }

    #[tokio::test]
    async fn test_favorite_off_sends_false() {
        // Arrange
        let server = MockServer::start().await;
        mount_account(&server).await;
        Mock::given(method("POST"))
            .and(path("/3/account/548/favorite"))
            .and(body_json(serde_json::json!({
                "media_type": "movie",
                "media_id": 550,
                "favorite": false
            })))
            .respond_with(ResponseTemplate::new(201).set_body_string(include_str!(
                "../../../../fixtures/tmdb/status_success.json"
            )))
            .expect(1)
            .mount(&server)
            .await;
        let auth = signed_in(client_for(&server));
        let actions = AccountActions::new(auth.backend(), &auth);

        // Act & Assert
        actions.favorite_off(550).await.unwrap();
    }

    #[tokio::test]
    async fn test_rejected_mutation_is_unknown() {
        // Arrange
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/3/movie/550/rating"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": false,
                "status_code": 12,
                "status_message": "nope"
            })))
            .mount(&server)
            .await;
        let auth = signed_in(client_for(&server));
        let actions = AccountActions::new(auth.backend(), &auth);

        // Act
        let result = actions.rate(550, 5).await;

        // Assert
        assert_eq!(result.unwrap_err(), ApiError::Unknown);
    }

    #[tokio::test]
    async fn test_watchlist_page() {
        // Arrange
        let server = MockServer::start().await;
        mount_account(&server).await;
        Mock::given(method("GET"))
            .and(path("/3/account/548/watchlist/movies"))
            .and(query_param("page", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_string(include_str!(
                "../../../../fixtures/tmdb/account_watchlist_movies.json"
            )))
            .mount(&server)
            .await;
        let auth = signed_in(client_for(&server));
        let actions = AccountActions::new(auth.backend(), &auth);

        // Act
        let page = actions.watchlist(2).await.unwrap();

        // Assert
        assert_eq!(page.page, 2);
        assert!(page.is_last());
        assert_eq!(page.items.first().map(|m| m.id), Some(550));
    }

    #[tokio::test]
    async fn test_actions_without_session_send_nothing() {
        // Arrange
        let server = MockServer::start().await;
        Mock::given(wiremock::matchers::any())
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;
        let auth = Authenticator::new(client_for(&server), MemoryCredentialStore::default());
        let actions = AccountActions::new(auth.backend(), &auth);

        // Act
        let results = [
            actions.add_to_watchlist(1).await,
            actions.remove_from_watchlist(1).await,
            actions.favorite_on(1).await,
            actions.rate(1, 5).await,
            actions.unrate(1).await,
        ];

        // Assert
        for result in results {
            assert_eq!(result.unwrap_err(), ApiError::AuthenticationFail);
        }
        assert_eq!(
            actions.watchlist(1).await.unwrap_err(),
            ApiError::AuthenticationFail
        );
    }
}
