//! `TmdbClient` - TMDB API transport.

use std::sync::{Arc, PoisonError};
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::instrument;
use url::Url;

use super::endpoint::{CommonParams, Endpoint};
use super::normalize::{self, Normalizer};
use super::pacer::RequestPacer;
use super::params::Locale;
use super::types::TmdbStatus;
use crate::error::{ApiError, NetworkFault, TransportFailure, classify};

/// Default base URL for TMDB API v3.
const DEFAULT_BASE_URL: &str = "https://api.themoviedb.org/3/";

/// Default image CDN base.
const DEFAULT_IMAGE_BASE_URL: &str = "https://image.tmdb.org/t/p";

/// Default page where users approve request tokens.
const DEFAULT_AUTHORIZE_URL: &str = "https://www.themoviedb.org/authenticate/";

/// Default request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// TMDB API client.
///
/// Clones share the HTTP connection pool, the request pacer and the
/// cancellation scope. Use [`TmdbClient::scoped`] for an independent scope.
#[derive(Debug, Clone)]
#[allow(clippy::module_name_repetitions)]
pub struct TmdbClient {
    /// HTTP client.
    http_client: Client,
    /// Base URL for API requests.
    base_url: Url,
    /// Authorization page base.
    authorize_url: Url,
    /// API key sent as a query parameter.
    api_key: String,
    /// Language and region preferences.
    locale: Locale,
    /// Response normalizer.
    pub(crate) normalizer: Normalizer,
    /// Request pacer.
    pacer: Arc<Mutex<RequestPacer>>,
    /// Cancellation scope; replaced on every dismissal.
    scope: Arc<std::sync::Mutex<CancellationToken>>,
    /// Keyword search scope; replaced whenever a new keyword starts.
    search_scope: Arc<std::sync::Mutex<CancellationToken>>,
}

/// Builder for `TmdbClient`.
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub struct TmdbClientBuilder {
    base_url: Option<Url>,
    image_base_url: Option<String>,
    authorize_url: Option<Url>,
    api_key: Option<String>,
    user_agent: Option<String>,
    locale: Option<Locale>,
    timeout: Option<Duration>,
    min_interval: Option<Duration>,
}

impl TmdbClientBuilder {
    /// Creates a new builder.
    const fn new() -> Self {
        Self {
            base_url: None,
            image_base_url: None,
            authorize_url: None,
            api_key: None,
            user_agent: None,
            locale: None,
            timeout: None,
            min_interval: None,
        }
    }

    /// Overrides the base URL (for wiremock in tests).
    #[must_use]
    pub fn base_url(mut self, url: Url) -> Self {
        self.base_url = Some(url);
        self
    }

    /// Overrides the image CDN base.
    #[must_use]
    pub fn image_base_url(mut self, url: impl Into<String>) -> Self {
        self.image_base_url = Some(url.into());
        self
    }

    /// Overrides the authorization page base.
    #[must_use]
    pub fn authorize_url(mut self, url: Url) -> Self {
        self.authorize_url = Some(url);
        self
    }

    /// Sets the API key (required).
    #[must_use]
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the User-Agent (required).
    #[must_use]
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }

    /// Sets language and region (default: en-US / US).
    #[must_use]
    pub fn locale(mut self, locale: Locale) -> Self {
        self.locale = Some(locale);
        self
    }

    /// Sets the request timeout (default: 30s).
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the minimum request interval (default: 25ms).
    #[must_use]
    pub const fn min_interval(mut self, interval: Duration) -> Self {
        self.min_interval = Some(interval);
        self
    }

    /// Builds the client.
    ///
    /// # Errors
    ///
    /// - `api_key` is not set.
    /// - `user_agent` is not set.
    /// - `reqwest::Client` build fails.
    pub fn build(self) -> Result<TmdbClient> {
        let api_key = self.api_key.context("api_key is required")?;
        let user_agent = self.user_agent.context("user_agent is required")?;

        let base_url = match self.base_url {
            Some(url) => url,
            None => Url::parse(DEFAULT_BASE_URL).context("invalid default base URL")?,
        };
        let authorize_url = match self.authorize_url {
            Some(url) => url,
            None => Url::parse(DEFAULT_AUTHORIZE_URL).context("invalid default authorize URL")?,
        };
        let image_base_url = self
            .image_base_url
            .unwrap_or_else(|| String::from(DEFAULT_IMAGE_BASE_URL));

        let pacer = self
            .min_interval
            .map_or_else(RequestPacer::default, RequestPacer::new);

        let http_client = Client::builder()
            .user_agent(&user_agent)
            .timeout(self.timeout.unwrap_or(DEFAULT_TIMEOUT))
            .gzip(true)
            .build()
            .context("failed to build HTTP client")?;

        Ok(TmdbClient {
            http_client,
            base_url,
            authorize_url,
            api_key,
            locale: self.locale.unwrap_or_default(),
            normalizer: Normalizer::new(image_base_url),
            pacer: Arc::new(Mutex::new(pacer)),
            scope: Arc::new(std::sync::Mutex::new(CancellationToken::new())),
            search_scope: Arc::new(std::sync::Mutex::new(CancellationToken::new())),
        })
    }
}

impl TmdbClient {
    /// Creates a new builder.
    #[must_use]
    pub const fn builder() -> TmdbClientBuilder {
        TmdbClientBuilder::new()
    }

    /// Language and region sent with read requests.
    #[must_use]
    pub const fn locale(&self) -> &Locale {
        &self.locale
    }

    /// Returns a client sharing this transport but with its own
    /// cancellation scope.
    #[must_use]
    pub fn scoped(&self) -> Self {
        Self {
            scope: Arc::new(std::sync::Mutex::new(CancellationToken::new())),
            search_scope: Arc::new(std::sync::Mutex::new(CancellationToken::new())),
            ..self.clone()
        }
    }

    /// Cancels every in-flight request issued through this scope.
    ///
    /// Cancelled calls resolve with `ApiError::Unknown`. Requests issued
    /// afterwards are unaffected.
    pub fn dismiss_fetching(&self) {
        replace_token(&self.scope);
        tracing::debug!("dismissed in-flight TMDB requests");
    }

    /// Cancels in-flight keyword searches only.
    fn supersede_search(&self) {
        replace_token(&self.search_scope);
        tracing::debug!("superseded in-flight TMDB searches");
    }

    /// Sends a request within the current cancellation scope.
    #[instrument(skip_all)]
    pub(crate) async fn send<T: DeserializeOwned>(
        &self,
        endpoint: &Endpoint<'_>,
    ) -> Result<T, ApiError> {
        self.send_within(endpoint, CancellationToken::new()).await
    }

    /// Sends a keyword search. Page 1 means a new keyword and supersedes
    /// searches still in flight; other requests are left alone.
    #[instrument(skip_all)]
    pub(crate) async fn send_search<T: DeserializeOwned>(
        &self,
        endpoint: &Endpoint<'_>,
        page: u32,
    ) -> Result<T, ApiError> {
        if page <= 1 {
            self.supersede_search();
        }
        let search = child_of(&self.search_scope);
        self.send_within(endpoint, search).await
    }

    async fn send_within<T: DeserializeOwned>(
        &self,
        endpoint: &Endpoint<'_>,
        extra: CancellationToken,
    ) -> Result<T, ApiError> {
        let scope = child_of(&self.scope);
        tokio::select! {
            () = scope.cancelled() => Self::cancelled(endpoint),
            () = extra.cancelled() => Self::cancelled(endpoint),
            result = self.execute(endpoint) => result,
        }
    }

    fn cancelled<T>(endpoint: &Endpoint<'_>) -> Result<T, ApiError> {
        tracing::debug!(path = %endpoint.path(), "TMDB API request cancelled");
        Err(classify(&TransportFailure::Network(NetworkFault::Cancelled)))
    }

    async fn execute<T: DeserializeOwned>(&self, endpoint: &Endpoint<'_>) -> Result<T, ApiError> {
        let spec = endpoint.request(&CommonParams {
            api_key: &self.api_key,
            locale: &self.locale,
        });

        RequestPacer::wait(&self.pacer).await;

        let url = self.base_url.join(&spec.path).map_err(|e| {
            tracing::warn!(path = %spec.path, error = %e, "failed to join URL path");
            ApiError::Unknown
        })?;

        let mut request = self
            .http_client
            .request(spec.method.clone(), url)
            .query(&spec.query);
        if let Some(body) = &spec.body {
            request = request.json(body);
        }

        tracing::debug!(method = %spec.method, path = %spec.path, "TMDB API request");

        let response = request
            .send()
            .await
            .map_err(|e| transport_error(&spec.path, &e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let status_message = serde_json::from_str::<TmdbStatus>(&body)
                .ok()
                .and_then(|s| s.status_message)
                .unwrap_or_default();
            let kind = classify(&TransportFailure::Status(status.as_u16()));
            tracing::warn!(
                path = %spec.path,
                status = status.as_u16(),
                status_message,
                ?kind,
                "TMDB API error"
            );
            return Err(kind);
        }

        let body = response
            .text()
            .await
            .map_err(|e| transport_error(&spec.path, &e))?;
        normalize::decode(&spec.path, &body)
    }

    /// Authorization page for a request token.
    pub(crate) fn authorization_page(&self, request_token: &str) -> String {
        self.authorize_url
            .join(request_token)
            .map_or_else(
                |_| format!("{}{request_token}", self.authorize_url),
                String::from,
            )
    }
}

/// Cancels the token in `slot` and installs a fresh one.
fn replace_token(slot: &std::sync::Mutex<CancellationToken>) {
    let mut token = slot.lock().unwrap_or_else(PoisonError::into_inner);
    token.cancel();
    *token = CancellationToken::new();
}

/// Child of the token currently in `slot`.
fn child_of(slot: &std::sync::Mutex<CancellationToken>) -> CancellationToken {
    slot.lock()
        .unwrap_or_else(PoisonError::into_inner)
        .child_token()
}

/// Logs a transport failure and classifies it.
fn transport_error(path: &str, err: &reqwest::Error) -> ApiError {
    let kind = classify(&TransportFailure::from(err));
    tracing::warn!(path, error = %err, ?kind, "TMDB API request failed");
    kind
}
