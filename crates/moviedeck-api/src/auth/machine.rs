//! Authentication state machine.
//!
//! ```text
//! Unauthenticated --authenticate--> TokenIssued --refresh_session--> SessionActive
//!        ^                               |                                |
//!        +------ expiry / logout --------+------------- logout -----------+
//! ```
//!
//! Every transition runs while holding the store lock, so concurrent calls
//! observe each other's results instead of interleaving.
#![allow(clippy::future_not_send)]

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Local};
use tokio::sync::Mutex;
use tracing::instrument;

use super::state::{AuthPhase, CredentialState};
use super::store::CredentialStore;
use crate::error::ApiError;
use crate::model::UserAccount;
use crate::tmdb::LocalAuthApi;

/// Source of the current local time.
pub type Clock = Arc<dyn Fn() -> DateTime<Local> + Send + Sync>;

/// Result of [`LocalAuthentication::authenticate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Authorization {
    /// The user must approve the request token at this URL.
    AwaitingApproval(String),
    /// A session is already active; nothing to approve.
    AlreadyAuthenticated,
}

/// Session authentication capability.
#[allow(clippy::module_name_repetitions)]
#[trait_variant::make(Authentication: Send)]
pub trait LocalAuthentication {
    /// Starts (or resumes) the handshake and returns where the user approves it.
    ///
    /// Re-invoking while a valid token is pending returns the same URL
    /// without a network call.
    ///
    /// # Errors
    ///
    /// - The classified error if the token request fails.
    /// - `AuthenticationFail` if the pending token expired; state is reset
    ///   and the caller starts over.
    async fn authenticate(&self) -> Result<Authorization, ApiError>;

    /// Exchanges a pending approved token for a session.
    ///
    /// Does nothing when unauthenticated or already in a session. An expired
    /// token resets to `Unauthenticated` without a network call.
    ///
    /// # Errors
    ///
    /// The classified error if the exchange fails; the phase is unchanged.
    async fn refresh_session(&self) -> Result<AuthPhase, ApiError>;

    /// Ends the session. Local credentials are always cleared.
    ///
    /// # Errors
    ///
    /// The classified error if upstream session deletion fails.
    async fn logout(&self) -> Result<(), ApiError>;

    /// Current phase.
    async fn phase(&self) -> AuthPhase;

    /// `true` while a session is active.
    async fn is_authenticated(&self) -> bool;

    /// Session ID while a session is active.
    async fn current_session_id(&self) -> Option<String>;

    /// Account details of the active session.
    ///
    /// # Errors
    ///
    /// `AuthenticationFail` without a session, else the classified error.
    async fn account_details(&self) -> Result<UserAccount, ApiError>;

    /// Session ID together with the account it belongs to, read from one
    /// snapshot of the stored state.
    ///
    /// # Errors
    ///
    /// `AuthenticationFail` without a session, else the classified error.
    async fn session_account(&self) -> Result<(String, UserAccount), ApiError>;
}

/// Authentication state machine over an API backend and a credential store.
pub struct Authenticator<B, S> {
    backend: B,
    store: Mutex<S>,
    clock: Clock,
}

impl<B: fmt::Debug, S: fmt::Debug> fmt::Debug for Authenticator<B, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Authenticator")
            .field("backend", &self.backend)
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}

impl<B, S: CredentialStore> Authenticator<B, S> {
    /// Creates a state machine using the system clock.
    pub fn new(backend: B, store: S) -> Self {
        Self {
            backend,
            store: Mutex::new(store),
            clock: Arc::new(Local::now),
        }
    }

    /// Replaces the clock.
    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// The API backend.
    pub const fn backend(&self) -> &B {
        &self.backend
    }

    /// Loads and repairs the stored state.
    fn load(store: &S) -> CredentialState {
        match store.load() {
            Ok(state) => {
                let (healed, changed) = state.healed();
                if changed {
                    tracing::warn!(phase = %healed.phase, "repaired inconsistent credential state");
                    // The repaired state is used even if it cannot be saved.
                    if let Err(kind) = Self::persist(store, &healed) {
                        tracing::debug!(?kind, "continuing with unsaved repaired state");
                    }
                }
                healed
            }
            Err(e) => {
                tracing::warn!(error = ?e, "failed to load credentials, starting unauthenticated");
                if let Err(kind) = Self::reset(store) {
                    tracing::debug!(?kind, "continuing with unsaved default state");
                }
                CredentialState::default()
            }
        }
    }

    fn persist(store: &S, state: &CredentialState) -> Result<(), ApiError> {
        store.save(state).map_err(|e| {
            tracing::warn!(error = ?e, "failed to persist credentials");
            ApiError::Unknown
        })
    }

    fn reset(store: &S) -> Result<(), ApiError> {
        store.reset().map_err(|e| {
            tracing::warn!(error = ?e, "failed to reset credentials");
            ApiError::Unknown
        })
    }

    fn transition(from: AuthPhase, to: AuthPhase) {
        tracing::info!(from = %from, to = %to, "authentication state changed");
    }
}

impl<B, S> LocalAuthentication for Authenticator<B, S>
where
    B: LocalAuthApi + Sync,
    S: CredentialStore + Send,
{
    #[instrument(skip_all)]
    async fn authenticate(&self) -> Result<Authorization, ApiError> {
        let store = self.store.lock().await;
        let state = Self::load(&store);

        match state.phase {
            AuthPhase::SessionActive => Ok(Authorization::AlreadyAuthenticated),
            AuthPhase::TokenIssued => {
                if let Some(token) = state.valid_token((self.clock)()) {
                    tracing::debug!("reusing pending request token");
                    return Ok(Authorization::AwaitingApproval(
                        self.backend.authorization_url(token),
                    ));
                }
                Self::reset(&store)?;
                Self::transition(AuthPhase::TokenIssued, AuthPhase::Unauthenticated);
                Err(ApiError::AuthenticationFail)
            }
            AuthPhase::Unauthenticated => {
                let issued = self.backend.request_token().await?;
                let next = CredentialState::token_issued(
                    issued.request_token,
                    issued.expires_at.with_timezone(&Local),
                );
                Self::persist(&store, &next)?;
                Self::transition(AuthPhase::Unauthenticated, AuthPhase::TokenIssued);
                let token = next.request_token.as_deref().unwrap_or_default();
                Ok(Authorization::AwaitingApproval(
                    self.backend.authorization_url(token),
                ))
            }
        }
    }

    #[instrument(skip_all)]
    async fn refresh_session(&self) -> Result<AuthPhase, ApiError> {
        let store = self.store.lock().await;
        let state = Self::load(&store);

        if state.phase != AuthPhase::TokenIssued {
            return Ok(state.phase);
        }

        let Some(token) = state.valid_token((self.clock)()) else {
            Self::reset(&store)?;
            Self::transition(AuthPhase::TokenIssued, AuthPhase::Unauthenticated);
            return Ok(AuthPhase::Unauthenticated);
        };

        let session_id = self.backend.create_session(token).await?;
        Self::persist(&store, &CredentialState::session_active(session_id))?;
        Self::transition(AuthPhase::TokenIssued, AuthPhase::SessionActive);
        Ok(AuthPhase::SessionActive)
    }

    #[instrument(skip_all)]
    async fn logout(&self) -> Result<(), ApiError> {
        let store = self.store.lock().await;
        let state = Self::load(&store);

        let deleted = match (state.phase, state.session_id.as_deref()) {
            (AuthPhase::SessionActive, Some(session_id)) => {
                let result = self.backend.delete_session(session_id).await;
                if let Err(kind) = result {
                    tracing::warn!(?kind, "upstream session deletion failed, clearing locally");
                }
                result
            }
            _ => Ok(()),
        };

        Self::reset(&store)?;
        if state.phase != AuthPhase::Unauthenticated {
            Self::transition(state.phase, AuthPhase::Unauthenticated);
        }
        deleted
    }

    async fn phase(&self) -> AuthPhase {
        let store = self.store.lock().await;
        Self::load(&store).phase
    }

    async fn is_authenticated(&self) -> bool {
        self.phase().await == AuthPhase::SessionActive
    }

    async fn current_session_id(&self) -> Option<String> {
        let store = self.store.lock().await;
        let state = Self::load(&store);
        match state.phase {
            AuthPhase::SessionActive => state.session_id,
            AuthPhase::Unauthenticated | AuthPhase::TokenIssued => None,
        }
    }

    async fn account_details(&self) -> Result<UserAccount, ApiError> {
        self.session_account().await.map(|(_, account)| account)
    }

    #[instrument(skip_all)]
    async fn session_account(&self) -> Result<(String, UserAccount), ApiError> {
        let Some(session_id) = self.current_session_id().await else {
            tracing::debug!("account details requested without a session");
            return Err(ApiError::AuthenticationFail);
        };
        let account = self.backend.account(&session_id).await?;
        Ok((session_id, account))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::arithmetic_side_effects)]

    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    use chrono::{TimeDelta, TimeZone, Utc};
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::auth::store::MemoryCredentialStore;
    use crate::model::IssuedToken;
    use crate::tmdb::TmdbClient;

    /// Mock backend counting calls.
    #[derive(Debug, Default)]
    struct MockAuthApi {
        token_calls: AtomicU32,
        session_calls: AtomicU32,
        delete_calls: AtomicU32,
        fail_delete: bool,
        fail_session: bool,
    }

    impl LocalAuthApi for MockAuthApi {
        async fn request_token(&self) -> Result<IssuedToken, ApiError> {
            let n = self.token_calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(10)).await;
            Ok(IssuedToken {
                request_token: format!("token-{n}"),
                expires_at: Utc::now() + TimeDelta::hours(1),
            })
        }

        async fn create_session(&self, request_token: &str) -> Result<String, ApiError> {
            self.session_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_session {
                return Err(ApiError::AuthenticationFail);
            }
            Ok(format!("session-for-{request_token}"))
        }

        async fn delete_session(&self, _session_id: &str) -> Result<(), ApiError> {
            self.delete_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_delete {
                return Err(ApiError::NoInternetConnection);
            }
            Ok(())
        }

        async fn account(&self, _session_id: &str) -> Result<UserAccount, ApiError> {
            Ok(UserAccount {
                id: 548,
                username: String::from("travisbell"),
            })
        }

        fn authorization_url(&self, request_token: &str) -> String {
            format!("https://auth.example/{request_token}")
        }
    }

    fn fixed_clock(now: DateTime<Local>) -> Clock {
        Arc::new(move || now)
    }

    #[tokio::test]
    async fn test_authenticate_issues_token() {
        // Arrange
        let auth = Authenticator::new(MockAuthApi::default(), MemoryCredentialStore::default());

        // Act
        let result = auth.authenticate().await.unwrap();

        // Assert
        assert_eq!(
            result,
            Authorization::AwaitingApproval(String::from("https://auth.example/token-0"))
        );
        assert_eq!(auth.phase().await, AuthPhase::TokenIssued);
        assert!(!auth.is_authenticated().await);
        assert_eq!(auth.current_session_id().await, None);
    }

    #[tokio::test]
    async fn test_authenticate_twice_reuses_token() {
        // Arrange
        let auth = Authenticator::new(MockAuthApi::default(), MemoryCredentialStore::default());

        // Act
        let first = auth.authenticate().await.unwrap();
        let second = auth.authenticate().await.unwrap();

        // Assert
        assert_eq!(first, second);
        assert_eq!(auth.backend().token_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_concurrent_authenticate_requests_one_token() {
        // Arrange
        let auth = Authenticator::new(MockAuthApi::default(), MemoryCredentialStore::default());

        // Act
        let (first, second) = tokio::join!(auth.authenticate(), auth.authenticate());

        // Assert
        assert_eq!(first.unwrap(), second.unwrap());
        assert_eq!(auth.backend().token_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_authenticate_with_expired_token_resets() {
        // Arrange
        let now = Local.with_ymd_and_hms(2030, 1, 1, 12, 0, 0).unwrap();
        let store = MemoryCredentialStore::with_state(CredentialState::token_issued(
            "old",
            now - TimeDelta::seconds(1),
        ));
        let auth =
            Authenticator::new(MockAuthApi::default(), store).with_clock(fixed_clock(now));

        // Act
        let result = auth.authenticate().await;

        // Assert
        assert_eq!(result.unwrap_err(), ApiError::AuthenticationFail);
        assert_eq!(auth.phase().await, AuthPhase::Unauthenticated);
        assert_eq!(auth.backend().token_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_token_expiring_now_is_still_valid() {
        // Arrange
        let now = Local.with_ymd_and_hms(2030, 1, 1, 12, 0, 0).unwrap();
        let store = MemoryCredentialStore::with_state(CredentialState::token_issued("tok", now));
        let auth =
            Authenticator::new(MockAuthApi::default(), store).with_clock(fixed_clock(now));

        // Act
        let phase = auth.refresh_session().await.unwrap();

        // Assert
        assert_eq!(phase, AuthPhase::SessionActive);
        assert_eq!(
            auth.current_session_id().await.as_deref(),
            Some("session-for-tok")
        );
    }

    #[tokio::test]
    async fn test_refresh_with_expired_token_skips_exchange() {
        // Arrange
        let now = Local.with_ymd_and_hms(2030, 1, 1, 12, 0, 0).unwrap();
        let store = MemoryCredentialStore::with_state(CredentialState::token_issued(
            "tok",
            now - TimeDelta::minutes(5),
        ));
        let auth =
            Authenticator::new(MockAuthApi::default(), store).with_clock(fixed_clock(now));

        // Act
        let phase = auth.refresh_session().await.unwrap();

        // Assert
        assert_eq!(phase, AuthPhase::Unauthenticated);
        assert_eq!(auth.backend().session_calls.load(Ordering::SeqCst), 0);
        assert_eq!(auth.phase().await, AuthPhase::Unauthenticated);
    }

    #[tokio::test]
    async fn test_refresh_failure_keeps_phase() {
        // Arrange
        let store = MemoryCredentialStore::with_state(CredentialState::token_issued(
            "tok",
            Local::now() + TimeDelta::hours(1),
        ));
        let backend = MockAuthApi {
            fail_session: true,
            ..MockAuthApi::default()
        };
        let auth = Authenticator::new(backend, store);

        // Act
        let result = auth.refresh_session().await;

        // Assert
        assert_eq!(result.unwrap_err(), ApiError::AuthenticationFail);
        assert_eq!(auth.phase().await, AuthPhase::TokenIssued);
    }

    #[tokio::test]
    async fn test_refresh_is_noop_outside_token_phase() {
        // Arrange
        let auth = Authenticator::new(MockAuthApi::default(), MemoryCredentialStore::default());

        // Act
        let phase = auth.refresh_session().await.unwrap();

        // Assert
        assert_eq!(phase, AuthPhase::Unauthenticated);
        assert_eq!(auth.backend().session_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_corrupt_token_phase_self_heals() {
        // Arrange
        let store = MemoryCredentialStore::with_state(CredentialState {
            phase: AuthPhase::TokenIssued,
            ..CredentialState::default()
        });
        let auth = Authenticator::new(MockAuthApi::default(), store);

        // Act
        let phase = auth.phase().await;

        // Assert
        assert_eq!(phase, AuthPhase::Unauthenticated);
    }

    #[tokio::test]
    async fn test_authenticate_when_session_active() {
        // Arrange
        let store = MemoryCredentialStore::with_state(CredentialState::session_active("s"));
        let auth = Authenticator::new(MockAuthApi::default(), store);

        // Act
        let result = auth.authenticate().await.unwrap();

        // Assert
        assert_eq!(result, Authorization::AlreadyAuthenticated);
        assert_eq!(auth.backend().token_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_logout_deletes_session_and_clears_state() {
        // Arrange
        let store = MemoryCredentialStore::with_state(CredentialState::session_active("s"));
        let auth = Authenticator::new(MockAuthApi::default(), store);

        // Act
        auth.logout().await.unwrap();

        // Assert
        assert_eq!(auth.backend().delete_calls.load(Ordering::SeqCst), 1);
        assert!(!auth.is_authenticated().await);
    }

    #[tokio::test]
    async fn test_logout_clears_state_even_if_upstream_fails() {
        // Arrange
        let store = MemoryCredentialStore::with_state(CredentialState::session_active("s"));
        let backend = MockAuthApi {
            fail_delete: true,
            ..MockAuthApi::default()
        };
        let auth = Authenticator::new(backend, store);

        // Act
        let result = auth.logout().await;

        // Assert
        assert_eq!(result.unwrap_err(), ApiError::NoInternetConnection);
        assert_eq!(auth.phase().await, AuthPhase::Unauthenticated);
        assert_eq!(auth.current_session_id().await, None);
    }

    #[tokio::test]
    async fn test_account_details_requires_session() {
        // Arrange
        let auth = Authenticator::new(MockAuthApi::default(), MemoryCredentialStore::default());

        // Act
        let result = auth.account_details().await;

        // Assert
        assert_eq!(result.unwrap_err(), ApiError::AuthenticationFail);
    }

    #[tokio::test]
    async fn test_account_details_with_session() {
        // Arrange
        let store = MemoryCredentialStore::with_state(CredentialState::session_active("s"));
        let auth = Authenticator::new(MockAuthApi::default(), store);

        // Act
        let account = auth.account_details().await.unwrap();

        // Assert
        assert_eq!(account.id, 548);
    }

    fn client_for(server: &MockServer) -> TmdbClient {
        TmdbClient::builder()
            .base_url(format!("{}/3/", server.uri()).parse().unwrap())
            .api_key("test-key")
            .user_agent("test/0.0.0")
            .min_interval(Duration::from_millis(0))
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_full_handshake_over_http() {
        // Arrange
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/3/authentication/token/new"))
            .and(query_param("api_key", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_string(include_str!(
                "../../../../fixtures/tmdb/authentication_token_new.json"
            )))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/3/authentication/session/new"))
            .and(body_json(serde_json::json!({
                "request_token": "ff5c7eeb5a8870efe3cd7fc5c282cffd26800ecd"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_string(include_str!(
                "../../../../fixtures/tmdb/authentication_session_new.json"
            )))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/3/authentication/session"))
            .and(body_json(serde_json::json!({
                "session_id": "79191836ddaa0da3df76a5ffef6f07ad6ab0c641"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_string(include_str!(
                "../../../../fixtures/tmdb/status_success.json"
            )))
            .expect(1)
            .mount(&server)
            .await;
        let auth = Authenticator::new(client_for(&server), MemoryCredentialStore::default());

        // Act
        let first = auth.authenticate().await.unwrap();
        let again = auth.authenticate().await.unwrap();
        let phase = auth.refresh_session().await.unwrap();
        let session = auth.current_session_id().await;
        auth.logout().await.unwrap();

        // Assert
        assert_eq!(
            first,
            Authorization::AwaitingApproval(String::from(
                "https://www.themoviedb.org/authenticate/ff5c7eeb5a8870efe3cd7fc5c282cffd26800ecd"
            ))
        );
        assert_eq!(first, again);
        assert_eq!(phase, AuthPhase::SessionActive);
        assert_eq!(
            session.as_deref(),
            Some("79191836ddaa0da3df76a5ffef6f07ad6ab0c641")
        );
        assert!(!auth.is_authenticated().await);
    }

    #[tokio::test]
    async fn test_expired_token_never_calls_session_endpoint() {
        // Arrange
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/3/authentication/session/new"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;
        let now = Local::now();
        let store = MemoryCredentialStore::with_state(CredentialState::token_issued(
            "tok",
            now - TimeDelta::seconds(30),
        ));
        let auth = Authenticator::new(client_for(&server), store).with_clock(fixed_clock(now));

        // Act
        let phase = auth.refresh_session().await.unwrap();

        // Assert
        assert_eq!(phase, AuthPhase::Unauthenticated);
    }

    /// Store that serves a fixed load result and rejects every write.
    #[derive(Debug)]
    struct ReadOnlyStore {
        state: Option<CredentialState>,
        writes: AtomicU32,
    }

    impl CredentialStore for ReadOnlyStore {
        fn load(&self) -> anyhow::Result<CredentialState> {
            self.state
                .clone()
                .ok_or_else(|| anyhow::anyhow!("unreadable credentials"))
        }

        fn save(&self, _state: &CredentialState) -> anyhow::Result<()> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            anyhow::bail!("read-only")
        }
    }

    #[tokio::test]
    async fn test_repair_that_cannot_be_saved_still_applies() {
        // Arrange
        let store = ReadOnlyStore {
            state: Some(CredentialState {
                phase: AuthPhase::SessionActive,
                ..CredentialState::default()
            }),
            writes: AtomicU32::new(0),
        };
        let auth = Authenticator::new(MockAuthApi::default(), store);

        // Act
        let phase = auth.phase().await;
        let session = auth.current_session_id().await;

        // Assert
        assert_eq!(phase, AuthPhase::Unauthenticated);
        assert_eq!(session, None);
    }

    #[tokio::test]
    async fn test_unreadable_store_starts_unauthenticated() {
        // Arrange
        let store = ReadOnlyStore {
            state: None,
            writes: AtomicU32::new(0),
        };
        let auth = Authenticator::new(MockAuthApi::default(), store);

        // Act
        let phase = auth.phase().await;

        // Assert
        assert_eq!(phase, AuthPhase::Unauthenticated);
        assert!(auth.store.lock().await.writes.load(Ordering::SeqCst) >= 1);
    }

    /// Memory store counting loads.
    #[derive(Debug, Default)]
    struct CountingStore {
        inner: MemoryCredentialStore,
        loads: AtomicU32,
    }

    impl CredentialStore for CountingStore {
        fn load(&self) -> anyhow::Result<CredentialState> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            self.inner.load()
        }

        fn save(&self, state: &CredentialState) -> anyhow::Result<()> {
            self.inner.save(state)
        }
    }

    #[tokio::test]
    async fn test_session_account_reads_state_once() {
        // Arrange
        let store = CountingStore {
            inner: MemoryCredentialStore::with_state(CredentialState::session_active("s")),
            loads: AtomicU32::new(0),
        };
        let auth = Authenticator::new(MockAuthApi::default(), store);

        // Act
        let (session_id, account) = auth.session_account().await.unwrap();

        // Assert
        assert_eq!(session_id, "s");
        assert_eq!(account.id, 548);
        assert_eq!(auth.store.lock().await.loads.load(Ordering::SeqCst), 1);
    }
}
