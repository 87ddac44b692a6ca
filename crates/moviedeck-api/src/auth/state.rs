//! Persisted credential state and its consistency rules.

use std::fmt;

use chrono::{DateTime, Local};

/// Handshake phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthPhase {
    /// No token and no session.
    #[default]
    Unauthenticated,
    /// A request token waits for browser approval.
    TokenIssued,
    /// A session ID is available for account calls.
    SessionActive,
}

impl AuthPhase {
    /// Numeric code used in the persisted flags.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Unauthenticated => 0,
            Self::TokenIssued => 1,
            Self::SessionActive => 2,
        }
    }

    /// Parses a persisted code. Unknown codes are `None`.
    #[must_use]
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Unauthenticated),
            1 => Some(Self::TokenIssued),
            2 => Some(Self::SessionActive),
            _ => None,
        }
    }
}

impl fmt::Display for AuthPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unauthenticated => "unauthenticated",
            Self::TokenIssued => "token issued",
            Self::SessionActive => "session active",
        };
        f.write_str(name)
    }
}

/// Credentials persisted across runs.
///
/// Exactly one of `request_token` / `session_id` is set, matching `phase`;
/// use [`CredentialState::healed`] on anything read from storage.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct CredentialState {
    /// Current phase.
    pub phase: AuthPhase,
    /// Request token (`TokenIssued` only).
    pub request_token: Option<String>,
    /// Request token expiry (`TokenIssued` only).
    pub request_token_expires_at: Option<DateTime<Local>>,
    /// Session ID (`SessionActive` only).
    pub session_id: Option<String>,
}

impl fmt::Debug for CredentialState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialState")
            .field("phase", &self.phase)
            .field("request_token", &self.request_token.as_ref().map(|_| "<redacted>"))
            .field("request_token_expires_at", &self.request_token_expires_at)
            .field("session_id", &self.session_id.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl CredentialState {
    /// State after a request token was issued.
    #[must_use]
    pub fn token_issued(request_token: impl Into<String>, expires_at: DateTime<Local>) -> Self {
        Self {
            phase: AuthPhase::TokenIssued,
            request_token: Some(request_token.into()),
            request_token_expires_at: Some(expires_at),
            session_id: None,
        }
    }

    /// State after a session was created.
    #[must_use]
    pub fn session_active(session_id: impl Into<String>) -> Self {
        Self {
            phase: AuthPhase::SessionActive,
            request_token: None,
            request_token_expires_at: None,
            session_id: Some(session_id.into()),
        }
    }

    /// Repairs inconsistent state.
    ///
    /// A phase whose credential is missing falls back to `Unauthenticated`;
    /// credentials that do not belong to the phase are dropped. Returns the
    /// repaired state and whether anything changed.
    #[must_use]
    pub fn healed(self) -> (Self, bool) {
        let present = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.is_empty());
        let healed = match self.phase {
            AuthPhase::TokenIssued
                if present(&self.request_token) && self.request_token_expires_at.is_some() =>
            {
                Self {
                    session_id: None,
                    ..self.clone()
                }
            }
            AuthPhase::SessionActive if present(&self.session_id) => Self {
                request_token: None,
                request_token_expires_at: None,
                ..self.clone()
            },
            _ => Self::default(),
        };
        let changed = healed != self;
        (healed, changed)
    }

    /// The request token if it has not expired at `now` (`expires_at >= now`).
    #[must_use]
    pub fn valid_token(&self, now: DateTime<Local>) -> Option<&str> {
        match (&self.request_token, self.request_token_expires_at) {
            (Some(token), Some(expires_at)) if expires_at >= now => Some(token),
            _ => None,
        }
    }
}
