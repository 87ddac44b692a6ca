//! Error taxonomy surfaced to callers and the transport failure classifier.

use thiserror::Error;

/// Closed set of errors returned by every client operation.
///
/// Raw transport, HTTP and decode details never cross this boundary; they
/// are logged where they happen and collapsed into one of these kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
#[allow(clippy::module_name_repetitions)]
pub enum ApiError {
    /// Anything not covered by the other kinds (including decode failures).
    #[error("Unknown error.")]
    Unknown,
    /// The device has no network route.
    #[error("There is no internet connection!")]
    NoInternetConnection,
    /// Upstream rejected the credentials (HTTP 401), or no session exists.
    #[error("There was a problem during authentication.")]
    AuthenticationFail,
    /// The request deadline was exceeded.
    #[error("Network connection time out.")]
    ResponseTimeOut,
}

/// Lower-level network fault reported by the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkFault {
    /// Request deadline exceeded.
    TimedOut,
    /// Could not reach the host (DNS failure, refused connection, no route).
    NotConnected,
    /// The request was cancelled by its cancellation scope.
    Cancelled,
    /// Any other I/O or protocol fault.
    Other,
}

/// A failed exchange with the upstream API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportFailure {
    /// The server answered with a non-success HTTP status.
    Status(u16),
    /// The exchange failed below the HTTP layer.
    Network(NetworkFault),
}

impl From<&reqwest::Error> for TransportFailure {
    fn from(err: &reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            return Self::Status(status.as_u16());
        }
        if err.is_timeout() {
            Self::Network(NetworkFault::TimedOut)
        } else if err.is_connect() {
            Self::Network(NetworkFault::NotConnected)
        } else {
            Self::Network(NetworkFault::Other)
        }
    }
}

/// Maps a transport failure onto the caller-facing taxonomy.
#[must_use]
pub const fn classify(failure: &TransportFailure) -> ApiError {
    match failure {
        TransportFailure::Status(401) => ApiError::AuthenticationFail,
        TransportFailure::Network(NetworkFault::TimedOut) => ApiError::ResponseTimeOut,
        TransportFailure::Network(NetworkFault::NotConnected) => ApiError::NoInternetConnection,
        TransportFailure::Status(_)
        | TransportFailure::Network(NetworkFault::Cancelled | NetworkFault::Other) => {
            ApiError::Unknown
        }
    }
}

impl From<TransportFailure> for ApiError {
    fn from(failure: TransportFailure) -> Self {
        classify(&failure)
    }
}
