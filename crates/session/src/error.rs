//! Error types for coordinated requests

use std::time::Duration;

/// Classified failure of a single transport execution.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// The backend no longer accepts the session credential (HTTP 401).
    #[error("session expired ({status}): {message}")]
    AuthExpired { status: u16, message: String },

    #[error("request failed with status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl TransportError {
    pub fn is_auth_expired(&self) -> bool {
        matches!(self, TransportError::AuthExpired { .. })
    }

    /// HTTP status carried by the failure, if the backend answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::AuthExpired { status, .. } | TransportError::Status { status, .. } => {
                Some(*status)
            }
            _ => None,
        }
    }
}

/// Terminal outcome of a failed refresh episode.
///
/// `Clone` because one settlement is delivered to the leader and every
/// follower of the episode.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RefreshError {
    /// The backend refused to renew the session (refresh credential revoked or missing).
    #[error("session refresh rejected: {0}")]
    Rejected(String),

    #[error("session refresh failed: {0}")]
    Failed(String),

    #[error("session refresh timed out after {}ms", .0.as_millis())]
    TimedOut(Duration),

    /// The leader was dropped before the refresh returned.
    #[error("session refresh abandoned before it settled")]
    Abandoned,
}

impl RefreshError {
    /// Label used for the `outcome` metric dimension.
    pub fn outcome_label(&self) -> &'static str {
        match self {
            RefreshError::Rejected(_) => "rejected",
            RefreshError::Failed(_) => "failed",
            RefreshError::TimedOut(_) => "timed_out",
            RefreshError::Abandoned => "abandoned",
        }
    }
}

/// Final outcome of `RequestCoordinator::send`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The request itself failed (first attempt or replay).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The request hit an expired session and the shared refresh failed.
    #[error(transparent)]
    Refresh(#[from] RefreshError),
}

impl Error {
    pub fn is_auth_expired(&self) -> bool {
        matches!(self, Error::Transport(e) if e.is_auth_expired())
    }
}

/// Result alias for coordinated requests.
pub type Result<T> = std::result::Result<T, Error>;
