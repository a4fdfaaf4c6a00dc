//! Error types for backend API calls

/// Errors from API client operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The coordinated request failed (transport error or failed session refresh).
    #[error(transparent)]
    Session(#[from] session::Error),

    #[error("unexpected response from {path}: {reason}")]
    Decode { path: String, reason: String },

    /// Rejected locally before any request was sent.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("HTTP client setup failed: {0}")]
    Client(String),
}

impl Error {
    /// Whether the backend still rejects the session after any refresh attempt.
    pub fn is_unauthorized(&self) -> bool {
        match self {
            Error::Session(session::Error::Refresh(_)) => true,
            Error::Session(e) => e.is_auth_expired(),
            _ => false,
        }
    }

    /// Message the backend attached to a failed call, if any.
    pub fn backend_message(&self) -> Option<&str> {
        match self {
            Error::Session(session::Error::Transport(
                session::TransportError::AuthExpired { message, .. }
                | session::TransportError::Status { message, .. },
            )) => Some(message),
            _ => None,
        }
    }
}

/// Result alias for API client operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use session::{RefreshError, TransportError};

    #[test]
    fn refresh_failures_and_401s_are_unauthorized() {
        let refresh: Error = session::Error::Refresh(RefreshError::Rejected("revoked".into())).into();
        assert!(refresh.is_unauthorized());

        let expired: Error = session::Error::Transport(TransportError::AuthExpired {
            status: 401,
            message: "Invalid credentials".into(),
        })
        .into();
        assert!(expired.is_unauthorized());
        assert_eq!(expired.backend_message(), Some("Invalid credentials"));

        let not_found: Error = session::Error::Transport(TransportError::Status {
            status: 404,
            message: "Analysis not found".into(),
        })
        .into();
        assert!(!not_found.is_unauthorized());
        assert_eq!(not_found.backend_message(), Some("Analysis not found"));

        assert!(!Error::InvalidInput("empty".into()).is_unauthorized());
        assert_eq!(Error::InvalidInput("empty".into()).backend_message(), None);
    }
}
