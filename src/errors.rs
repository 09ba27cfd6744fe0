//! Leader Election Error Hierarchy
//!
//! Defines error types for the election protocol and the coordination
//! service boundary, categorized by layer and by how the election loop
//! must react to them (retry, re-bootstrap, or give up).

use std::time::Duration;

#[doc(hidden)]
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Coordination-service session and transport failures
    #[error(transparent)]
    Coordination(#[from] CoordinationError),

    /// Election protocol invariant violations
    #[error(transparent)]
    Election(#[from] ElectionError),

    /// Configuration loading failures
    #[error(transparent)]
    Config(#[from] config::ConfigError),

    /// Configuration validation failures
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Retry policy exhaustion; carries the last attempt's error
    #[error("{operation} failed after {attempts} attempts")]
    RetryExhausted {
        operation: &'static str,
        attempts: usize,
        #[source]
        source: Box<Error>,
    },

    /// Cooperative shutdown was requested while an operation was pending
    #[error("Shutdown requested")]
    Shutdown,
}

#[derive(Debug, thiserror::Error)]
pub enum CoordinationError {
    /// Network-level failure reaching the coordination service
    #[error("Connection failed: {0}")]
    Connection(String),

    /// No acknowledgment from the coordination service within the window
    #[error("Coordination service did not acknowledge within {0:?}")]
    Timeout(Duration),

    /// Operation attempted without an active session
    #[error("Session is not active")]
    NotConnected,

    /// The service expired the session; all its ephemeral nodes are gone
    #[error("Session {session_id} expired")]
    SessionExpired { session_id: u64 },

    /// Create on a path that already exists
    #[error("Node already exists: {0}")]
    NodeExists(String),

    /// Operation on a path that does not exist
    #[error("Node not found: {0}")]
    NodeNotFound(String),

    /// The service dropped the session's notification channel
    #[error("Notification channel closed by coordination service")]
    ChannelClosed,
}

#[derive(Debug, thiserror::Error)]
pub enum ElectionError {
    /// The candidate's own token disappeared between protocol steps.
    /// Recoverable only by a full re-bootstrap (new session, new token).
    #[error("Candidacy token {token} vanished from namespace {namespace}")]
    RegistrationVanished { namespace: String, token: String },

    /// A child of the election namespace does not carry a parseable
    /// sequence suffix
    #[error("Malformed candidacy token name: {0}")]
    MalformedToken(String),
}

impl Error {
    /// Transient errors are retried in place with bounded, jittered
    /// backoff. Everything else either re-bootstraps or aborts.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Error::Coordination(CoordinationError::Connection(_))
                | Error::Coordination(CoordinationError::Timeout(_))
        )
    }

    /// Errors that invalidate the current session or token. The election
    /// loop reacts with a full re-bootstrap: close, reconnect, re-register.
    pub fn requires_rebootstrap(&self) -> bool {
        match self {
            Error::Coordination(e) => matches!(
                e,
                CoordinationError::NotConnected
                    | CoordinationError::SessionExpired { .. }
                    | CoordinationError::NodeNotFound(_)
                    | CoordinationError::ChannelClosed
            ),
            Error::Election(_) => true,
            _ => false,
        }
    }
}
