//! Registry error types
//!
//! Error types for session control and delivery operations.

use super::id::SessionId;

/// Error type for registry operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// Session not found
    SessionNotFound(SessionId),
    /// Session or consumer id is empty or malformed
    InvalidId(String),
    /// Acknowledged sequence number was never assigned in this session
    UnknownSequence(u64),
    /// Previous poller could not be joined; the session was dropped
    PollerJoin(SessionId),
}

impl RegistryError {
    /// Whether the caller is at fault (as opposed to the service)
    pub fn is_client_error(&self) -> bool {
        !matches!(self, RegistryError::PollerJoin(_))
    }
}

impl std::fmt::Display for RegistryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegistryError::SessionNotFound(id) => write!(f, "Session not found: {}", id),
            RegistryError::InvalidId(raw) => write!(f, "Invalid id: {:?}", raw),
            RegistryError::UnknownSequence(seq) => write!(f, "Unknown sequence number: {}", seq),
            RegistryError::PollerJoin(id) => {
                write!(f, "Poller for session {} did not shut down cleanly", id)
            }
        }
    }
}

impl std::error::Error for RegistryError {}
