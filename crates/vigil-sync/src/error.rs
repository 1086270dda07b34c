//! Error types for remote synchronization.

use thiserror::Error;
use vigil_core::FeatureFlag;

/// Result type alias for remote sync operations.
pub type Result<T> = std::result::Result<T, SyncError>;

/// Errors returned by a [`RemoteSyncChannel`](crate::RemoteSyncChannel).
///
/// All of these are transient from the controller's point of view: they are
/// logged and the affected reading or flag is simply not updated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    /// The channel has no link to the remote store.
    #[error("Not connected to remote store")]
    NotConnected,

    /// The remote store answered with a non-success status code.
    #[error("Remote store returned status {status}")]
    Remote { status: u16 },

    /// The response could not be interpreted.
    #[error("Malformed response: {0}")]
    Malformed(String),

    /// The request did not complete in time.
    #[error("Request timed out after {0}ms")]
    Timeout(u64),

    /// Low-level transport failure.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The signal has no row in the remote store.
    #[error("Signal '{0}' has no remote row")]
    UnknownSignal(FeatureFlag),
}

impl SyncError {
    /// Create a transport error.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    /// Create a malformed-response error.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            SyncError::Remote { status: 503 }.to_string(),
            "Remote store returned status 503"
        );
        assert_eq!(
            SyncError::UnknownSignal(FeatureFlag::Connectivity).to_string(),
            "Signal 'connectivity' has no remote row"
        );
        assert_eq!(
            SyncError::transport("connection reset").to_string(),
            "Transport error: connection reset"
        );
        assert_eq!(SyncError::Timeout(5000).to_string(), "Request timed out after 5000ms");
    }
}
