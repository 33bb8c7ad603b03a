//! Error types for the listener layer.

use gatekeeper_protocol::ProtocolError;
use gatekeeper_session::SessionError;

/// Errors raised while processing a single change notification.
#[derive(Debug, thiserror::Error)]
pub enum ListenerError {
    /// A `user` notification arrived without a required header.
    #[error("notification is missing header {0}")]
    MissingHeader(&'static str),

    /// The `action` header could not be parsed.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The storage-invalidation hook failed.
    #[error("storage invalidation failed: {0}")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The session cache could not reconcile the change.
    #[error("session cache reconciliation failed: {0}")]
    Reconciliation(#[from] SessionError),

    /// The blocking reconciliation task panicked or was cancelled.
    #[error("reconciliation task aborted: {0}")]
    Aborted(String),

    /// The feed reported a transport-level failure.
    #[error("change feed failed: {0}")]
    Feed(String),
}

/// Why an [`InvalidationListener`](crate::InvalidationListener) stopped.
///
/// Every variant means the session cache can no longer be trusted to
/// match the identity store.
#[derive(Debug, thiserror::Error)]
pub enum FatalFault {
    /// A notification could not be processed.
    #[error("error keeping data in sync: {0}")]
    Processing(#[source] ListenerError),

    /// The feed closed; further changes would go unseen.
    #[error("lost connection with message broker")]
    ConnectionLost,
}
