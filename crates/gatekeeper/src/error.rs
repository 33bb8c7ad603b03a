//! Unified error type for Gatekeeper.

use gatekeeper_listener::{FatalFault, ListenerError};
use gatekeeper_protocol::ProtocolError;
use gatekeeper_session::{RegistryError, SessionError};

use crate::ConfigError;

/// Top-level error wrapping every crate-specific error.
///
/// The `#[from]` attributes let `?` convert sub-crate errors.
#[derive(Debug, thiserror::Error)]
pub enum GatekeeperError {
    /// Startup configuration was missing or malformed.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// No single identity resolver could be chosen.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// A session operation failed (invalid token, failed login).
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A change notification could not be processed.
    #[error(transparent)]
    Listener(#[from] ListenerError),

    /// Encoding or decoding a record failed.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The invalidation listener stopped; the cache is no longer trusted.
    #[error(transparent)]
    Fatal(#[from] FatalFault),
}
