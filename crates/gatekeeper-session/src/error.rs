//! Error types for the session layer.

/// Errors returned by the session cache.
///
/// `InvalidSession` and `Authentication` are meant to reach the client
/// (as 401/404 at the HTTP layer). Neither is retried.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The token is unknown, no longer valid, or was presented with the
    /// wrong token id.
    #[error("invalid session: {0}")]
    InvalidSession(&'static str),

    /// The identity resolver could not produce a user for a login.
    #[error("Could not pick user for {descriptor}, with error: {source}")]
    Authentication {
        descriptor: String,
        #[source]
        source: IdentityError,
    },

    /// Re-reading a cached user after a change notification failed.
    #[error("could not re-read user {id}: {source}")]
    Identity {
        id: String,
        #[source]
        source: IdentityError,
    },
}

/// Errors reported by [`IdentityResolver`](crate::IdentityResolver)
/// implementations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentityError {
    /// No user matches the descriptor.
    #[error("no user found for {0}")]
    UnknownUser(String),

    /// The user exists but may not log in.
    #[error("user {0} is not active")]
    Inactive(String),

    /// The user store could not be reached or answered with garbage.
    #[error("identity backend failure: {0}")]
    Backend(String),
}

/// Errors raised while choosing the identity resolver at startup.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// Nothing was registered.
    #[error("no implementations found for IdentityResolver")]
    NoImplementation,

    /// Two candidates share the highest priority, so neither wins.
    #[error(
        "IdentityResolver implementations {first} and {second} share priority {priority}"
    )]
    AmbiguousPriority {
        priority: i32,
        first: String,
        second: String,
    },
}
