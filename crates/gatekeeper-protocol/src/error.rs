//! Error types for the protocol layer.

/// Errors that can occur while parsing or encoding protocol records.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization of a data tree failed.
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization of a data tree failed.
    ///
    /// Common causes: malformed JSON, missing `name`, or a `children`
    /// field that is not an array.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// A change notification carried an action outside
    /// `create`/`update`/`delete`.
    #[error("invalid change action: {0}")]
    InvalidAction(String),
}
