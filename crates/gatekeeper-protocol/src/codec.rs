//! Codec trait and implementations for rendering records as bytes.
//!
//! Adapters in front of the session cache decide which wire format to
//! speak. They only need something implementing [`Codec`]; the JSON
//! implementation is the default and is behind the `json` feature.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// Encodes values to bytes and decodes them back.
///
/// `Send + Sync + 'static` so one codec can be shared by every request
/// handler for the lifetime of the process.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed or do
    /// not match the expected type.
    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// ## Example
///
/// ```rust
/// use gatekeeper_protocol::{Codec, DataElement, JsonCodec, SessionToken, User};
///
/// let user = User::new("u-1", "alice");
/// let token = SessionToken::new("tok".into(), "tid".into(), 1, 2, &user);
///
/// let bytes = JsonCodec.encode(&DataElement::from(&token)).unwrap();
/// let decoded: DataElement = JsonCodec.decode(&bytes).unwrap();
///
/// assert_eq!(decoded.child_value("tokenId"), Some("tid"));
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}

#[cfg(all(test, feature = "json"))]
mod tests {
    use super::*;
    use crate::{DataElement, User};

    #[test]
    fn test_encode_atomic_omits_children() {
        let bytes = JsonCodec
            .encode(&DataElement::atomic("loginId", "alice"))
            .unwrap();

        let text = String::from_utf8(bytes).unwrap();
        assert_eq!(text, r#"{"name":"loginId","value":"alice"}"#);
    }

    #[test]
    fn test_encode_user_tree_shape() {
        let user = User::new("u-1", "alice").with_role("admin");

        let bytes = JsonCodec.encode(&DataElement::from(&user)).unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(json["name"], "u-1");
        assert_eq!(json["children"][0]["name"], "userRole");
        assert_eq!(
            json["children"][0]["children"][0]["children"][0]["value"],
            "admin"
        );
    }

    #[test]
    fn test_decode_malformed_returns_decode_error() {
        let result: Result<DataElement, _> = JsonCodec.decode(b"{not json");

        assert!(matches!(result, Err(ProtocolError::Decode(_))));
    }

    #[test]
    fn test_decode_missing_name_returns_decode_error() {
        let result: Result<DataElement, _> =
            JsonCodec.decode(br#"{"value":"x"}"#);

        assert!(matches!(result, Err(ProtocolError::Decode(_))));
    }
}
