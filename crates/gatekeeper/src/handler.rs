//! Request handlers: wire requests in, status and body out.
//!
//! These are the calls an HTTP adapter makes for
//!   - `GET /user[/{token}]` → [`Gatekeeper::get_user`]
//!   - `POST /authToken` → [`Gatekeeper::create_token`]
//!   - `POST /authToken/{tokenId}` → [`Gatekeeper::renew_token`]
//!   - `DELETE /authToken/{tokenId}` → [`Gatekeeper::remove_token`]
//!
//! Routing, headers, and the server itself belong to the adapter. Bodies
//! are the JSON form of a [`DataElement`] tree.

use gatekeeper_protocol::{Codec, DataElement, LoginDescriptor};
use gatekeeper_session::SessionError;

use crate::Gatekeeper;

const OK: u16 = 200;
const BAD_REQUEST: u16 = 400;
const UNAUTHORIZED: u16 = 401;
const NOT_FOUND: u16 = 404;
const INTERNAL_ERROR: u16 = 500;

/// What the adapter should send back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub body: Option<Vec<u8>>,
}

impl Response {
    fn status(status: u16) -> Self {
        Self { status, body: None }
    }

    pub fn is_success(&self) -> bool {
        self.status == OK
    }
}

impl Gatekeeper {
    /// Returns the user behind `token`, or the guest when there is none.
    pub fn get_user(&self, token: Option<&str>) -> Response {
        match self.cache.resolve_user(token) {
            Ok(user) => self.ok(&DataElement::from(user.as_ref())),
            Err(e) => self.rejected(&e, UNAUTHORIZED),
        }
    }

    /// Logs in with a JSON-encoded [`LoginDescriptor`].
    pub fn create_token(&self, body: &[u8]) -> Response {
        let descriptor: LoginDescriptor = match self.codec.decode(body) {
            Ok(d) => d,
            Err(e) => {
                tracing::debug!(error = %e, "malformed login request");
                return Response::status(BAD_REQUEST);
            }
        };
        match self.cache.issue_session(&descriptor) {
            Ok(token) => self.ok(&DataElement::from(&token)),
            Err(e) => self.rejected(&e, UNAUTHORIZED),
        }
    }

    pub fn renew_token(&self, token_id: &str, token: &str) -> Response {
        match self.cache.renew_session(token_id, token) {
            Ok(token) => self.ok(&DataElement::from(&token)),
            Err(e) => self.rejected(&e, UNAUTHORIZED),
        }
    }

    /// Logs out. An unknown token is a 404, not a 401.
    pub fn remove_token(&self, token_id: &str, token: &str) -> Response {
        match self.cache.revoke_session(token_id, token) {
            Ok(()) => Response::status(OK),
            Err(e) => self.rejected(&e, NOT_FOUND),
        }
    }

    fn ok(&self, tree: &DataElement) -> Response {
        match self.codec.encode(tree) {
            Ok(bytes) => Response {
                status: OK,
                body: Some(bytes),
            },
            Err(e) => {
                tracing::error!(error = %e, "failed to encode response");
                Response::status(INTERNAL_ERROR)
            }
        }
    }

    fn rejected(&self, error: &SessionError, status: u16) -> Response {
        match error {
            SessionError::InvalidSession(_) | SessionError::Authentication { .. } => {
                tracing::debug!(%error, status, "request rejected");
                Response::status(status)
            }
            SessionError::Identity { .. } => {
                tracing::error!(%error, "unexpected identity failure");
                Response::status(INTERNAL_ERROR)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use gatekeeper_protocol::{JsonCodec, User};
    use gatekeeper_session::{IdentityError, IdentityResolver};

    use super::*;

    struct OneUser;

    impl IdentityResolver for OneUser {
        fn pick_user(
            &self,
            descriptor: &LoginDescriptor,
        ) -> Result<User, IdentityError> {
            match descriptor {
                LoginDescriptor::Login { login_id, .. } if login_id == "alice" => {
                    Ok(User::new("s-alice", "alice").with_role("admin"))
                }
                other => Err(IdentityError::UnknownUser(other.to_string())),
            }
        }

        fn pick_guest(&self) -> Result<User, IdentityError> {
            Ok(User::new("guest", "guest"))
        }
    }

    fn gatekeeper() -> Gatekeeper {
        Gatekeeper::builder()
            .resolver(0, "one", Arc::new(OneUser))
            .build()
            .unwrap()
    }

    fn login_body(login_id: &str) -> Vec<u8> {
        JsonCodec
            .encode(&LoginDescriptor::login(login_id, "uu"))
            .unwrap()
    }

    fn body_tree(response: &Response) -> DataElement {
        JsonCodec.decode(response.body.as_deref().unwrap()).unwrap()
    }

    // =====================================================================
    // create_token
    // =====================================================================

    #[test]
    fn test_create_token_known_login_returns_auth_token_tree() {
        let gk = gatekeeper();

        let response = gk.create_token(&login_body("alice"));

        assert_eq!(response.status, OK);
        let tree = body_tree(&response);
        assert_eq!(tree.name, "authToken");
        assert_eq!(tree.child_value("loginId"), Some("alice"));
        assert!(tree.child_value("token").is_some());
    }

    #[test]
    fn test_create_token_unknown_login_returns_401() {
        let gk = gatekeeper();

        let response = gk.create_token(&login_body("mallory"));

        assert_eq!(response, Response::status(UNAUTHORIZED));
    }

    #[test]
    fn test_create_token_malformed_body_returns_400() {
        let gk = gatekeeper();

        let response = gk.create_token(b"{not json");

        assert_eq!(response.status, BAD_REQUEST);
    }

    // =====================================================================
    // get_user
    // =====================================================================

    #[test]
    fn test_get_user_without_token_returns_guest() {
        let gk = gatekeeper();

        let response = gk.get_user(None);

        assert_eq!(response.status, OK);
        assert_eq!(body_tree(&response).name, "guest");
    }

    #[test]
    fn test_get_user_with_issued_token_returns_user_tree() {
        let gk = gatekeeper();
        let issued = body_tree(&gk.create_token(&login_body("alice")));
        let token = issued.child_value("token").unwrap();

        let response = gk.get_user(Some(token));

        assert_eq!(response.status, OK);
        let tree = body_tree(&response);
        assert_eq!(tree.name, "s-alice");
        assert_eq!(tree.child_value("activeStatus"), Some("active"));
    }

    #[test]
    fn test_get_user_unknown_token_returns_401() {
        let gk = gatekeeper();

        assert_eq!(gk.get_user(Some("nope")).status, UNAUTHORIZED);
    }

    // =====================================================================
    // renew_token / remove_token
    // =====================================================================

    #[test]
    fn test_renew_token_returns_new_token_with_same_id() {
        let gk = gatekeeper();
        let issued = body_tree(&gk.create_token(&login_body("alice")));
        let token = issued.child_value("token").unwrap();
        let token_id = issued.child_value("tokenId").unwrap();

        let response = gk.renew_token(token_id, token);

        assert!(response.is_success());
        let renewed = body_tree(&response);
        assert_eq!(renewed.child_value("tokenId"), Some(token_id));
        assert_ne!(renewed.child_value("token"), Some(token));
        assert_eq!(gk.get_user(Some(token)).status, UNAUTHORIZED);
    }

    #[test]
    fn test_renew_token_wrong_id_returns_401() {
        let gk = gatekeeper();
        let issued = body_tree(&gk.create_token(&login_body("alice")));
        let token = issued.child_value("token").unwrap();

        assert_eq!(gk.renew_token("other-id", token).status, UNAUTHORIZED);
    }

    #[test]
    fn test_remove_token_then_again_returns_404() {
        let gk = gatekeeper();
        let issued = body_tree(&gk.create_token(&login_body("alice")));
        let token = issued.child_value("token").unwrap();
        let token_id = issued.child_value("tokenId").unwrap();

        assert_eq!(gk.remove_token(token_id, token), Response::status(OK));
        assert_eq!(gk.remove_token(token_id, token).status, NOT_FOUND);
        assert_eq!(gk.cache().session_count(), 0);
    }
}
