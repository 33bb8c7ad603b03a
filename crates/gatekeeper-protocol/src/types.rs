//! Core record types for Gatekeeper.
//!
//! These are the values that move between the identity resolver, the
//! session cache, and whatever adapter sits in front of it. None of them
//! carries behavior beyond construction and simple accessors; the cache
//! treats a [`User`] as an opaque value that can be replaced wholesale.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ProtocolError;

/// The entity type whose change notifications the session cache reacts to.
pub const USER_ENTITY_TYPE: &str = "user";

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

/// An identity record as produced by an identity resolver.
///
/// `roles` and `permission_unit_ids` are opaque to Gatekeeper: they are
/// carried along with the session and handed back to callers, never
/// interpreted. Both are ordered sets so projections are deterministic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// The record id in the backing user store ("idInUserStorage").
    pub id: String,

    /// The login name the user authenticates with. Sessions are grouped
    /// by this value.
    pub login_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,

    #[serde(default)]
    pub roles: BTreeSet<String>,

    #[serde(default)]
    pub permission_unit_ids: BTreeSet<String>,

    pub active: bool,
}

impl User {
    /// Creates an active user with no names, roles, or permission units.
    pub fn new(id: impl Into<String>, login_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            login_id: login_id.into(),
            first_name: None,
            last_name: None,
            roles: BTreeSet::new(),
            permission_unit_ids: BTreeSet::new(),
            active: true,
        }
    }

    /// Sets first and last name.
    pub fn with_names(
        mut self,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
    ) -> Self {
        self.first_name = Some(first_name.into());
        self.last_name = Some(last_name.into());
        self
    }

    /// Adds a role id.
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.roles.insert(role.into());
        self
    }

    /// Adds a permission unit id.
    pub fn with_permission_unit(mut self, unit: impl Into<String>) -> Self {
        self.permission_unit_ids.insert(unit.into());
        self
    }
}

// ---------------------------------------------------------------------------
// LoginDescriptor
// ---------------------------------------------------------------------------

/// Describes which user an identity resolver should produce.
///
/// A client logging in supplies a login id and the domain it authenticated
/// against. The session cache itself uses the storage-id form when it has
/// to re-read a user after a change notification.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum LoginDescriptor {
    /// A login id within a login domain.
    Login {
        login_id: String,
        login_domain: String,
    },

    /// A record id in the user store.
    StorageId { id: String },
}

impl LoginDescriptor {
    pub fn login(
        login_id: impl Into<String>,
        login_domain: impl Into<String>,
    ) -> Self {
        Self::Login {
            login_id: login_id.into(),
            login_domain: login_domain.into(),
        }
    }

    pub fn storage_id(id: impl Into<String>) -> Self {
        Self::StorageId { id: id.into() }
    }
}

impl fmt::Display for LoginDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Login {
                login_id,
                login_domain,
            } => write!(f, "{login_id}@{login_domain}"),
            Self::StorageId { id } => write!(f, "storage:{id}"),
        }
    }
}

// ---------------------------------------------------------------------------
// SessionToken
// ---------------------------------------------------------------------------

/// What a caller receives after a session is issued or renewed.
///
/// `token` is the bearer credential. `token_id` is the second identifier
/// that must accompany it to renew or revoke the session. Both timestamps
/// are Unix epoch milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionToken {
    pub token: String,
    pub token_id: String,
    pub valid_until: u64,
    pub renew_until: u64,
    pub id_in_user_storage: String,
    pub login_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default)]
    pub permission_units: Vec<String>,
}

impl SessionToken {
    /// Projects a user and the session timestamps into a token result.
    pub fn new(
        token: String,
        token_id: String,
        valid_until: u64,
        renew_until: u64,
        user: &User,
    ) -> Self {
        Self {
            token,
            token_id,
            valid_until,
            renew_until,
            id_in_user_storage: user.id.clone(),
            login_id: user.login_id.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            permission_units: user.permission_unit_ids.iter().cloned().collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// ChangeAction
// ---------------------------------------------------------------------------

/// The action named in an identity-store change notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeAction {
    Create,
    Update,
    Delete,
}

impl fmt::Display for ChangeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create => write!(f, "create"),
            Self::Update => write!(f, "update"),
            Self::Delete => write!(f, "delete"),
        }
    }
}

impl FromStr for ChangeAction {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "create" => Ok(Self::Create),
            "update" => Ok(Self::Update),
            "delete" => Ok(Self::Delete),
            other => Err(ProtocolError::InvalidAction(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_new_is_active_without_names() {
        let user = User::new("u-1", "alice");

        assert!(user.active);
        assert_eq!(user.first_name, None);
        assert_eq!(user.last_name, None);
        assert!(user.roles.is_empty());
    }

    #[test]
    fn test_session_token_new_copies_user_fields() {
        let user = User::new("u-1", "alice")
            .with_names("Alice", "Andersson")
            .with_permission_unit("unit-b")
            .with_permission_unit("unit-a");

        let token =
            SessionToken::new("tok".into(), "tid".into(), 10, 20, &user);

        assert_eq!(token.id_in_user_storage, "u-1");
        assert_eq!(token.login_id, "alice");
        assert_eq!(token.first_name.as_deref(), Some("Alice"));
        assert_eq!(token.last_name.as_deref(), Some("Andersson"));
        assert_eq!(token.permission_units, vec!["unit-a", "unit-b"]);
        assert_eq!(token.valid_until, 10);
        assert_eq!(token.renew_until, 20);
    }

    #[test]
    fn test_change_action_parse_known_actions() {
        assert_eq!("create".parse::<ChangeAction>().unwrap(), ChangeAction::Create);
        assert_eq!("update".parse::<ChangeAction>().unwrap(), ChangeAction::Update);
        assert_eq!("delete".parse::<ChangeAction>().unwrap(), ChangeAction::Delete);
    }

    #[test]
    fn test_change_action_parse_unknown_returns_error() {
        let result = "truncate".parse::<ChangeAction>();

        assert!(
            matches!(result, Err(ProtocolError::InvalidAction(ref a)) if a == "truncate")
        );
    }

    #[test]
    fn test_login_descriptor_display() {
        assert_eq!(
            LoginDescriptor::login("alice", "uu").to_string(),
            "alice@uu"
        );
        assert_eq!(
            LoginDescriptor::storage_id("u-1").to_string(),
            "storage:u-1"
        );
    }

    #[cfg(feature = "json")]
    #[test]
    fn test_user_json_uses_camel_case() {
        let user = User::new("u-1", "alice").with_role("admin");

        let json = serde_json::to_value(&user).unwrap();

        assert_eq!(json["loginId"], "alice");
        assert_eq!(json["permissionUnitIds"], serde_json::json!([]));
        assert_eq!(json["roles"], serde_json::json!(["admin"]));
        assert!(json.get("firstName").is_none());
    }
}
