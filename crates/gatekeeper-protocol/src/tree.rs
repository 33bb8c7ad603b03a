//! Generic name/children/value data trees.
//!
//! Clients of the gateway do not receive `User` or `SessionToken` as flat
//! JSON objects. They receive a tree where every node has a `name` and
//! either an atomic `value` or a list of `children`:
//!
//! ```text
//! { "name": "authToken", "children": [
//!     { "name": "token",   "value": "9f0c..." },
//!     { "name": "tokenId", "value": "41ab..." },
//!     ...
//! ] }
//! ```
//!
//! Every value is a string, timestamps included.

use serde::{Deserialize, Serialize};

use crate::{SessionToken, User};

/// One node in a data tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataElement {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<DataElement>>,
}

impl DataElement {
    /// A leaf node carrying a value.
    pub fn atomic(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: Some(value.into()),
            children: None,
        }
    }

    /// A group node. An empty `children` list is kept (serialized as `[]`).
    pub fn group(name: impl Into<String>, children: Vec<DataElement>) -> Self {
        Self {
            name: name.into(),
            value: None,
            children: Some(children),
        }
    }

    /// Returns the first direct child with the given name.
    pub fn child(&self, name: &str) -> Option<&DataElement> {
        self.children
            .as_deref()
            .and_then(|children| children.iter().find(|c| c.name == name))
    }

    /// Returns every direct child with the given name, in order.
    pub fn children_named<'a>(
        &'a self,
        name: &'a str,
    ) -> impl Iterator<Item = &'a DataElement> + 'a {
        self.children
            .as_deref()
            .unwrap_or_default()
            .iter()
            .filter(move |c| c.name == name)
    }

    /// Returns the value of the first direct child with the given name.
    pub fn child_value(&self, name: &str) -> Option<&str> {
        self.child(name).and_then(|c| c.value.as_deref())
    }
}

impl From<&SessionToken> for DataElement {
    fn from(token: &SessionToken) -> Self {
        let mut children = vec![
            DataElement::atomic("token", &token.token),
            DataElement::atomic("tokenId", &token.token_id),
            DataElement::atomic("validUntil", token.valid_until.to_string()),
            DataElement::atomic("renewUntil", token.renew_until.to_string()),
            DataElement::atomic("idInUserStorage", &token.id_in_user_storage),
            DataElement::atomic("loginId", &token.login_id),
        ];
        if let Some(first_name) = &token.first_name {
            children.push(DataElement::atomic("firstName", first_name));
        }
        if let Some(last_name) = &token.last_name {
            children.push(DataElement::atomic("lastName", last_name));
        }
        children.extend(
            token
                .permission_units
                .iter()
                .map(|unit| DataElement::atomic("permissionUnit", unit)),
        );
        DataElement::group("authToken", children)
    }
}

/// The user tree is named by the storage id. Roles are nested under
/// `userRole` as one `permissionRole` group per role.
impl From<&User> for DataElement {
    fn from(user: &User) -> Self {
        let roles = user
            .roles
            .iter()
            .map(|role| {
                DataElement::group(
                    "permissionRole",
                    vec![DataElement::atomic("id", role)],
                )
            })
            .collect();

        let mut children = vec![DataElement::group("userRole", roles)];
        children.extend(
            user.permission_unit_ids
                .iter()
                .map(|unit| DataElement::atomic("permissionUnit", unit)),
        );
        let status = if user.active { "active" } else { "inactive" };
        children.push(DataElement::atomic("activeStatus", status));

        DataElement::group(&user.id, children)
    }
}
