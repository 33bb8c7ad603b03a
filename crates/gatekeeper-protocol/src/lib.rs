//! Data records shared by every Gatekeeper layer.
//!
//! This crate defines what the session cache stores and what it hands back:
//!
//! - **Identity** ([`User`], [`LoginDescriptor`]): the user record produced
//!   by an identity resolver and the descriptor used to ask for one.
//! - **Sessions** ([`SessionToken`]): the projection returned to callers
//!   after issuing or renewing a session.
//! - **Change notifications** ([`ChangeAction`]): the actions carried by
//!   identity-store change messages.
//! - **Data trees** ([`DataElement`]): the generic name/children/value
//!   shape used when a session or user is rendered for a client, and the
//!   [`Codec`] that turns it into bytes.
//!
//! # Architecture
//!
//! ```text
//! Listener (change feed) → Session (cache engine) → Protocol (records)
//! ```

mod codec;
mod error;
mod tree;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use tree::DataElement;
pub use types::{
    ChangeAction, LoginDescriptor, SessionToken, USER_ENTITY_TYPE, User,
};
