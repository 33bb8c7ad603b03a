//! Invalidation listener for Gatekeeper.
//!
//! The identity store publishes a change notification whenever a user is
//! created, updated, or deleted. This crate receives those notifications
//! and drives the session cache's reconciliation with them.
//!
//! - [`ChangeFeed`] abstracts the message-bus subscription. [`ChannelFeed`]
//!   is an in-process implementation backed by a Tokio channel.
//! - [`StorageInvalidation`] is the hook for the user-storage layer, which
//!   hears about every change before the session cache does.
//! - [`InvalidationListener`] ties them together and runs until something
//!   goes wrong, then returns a [`FatalFault`].
//!
//! A listener never recovers from a fault. A session cache that might be
//! stale relative to the identity store must not keep serving, so the
//! host is expected to shut down when [`InvalidationListener::run`]
//! returns.

mod error;
mod feed;
mod hook;
mod listener;

pub use error::{FatalFault, ListenerError};
pub use feed::{ChangeFeed, ChannelFeed, FeedMessage, FeedSender};
pub use hook::{NoopStorageInvalidation, StorageInvalidation};
pub use listener::{ChangeNotification, InvalidationListener};
