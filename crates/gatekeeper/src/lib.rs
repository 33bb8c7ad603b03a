//! # Gatekeeper
//!
//! Session token core for an authentication gateway.
//!
//! Gatekeeper issues opaque bearer tokens for users resolved by a
//! pluggable [`IdentityResolver`](gatekeeper_session::IdentityResolver),
//! keeps the sessions and their users in memory, and drops or refreshes
//! cached users when the identity store announces a change.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use gatekeeper::prelude::*;
//!
//! # fn resolver() -> std::sync::Arc<dyn IdentityResolver> { unimplemented!() }
//! # async fn start() -> Result<(), GatekeeperError> {
//! let config = GatekeeperConfig::default();
//! let gatekeeper = Gatekeeper::builder()
//!     .config(config)
//!     .resolver(0, "directory", resolver())
//!     .build()?;
//!
//! let (_bus, feed) = ChannelFeed::channel(64);
//! let fault = gatekeeper.spawn_listener(feed).await;
//! // The host shuts down once the listener reports a fault.
//! # let _ = fault;
//! # Ok(())
//! # }
//! ```

mod config;
mod error;
mod handler;
mod logging;
mod server;

pub use config::{ConfigError, GatekeeperConfig};
pub use error::GatekeeperError;
pub use handler::Response;
pub use logging::init_tracing;
pub use server::{Gatekeeper, GatekeeperBuilder};

/// Everything a host needs to wire Gatekeeper up.
pub mod prelude {
    pub use gatekeeper_listener::{
        ChangeFeed, ChannelFeed, FatalFault, FeedMessage, FeedSender,
        InvalidationListener, NoopStorageInvalidation, StorageInvalidation,
    };
    pub use gatekeeper_protocol::{
        ChangeAction, DataElement, LoginDescriptor, SessionToken, User,
    };
    pub use gatekeeper_session::{
        Clock, IdentityError, IdentityResolver, SessionCache, SessionConfig,
        SessionError,
    };

    pub use crate::{
        Gatekeeper, GatekeeperBuilder, GatekeeperConfig, GatekeeperError,
        Response,
    };
}
