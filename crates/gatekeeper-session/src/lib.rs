//! Session token cache for Gatekeeper.
//!
//! This crate owns the lifecycle of bearer-token sessions:
//!
//! 1. **Identity resolution**: turning a login descriptor into a user
//!    ([`IdentityResolver`] trait, chosen at startup by [`ResolverRegistry`])
//! 2. **Session tracking**: issuing, validating, renewing, and revoking
//!    bearer tokens ([`SessionCache`])
//! 3. **Reconciliation**: keeping cached users in step with the identity
//!    store when change notifications arrive
//!    ([`SessionCache::on_identity_changed`])
//!
//! # How it fits in the stack
//!
//! ```text
//! Endpoints / Listener (above)  ← call into the cache
//!     ↕
//! Session Layer (this crate)    ← token → session, loginId → user
//!     ↕
//! Protocol Layer (below)        ← User, LoginDescriptor, SessionToken
//! ```

mod auth;
mod cache;
mod clock;
mod error;
mod lock;
mod registry;
mod session;
mod store;

pub use auth::IdentityResolver;
pub use cache::SessionCache;
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{IdentityError, RegistryError, SessionError};
pub use registry::ResolverRegistry;
pub use session::{SessionConfig, SessionEntry, SessionState, UserEntry};
pub use store::SessionStore;
