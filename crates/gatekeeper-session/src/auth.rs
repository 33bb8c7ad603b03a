//! Identity resolution hook.
//!
//! Gatekeeper does not know where users live. A deployment plugs in an
//! [`IdentityResolver`] that reads them from LDAP, a database, a fixed
//! list, or anything else, and the session cache calls it whenever it
//! needs a fresh user record.

use gatekeeper_protocol::{LoginDescriptor, User};

use crate::IdentityError;

/// Maps login descriptors to user records and supplies the guest identity.
///
/// Calls are synchronous and may block on I/O. The cache never holds its
/// own lock while calling a resolver.
///
/// # Example
///
/// ```rust
/// use gatekeeper_protocol::{LoginDescriptor, User};
/// use gatekeeper_session::{IdentityError, IdentityResolver};
///
/// /// Accepts every login and uses the login id as the storage id.
/// struct EchoResolver;
///
/// impl IdentityResolver for EchoResolver {
///     fn pick_user(
///         &self,
///         descriptor: &LoginDescriptor,
///     ) -> Result<User, IdentityError> {
///         match descriptor {
///             LoginDescriptor::Login { login_id, .. } => {
///                 Ok(User::new(login_id.clone(), login_id.clone()))
///             }
///             LoginDescriptor::StorageId { id } => {
///                 Ok(User::new(id.clone(), id.clone()))
///             }
///         }
///     }
///
///     fn pick_guest(&self) -> Result<User, IdentityError> {
///         Ok(User::new("guest", "guest"))
///     }
/// }
/// ```
pub trait IdentityResolver: Send + Sync + 'static {
    /// Resolves the user a descriptor refers to.
    ///
    /// # Errors
    /// Any [`IdentityError`]; the cache wraps it before it reaches a caller.
    fn pick_user(
        &self,
        descriptor: &LoginDescriptor,
    ) -> Result<User, IdentityError>;

    /// Returns the anonymous identity used when no token is presented.
    ///
    /// # Errors
    /// Any [`IdentityError`] from the backing store.
    fn pick_guest(&self) -> Result<User, IdentityError>;
}
