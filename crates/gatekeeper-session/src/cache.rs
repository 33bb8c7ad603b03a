//! The session cache engine.
//!
//! `SessionCache` is the shared, thread-safe face of the session layer.
//! One instance is built at startup and handed (as an `Arc`) to every
//! request handler and to the invalidation listener. It is responsible
//! for:
//! - Logging users in through the [`IdentityResolver`] and handing out
//!   bearer tokens
//! - Answering "which user is this token?" on every request
//! - Renewing and revoking sessions
//! - Refreshing or dropping cached users when the identity store changes
//!
//! # Concurrency
//!
//! All state lives in a [`SessionStore`] behind one `RwLock`. Every
//! mutation takes the write lock, so compound steps like "decrement the
//! reference count, delete the entry at zero" never interleave. Token
//! resolution only takes the read lock, and it is by far the most
//! frequent call, so request threads rarely wait on each other.
//!
//! The identity resolver is always called with no lock held. It may talk
//! to a directory server and take a while; holding the write lock across
//! that call would stall every request in the process. The price is that
//! a call like `issue_session` is two steps (resolve, then insert), and
//! another thread can act in between. Each step on its own keeps the
//! store consistent, which is all the engine promises.
//!
//! # Freshness
//!
//! The cached user for a login is replaced whenever something newer is
//! read from the identity store: on every login and on every `update`
//! notification. Between those, sessions see the record as it was last
//! read.

use std::sync::{Arc, RwLock};

use gatekeeper_protocol::{
    ChangeAction, LoginDescriptor, SessionToken, USER_ENTITY_TYPE, User,
};
use rand::Rng;

use crate::lock::{rw_read, rw_write};
use crate::{
    Clock, IdentityResolver, SessionConfig, SessionEntry, SessionError,
    SessionStore, SystemClock,
};

/// Issues, validates, renews, and revokes bearer-token sessions.
///
/// ## Lifecycle
///
/// ```text
/// issue_session() ──→ [Active] ──(ttl)──→ [Renewable] ──(window)──→ swept
///                        │  ↑                  │
///                        │  └──renew_session()─┘
///                        ▼
///               revoke_session() / identity delete ──→ removed
/// ```
pub struct SessionCache {
    store: RwLock<SessionStore>,
    resolver: Arc<dyn IdentityResolver>,
    clock: Arc<dyn Clock>,
    config: SessionConfig,
}

impl SessionCache {
    /// Creates an empty cache that reads the system clock.
    pub fn new(config: SessionConfig, resolver: Arc<dyn IdentityResolver>) -> Self {
        Self::with_clock(config, resolver, Arc::new(SystemClock))
    }

    /// Creates an empty cache with an explicit clock.
    pub fn with_clock(
        config: SessionConfig,
        resolver: Arc<dyn IdentityResolver>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store: RwLock::new(SessionStore::new()),
            resolver,
            clock,
            config,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Returns the user a bearer token stands for, or the guest when no
    /// token is given.
    ///
    /// The guest comes straight from the resolver and is never cached.
    ///
    /// # Errors
    /// - [`SessionError::InvalidSession`]: unknown or no longer valid token
    /// - [`SessionError::Authentication`]: the resolver failed to supply
    ///   the guest
    pub fn resolve_user(
        &self,
        token: Option<&str>,
    ) -> Result<Arc<User>, SessionError> {
        let Some(token) = token else {
            let guest = self.resolver.pick_guest().map_err(|source| {
                SessionError::Authentication {
                    descriptor: "guest".to_string(),
                    source,
                }
            })?;
            return Ok(Arc::new(guest));
        };

        let now = self.clock.now_millis();
        rw_read(&self.store, "resolve_user").valid_user(token, now)
    }

    /// Logs a user in and starts a new session.
    ///
    /// Sessions whose renewal window has passed are swept first. Both the
    /// bearer token and the token id are fresh random values.
    ///
    /// # Errors
    /// [`SessionError::Authentication`] wrapping whatever the resolver
    /// returned.
    pub fn issue_session(
        &self,
        descriptor: &LoginDescriptor,
    ) -> Result<SessionToken, SessionError> {
        self.sweep_expired();

        let user = self.resolver.pick_user(descriptor).map_err(|source| {
            tracing::warn!(%descriptor, error = %source, "could not pick user");
            SessionError::Authentication {
                descriptor: descriptor.to_string(),
                source,
            }
        })?;

        let now = self.clock.now_millis();
        let token = generate_token();
        let session = SessionEntry {
            token_id: generate_token(),
            login_id: user.login_id.clone(),
            valid_until: now.saturating_add(self.config.ttl_millis()),
            renew_until: now.saturating_add(self.config.renew_window_millis()),
        };

        let user = Arc::new(user);
        rw_write(&self.store, "issue_session").insert(
            token.clone(),
            session.clone(),
            Arc::clone(&user),
        );

        tracing::info!(
            login_id = %session.login_id,
            token_id = %session.token_id,
            "session issued"
        );

        Ok(SessionToken::new(
            token,
            session.token_id,
            session.valid_until,
            session.renew_until,
            &user,
        ))
    }

    /// Swaps a session's bearer token for a new one with fresh validity.
    ///
    /// Works on active sessions and on sessions whose validity has passed
    /// but whose renewal window has not. The token id, login id, and
    /// renewal deadline carry over; the old bearer token stops working
    /// immediately. The user entry's reference count is unchanged.
    ///
    /// # Errors
    /// [`SessionError::InvalidSession`]: unknown token, mismatched token
    /// id, or renewal window passed
    pub fn renew_session(
        &self,
        token_id: &str,
        old_token: &str,
    ) -> Result<SessionToken, SessionError> {
        let now = self.clock.now_millis();
        let new_token = generate_token();
        let valid_until = now.saturating_add(self.config.ttl_millis());

        let (session, user) = rw_write(&self.store, "renew_session")
            .renew(token_id, old_token, new_token.clone(), valid_until, now)
            .inspect_err(|e| {
                tracing::warn!(%token_id, error = %e, "renewal rejected");
            })?;

        tracing::info!(
            login_id = %session.login_id,
            %token_id,
            "session renewed"
        );

        Ok(SessionToken::new(
            new_token,
            session.token_id,
            session.valid_until,
            session.renew_until,
            &user,
        ))
    }

    /// Ends a session.
    ///
    /// # Errors
    /// [`SessionError::InvalidSession`]: unknown token or mismatched
    /// token id
    pub fn revoke_session(
        &self,
        token_id: &str,
        token: &str,
    ) -> Result<(), SessionError> {
        let session = rw_write(&self.store, "revoke_session")
            .revoke(token_id, token)
            .inspect_err(|e| {
                tracing::warn!(%token_id, error = %e, "revocation rejected");
            })?;

        tracing::info!(
            login_id = %session.login_id,
            %token_id,
            "session revoked"
        );
        Ok(())
    }

    /// Reconciles the cache with a change in the identity store.
    ///
    /// Only the `user` entity type is handled; anything else is ignored.
    ///
    /// - `update` re-reads the user by storage id and swaps it into every
    ///   cached entry carrying that id. Sessions and reference counts are
    ///   untouched. If nothing is cached for the id the resolver is not
    ///   called. A login id that changed in the store is not reconciled:
    ///   the entry stays keyed by the old login id.
    /// - `delete` drops the user entries and every session for the id.
    /// - `create` needs nothing: a new user has no sessions yet.
    ///
    /// # Errors
    /// [`SessionError::Identity`] if re-reading an updated user fails.
    pub fn on_identity_changed(
        &self,
        entity_type: &str,
        id: &str,
        action: ChangeAction,
    ) -> Result<(), SessionError> {
        if entity_type != USER_ENTITY_TYPE {
            tracing::debug!(entity_type, id, "ignoring change for other entity type");
            return Ok(());
        }

        match action {
            ChangeAction::Update => self.refresh_user(id),
            ChangeAction::Delete => {
                let removed = rw_write(&self.store, "identity_delete").remove_user(id);
                tracing::info!(id, sessions_removed = removed, "user deleted, sessions dropped");
                Ok(())
            }
            ChangeAction::Create => Ok(()),
        }
    }

    /// Removes every session whose renewal window has passed.
    ///
    /// Called at the start of each issuance; hosts may also call it on
    /// their own schedule. Returns the number of sessions removed.
    pub fn sweep_expired(&self) -> usize {
        let now = self.clock.now_millis();
        let removed = rw_write(&self.store, "sweep_expired").sweep_expired(now);
        if removed > 0 {
            tracing::debug!(removed, "swept expired sessions");
        }
        removed
    }

    pub fn session_count(&self) -> usize {
        rw_read(&self.store, "session_count").session_count()
    }

    pub fn user_entry_count(&self) -> usize {
        rw_read(&self.store, "user_entry_count").user_entry_count()
    }

    /// Number of live sessions for a login id (0 when none are cached).
    pub fn ref_count(&self, login_id: &str) -> usize {
        rw_read(&self.store, "ref_count")
            .user_entry(login_id)
            .map_or(0, |e| e.ref_count())
    }

    fn refresh_user(&self, id: &str) -> Result<(), SessionError> {
        let cached = rw_read(&self.store, "identity_update").logins_for_storage_id(id);
        if cached.is_empty() {
            tracing::debug!(id, "update for uncached user ignored");
            return Ok(());
        }

        let user = self
            .resolver
            .pick_user(&LoginDescriptor::storage_id(id))
            .map_err(|source| SessionError::Identity {
                id: id.to_string(),
                source,
            })?;

        let replaced =
            rw_write(&self.store, "identity_update").replace_user(id, Arc::new(user));
        tracing::info!(id, entries = replaced, "cached user updated");
        Ok(())
    }
}

/// Generates a random 32-character hex string (128 bits of entropy).
///
/// Used for both bearer tokens and token ids; the two are drawn
/// independently.
fn generate_token() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; 16] = rng.random();
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

// =========================================================================
// Tests
// =========================================================================
