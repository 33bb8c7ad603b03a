//! Session types: what the cache stores per bearer token and per login.
//!
//! A session is the pairing of:
//! - a bearer token (the map key, the credential for resolving a user)
//! - a [`SessionEntry`] (token id, login id, and two deadlines)
//! - the [`UserEntry`] shared by every session of the same login

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use gatekeeper_protocol::User;
use serde::Deserialize;

// ---------------------------------------------------------------------------
// SessionConfig
// ---------------------------------------------------------------------------

/// Lifetimes applied when a session is issued or renewed.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// How long a bearer token can be used to resolve its user.
    /// Renewal issues a new token with a fresh `session_ttl`.
    ///
    /// Default: 600 seconds.
    pub session_ttl: Duration,

    /// How long after issuance the session may still be renewed. Fixed
    /// when the session is first issued; renewal does not extend it.
    ///
    /// Default: 24 hours.
    pub renew_window: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            session_ttl: Duration::from_secs(600),
            renew_window: Duration::from_secs(24 * 60 * 60),
        }
    }
}

impl SessionConfig {
    pub(crate) fn ttl_millis(&self) -> u64 {
        duration_millis(self.session_ttl)
    }

    pub(crate) fn renew_window_millis(&self) -> u64 {
        duration_millis(self.renew_window)
    }
}

fn duration_millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

// ---------------------------------------------------------------------------
// SessionState
// ---------------------------------------------------------------------------

/// Where a session is in its life, judged at a given instant.
///
/// ```text
///   Active ──(validUntil passes)──→ Renewable ──(renewUntil passes)──→ Terminated
///     ↑                                 │
///     └────────────(renew)──────────────┘
/// ```
///
/// Revocation and identity deletion jump straight to `Terminated` by
/// removing the entry, so only the first two states are ever observed on
/// a stored entry with a current clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Resolvable and renewable.
    Active,
    /// No longer resolvable, still renewable.
    Renewable,
    /// Neither. The entry is removed on the next sweep.
    Terminated,
}

// ---------------------------------------------------------------------------
// SessionEntry
// ---------------------------------------------------------------------------

/// Metadata stored under a bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionEntry {
    /// Second identifier required alongside the bearer token to renew or
    /// revoke. Survives renewal.
    pub token_id: String,

    /// Key of the shared [`UserEntry`].
    pub login_id: String,

    /// Epoch millis after which the token no longer resolves.
    pub valid_until: u64,

    /// Epoch millis after which the session can no longer be renewed.
    pub renew_until: u64,
}

impl SessionEntry {
    /// Judges the session at `now`. Both deadlines are inclusive.
    pub fn state_at(&self, now: u64) -> SessionState {
        if now <= self.valid_until {
            SessionState::Active
        } else if now <= self.renew_until {
            SessionState::Renewable
        } else {
            SessionState::Terminated
        }
    }
}

// ---------------------------------------------------------------------------
// UserEntry
// ---------------------------------------------------------------------------

/// A cached user and the bearer tokens that currently reference it.
///
/// The reference count is the size of `tokens`, so it cannot drift from
/// the set of live sessions.
#[derive(Debug, Clone)]
pub struct UserEntry {
    pub user: Arc<User>,
    pub(crate) tokens: HashSet<String>,
}

impl UserEntry {
    pub(crate) fn new(user: Arc<User>) -> Self {
        Self {
            user,
            tokens: HashSet::new(),
        }
    }

    /// Number of live sessions for this login.
    pub fn ref_count(&self) -> usize {
        self.tokens.len()
    }
}
