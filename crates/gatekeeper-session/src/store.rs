//! The session store: both cache maps and every compound mutation on them.
//!
//! `SessionStore` is NOT thread-safe by itself. It uses plain `HashMap`s
//! and is owned by [`SessionCache`](crate::SessionCache), which serializes
//! all writers behind one lock. Each method here leaves the two maps
//! consistent before returning:
//!
//! - every session's `login_id` has a user entry
//! - a user entry's token set holds exactly the bearer tokens of its
//!   live sessions, and an entry with an empty set is removed
//!
//! ## Two maps, one owner
//!
//! ```text
//!   sessions: bearer token ──→ SessionEntry { token_id, login_id, ... }
//!                                                  │
//!   users:    login id ──────→ UserEntry { user: Arc<User>, tokens }
//! ```
//!
//! A session never holds the user directly. It holds the login id, and
//! the user is looked up through `users`. That indirection is what makes
//! an identity update cheap: one `Arc<User>` is swapped in the user entry
//! and every session of that login sees the new record on its next
//! lookup, without touching `sessions` at all.
//!
//! The reference count of a user entry is not a separate counter. It is
//! the size of the entry's token set, so inserting or removing a session
//! and adjusting the count are the same operation and cannot drift.
//!
//! ## Time
//!
//! Methods take the current time as an argument and never read a clock.
//! Which state a session is in at that instant comes from
//! [`SessionEntry::state_at`]: resolution needs `Active`, renewal and the
//! sweep only care whether it is `Terminated`.

use std::collections::HashMap;
use std::sync::Arc;

use gatekeeper_protocol::User;

use crate::{SessionEntry, SessionError, SessionState, UserEntry};

#[derive(Debug, Default)]
pub struct SessionStore {
    /// Bearer token → session metadata.
    sessions: HashMap<String, SessionEntry>,

    /// Login id → cached user and the tokens referencing it.
    users: HashMap<String, UserEntry>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the user behind a token that is valid at `now`.
    ///
    /// # Errors
    /// [`SessionError::InvalidSession`] if the token is unknown or its
    /// validity has passed.
    pub fn valid_user(
        &self,
        token: &str,
        now: u64,
    ) -> Result<Arc<User>, SessionError> {
        let session = self
            .sessions
            .get(token)
            .ok_or(SessionError::InvalidSession("token not valid"))?;
        if session.state_at(now) != SessionState::Active {
            return Err(SessionError::InvalidSession("token not valid"));
        }
        let entry = self
            .users
            .get(&session.login_id)
            .ok_or(SessionError::InvalidSession("token not valid"))?;
        Ok(Arc::clone(&entry.user))
    }

    /// Stores a new session and links it to its login's user entry.
    ///
    /// `user` is the record just read from the identity store, so it
    /// replaces whatever the login's entry held before. The entry's other
    /// sessions keep their tokens and now resolve to `user` as well.
    pub fn insert(
        &mut self,
        token: String,
        session: SessionEntry,
        user: Arc<User>,
    ) {
        match self.users.get_mut(&session.login_id) {
            Some(entry) => {
                entry.user = user;
                entry.tokens.insert(token.clone());
            }
            None => {
                let mut entry = UserEntry::new(user);
                entry.tokens.insert(token.clone());
                self.users.insert(session.login_id.clone(), entry);
            }
        }
        self.sessions.insert(token, session);
    }

    /// Moves a session from `old_token` to `new_token`.
    ///
    /// The token id, login id, and `renew_until` carry over; `valid_until`
    /// is replaced. The old key is gone when this returns. A session whose
    /// renewal window has passed is removed instead.
    ///
    /// # Errors
    /// [`SessionError::InvalidSession`] if `old_token` is unknown, the
    /// token id does not match, or `now` is past `renew_until`.
    pub fn renew(
        &mut self,
        token_id: &str,
        old_token: &str,
        new_token: String,
        valid_until: u64,
        now: u64,
    ) -> Result<(SessionEntry, Arc<User>), SessionError> {
        let current = self
            .sessions
            .get(old_token)
            .ok_or(SessionError::InvalidSession("token not valid"))?;
        if current.token_id != token_id {
            return Err(SessionError::InvalidSession("tokenId does not match"));
        }
        if current.state_at(now) == SessionState::Terminated {
            self.remove_session(old_token);
            return Err(SessionError::InvalidSession("renew window has passed"));
        }

        let Some(old) = self.sessions.remove(old_token) else {
            return Err(SessionError::InvalidSession("token not valid"));
        };
        let renewed = SessionEntry {
            valid_until,
            ..old
        };
        let entry = self
            .users
            .get_mut(&renewed.login_id)
            .ok_or(SessionError::InvalidSession("token not valid"))?;
        entry.tokens.remove(old_token);
        entry.tokens.insert(new_token.clone());
        let user = Arc::clone(&entry.user);
        self.sessions.insert(new_token, renewed.clone());
        Ok((renewed, user))
    }

    /// Removes a session after checking its token id.
    ///
    /// # Errors
    /// [`SessionError::InvalidSession`] if the token is unknown or the
    /// token id does not match.
    pub fn revoke(
        &mut self,
        token_id: &str,
        token: &str,
    ) -> Result<SessionEntry, SessionError> {
        let session = self
            .sessions
            .get(token)
            .ok_or(SessionError::InvalidSession("token not valid"))?;
        if session.token_id != token_id {
            return Err(SessionError::InvalidSession("tokenId does not match"));
        }
        self.remove_session(token)
            .ok_or(SessionError::InvalidSession("token not valid"))
    }

    /// Removes every session whose renewal window has passed at `now`.
    ///
    /// Returns how many sessions were removed.
    pub fn sweep_expired(&mut self, now: u64) -> usize {
        let dead: Vec<String> = self
            .sessions
            .iter()
            .filter(|(_, s)| s.state_at(now) == SessionState::Terminated)
            .map(|(token, _)| token.clone())
            .collect();
        for token in &dead {
            self.remove_session(token);
        }
        dead.len()
    }

    /// Login ids whose cached user has the given storage id.
    pub fn logins_for_storage_id(&self, id: &str) -> Vec<String> {
        self.users
            .iter()
            .filter(|(_, e)| e.user.id == id)
            .map(|(login_id, _)| login_id.clone())
            .collect()
    }

    /// Replaces the user in every entry that still carries storage id `id`.
    ///
    /// Token sets (and so reference counts) are untouched. Returns the
    /// number of entries replaced.
    pub fn replace_user(&mut self, id: &str, user: Arc<User>) -> usize {
        let mut replaced = 0;
        for entry in self.users.values_mut().filter(|e| e.user.id == id) {
            entry.user = Arc::clone(&user);
            replaced += 1;
        }
        replaced
    }

    /// Drops every user entry with storage id `id` and all their sessions.
    ///
    /// Returns the number of sessions removed.
    pub fn remove_user(&mut self, id: &str) -> usize {
        let mut removed = 0;
        for login_id in self.logins_for_storage_id(id) {
            if let Some(entry) = self.users.remove(&login_id) {
                for token in &entry.tokens {
                    if self.sessions.remove(token).is_some() {
                        removed += 1;
                    }
                }
            }
        }
        removed
    }

    pub fn session(&self, token: &str) -> Option<&SessionEntry> {
        self.sessions.get(token)
    }

    pub fn user_entry(&self, login_id: &str) -> Option<&UserEntry> {
        self.users.get(login_id)
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    pub fn user_entry_count(&self) -> usize {
        self.users.len()
    }

    /// Removes one session and unlinks it from its user entry, dropping
    /// the entry when no tokens remain.
    fn remove_session(&mut self, token: &str) -> Option<SessionEntry> {
        let session = self.sessions.remove(token)?;
        if let Some(entry) = self.users.get_mut(&session.login_id) {
            entry.tokens.remove(token);
            if entry.tokens.is_empty() {
                self.users.remove(&session.login_id);
            }
        }
        Some(session)
    }
}
