//! The invalidation listener loop.
//!
//! For each message the listener:
//!   1. Ignores it unless `type == "user"`
//!   2. Parses `id` and `action`
//!   3. Tells the storage hook
//!   4. Tells the session cache
//!
//! Any failure in steps 2-4, and the feed closing, ends the loop with a
//! [`FatalFault`]. Nothing is retried.

use std::sync::Arc;

use gatekeeper_protocol::{ChangeAction, USER_ENTITY_TYPE};
use gatekeeper_session::SessionCache;

use crate::{
    ChangeFeed, FatalFault, FeedMessage, ListenerError, StorageInvalidation,
};

/// A parsed `user` change notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeNotification {
    pub entity_type: String,
    pub id: String,
    pub action: ChangeAction,
}

impl ChangeNotification {
    /// Extracts a notification from message headers.
    ///
    /// Returns `Ok(None)` for messages about other entity types (or with
    /// no `type` header at all).
    ///
    /// # Errors
    /// - [`ListenerError::MissingHeader`]: `id` or `action` absent
    /// - [`ListenerError::Protocol`]: `action` not create/update/delete
    pub fn from_message(
        message: &FeedMessage,
    ) -> Result<Option<Self>, ListenerError> {
        if message.header("type") != Some(USER_ENTITY_TYPE) {
            return Ok(None);
        }
        let id = message
            .header("id")
            .ok_or(ListenerError::MissingHeader("id"))?;
        let action = message
            .header("action")
            .ok_or(ListenerError::MissingHeader("action"))?
            .parse::<ChangeAction>()?;
        Ok(Some(Self {
            entity_type: USER_ENTITY_TYPE.to_string(),
            id: id.to_string(),
            action,
        }))
    }
}

/// Drives session-cache reconciliation from a change feed.
pub struct InvalidationListener<F: ChangeFeed> {
    feed: F,
    cache: Arc<SessionCache>,
    storage: Arc<dyn StorageInvalidation>,
}

impl<F: ChangeFeed> InvalidationListener<F> {
    pub fn new(
        feed: F,
        cache: Arc<SessionCache>,
        storage: Arc<dyn StorageInvalidation>,
    ) -> Self {
        Self {
            feed,
            cache,
            storage,
        }
    }

    /// Processes one message synchronously.
    ///
    /// The identity resolver may block, so async callers should go through
    /// [`run`](Self::run), which moves this onto the blocking pool.
    ///
    /// # Errors
    /// See [`ListenerError`]; every variant is fatal to the listener.
    pub fn handle(&self, message: &FeedMessage) -> Result<(), ListenerError> {
        apply(&self.cache, self.storage.as_ref(), message)
    }

    /// Runs until the feed closes or a message fails.
    ///
    /// Never returns while the cache is still known to be in sync; the
    /// returned fault is the signal for the host to shut down.
    pub async fn run(mut self) -> FatalFault {
        tracing::info!("invalidation listener running");
        loop {
            let message = match self.feed.recv().await {
                Ok(Some(message)) => message,
                Ok(None) => {
                    tracing::error!(
                        "shutting down due to lost connection with message broker, \
                         continued operation would lead to system inconsistencies"
                    );
                    return FatalFault::ConnectionLost;
                }
                Err(e) => return fatal(e),
            };

            let cache = Arc::clone(&self.cache);
            let storage = Arc::clone(&self.storage);
            let outcome = tokio::task::spawn_blocking(move || {
                apply(&cache, storage.as_ref(), &message)
            })
            .await
            .unwrap_or_else(|e| Err(ListenerError::Aborted(e.to_string())));

            if let Err(e) = outcome {
                return fatal(e);
            }
        }
    }
}

fn apply(
    cache: &SessionCache,
    storage: &dyn StorageInvalidation,
    message: &FeedMessage,
) -> Result<(), ListenerError> {
    let Some(change) = ChangeNotification::from_message(message)? else {
        tracing::debug!(
            entity_type = message.header("type").unwrap_or("<none>"),
            "skipping notification for other entity type"
        );
        return Ok(());
    };

    tracing::debug!(id = %change.id, action = %change.action, "user changed");
    storage
        .data_changed(&change.entity_type, &change.id, change.action)
        .map_err(ListenerError::Storage)?;
    cache.on_identity_changed(&change.entity_type, &change.id, change.action)?;
    Ok(())
}

fn fatal(error: ListenerError) -> FatalFault {
    tracing::error!(
        %error,
        "shutting down due to error keeping data in sync, \
         continued operation would lead to system inconsistencies"
    );
    FatalFault::Processing(error)
}
