//! Integration tests for the invalidation listener.
//!
//! A real `SessionCache` is driven through a `ChannelFeed`. The storage
//! hook and the identity resolver append to one shared event log so the
//! tests can check that storage hears about a change first.

use std::sync::{Arc, Mutex};

use gatekeeper_listener::{
    ChangeFeed, ChannelFeed, FatalFault, FeedMessage, InvalidationListener,
    ListenerError, NoopStorageInvalidation, StorageInvalidation,
};
use gatekeeper_protocol::{ChangeAction, LoginDescriptor, User};
use gatekeeper_session::{
    IdentityError, IdentityResolver, SessionCache, SessionConfig, SessionError,
};

// =========================================================================
// Mocks
// =========================================================================

type Log = Arc<Mutex<Vec<String>>>;

struct LoggingResolver {
    log: Log,
}

impl IdentityResolver for LoggingResolver {
    fn pick_user(
        &self,
        descriptor: &LoginDescriptor,
    ) -> Result<User, IdentityError> {
        self.log.lock().unwrap().push(format!("resolve {descriptor}"));
        match descriptor {
            LoginDescriptor::Login { login_id, .. } => {
                Ok(User::new(format!("s-{login_id}"), login_id.clone()))
            }
            LoginDescriptor::StorageId { id } if id == "s-gone" => {
                Err(IdentityError::UnknownUser(id.clone()))
            }
            LoginDescriptor::StorageId { id } => {
                let login = id.trim_start_matches("s-");
                Ok(User::new(id.clone(), login).with_role("refreshed"))
            }
        }
    }

    fn pick_guest(&self) -> Result<User, IdentityError> {
        Ok(User::new("guest", "guest"))
    }
}

struct LoggingStorage {
    log: Log,
    fail: bool,
}

impl StorageInvalidation for LoggingStorage {
    fn data_changed(
        &self,
        entity_type: &str,
        id: &str,
        action: ChangeAction,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.log
            .lock()
            .unwrap()
            .push(format!("storage {entity_type} {id} {action}"));
        if self.fail {
            return Err("storage cache unavailable".into());
        }
        Ok(())
    }
}

/// A feed whose transport fails on the first receive.
struct BrokenFeed;

impl ChangeFeed for BrokenFeed {
    async fn recv(&mut self) -> Result<Option<FeedMessage>, ListenerError> {
        Err(ListenerError::Feed("socket reset".into()))
    }
}

fn cache_with_log(log: &Log) -> Arc<SessionCache> {
    Arc::new(SessionCache::new(
        SessionConfig::default(),
        Arc::new(LoggingResolver { log: log.clone() }),
    ))
}

fn login(id: &str) -> LoginDescriptor {
    LoginDescriptor::login(id, "uu")
}

// =========================================================================
// handle()
// =========================================================================

#[test]
fn test_handle_update_tells_storage_before_cache() {
    let log: Log = Arc::default();
    let cache = cache_with_log(&log);
    cache.issue_session(&login("alice")).unwrap();
    log.lock().unwrap().clear();
    let (_tx, feed) = ChannelFeed::channel(1);
    let listener = InvalidationListener::new(
        feed,
        Arc::clone(&cache),
        Arc::new(LoggingStorage {
            log: log.clone(),
            fail: false,
        }),
    );

    listener
        .handle(&FeedMessage::change("user", "s-alice", "update"))
        .unwrap();

    assert_eq!(
        *log.lock().unwrap(),
        vec![
            "storage user s-alice update".to_string(),
            "resolve storage:s-alice".to_string(),
        ]
    );
}

#[test]
fn test_handle_other_entity_type_touches_nothing() {
    let log: Log = Arc::default();
    let cache = cache_with_log(&log);
    let (_tx, feed) = ChannelFeed::channel(1);
    let listener = InvalidationListener::new(
        feed,
        cache,
        Arc::new(LoggingStorage {
            log: log.clone(),
            fail: false,
        }),
    );

    listener
        .handle(&FeedMessage::change("recordType", "x", "delete"))
        .unwrap();

    assert!(log.lock().unwrap().is_empty());
}

#[test]
fn test_handle_reresolution_failure_is_reconciliation_error() {
    let log: Log = Arc::default();
    let cache = cache_with_log(&log);
    cache.issue_session(&login("gone")).unwrap();
    let (_tx, feed) = ChannelFeed::channel(1);
    let listener = InvalidationListener::new(
        feed,
        cache,
        Arc::new(NoopStorageInvalidation),
    );

    let result = listener.handle(&FeedMessage::change("user", "s-gone", "update"));

    assert!(matches!(
        result,
        Err(ListenerError::Reconciliation(SessionError::Identity { .. }))
    ));
}

// =========================================================================
// run()
// =========================================================================

#[tokio::test]
async fn test_run_applies_changes_then_reports_connection_lost() {
    let log: Log = Arc::default();
    let cache = cache_with_log(&log);
    let alice = cache.issue_session(&login("alice")).unwrap();
    let bob = cache.issue_session(&login("bob")).unwrap();
    let (tx, feed) = ChannelFeed::channel(8);
    let listener = InvalidationListener::new(
        feed,
        Arc::clone(&cache),
        Arc::new(NoopStorageInvalidation),
    );

    tx.send(FeedMessage::change("user", "s-alice", "update"))
        .await
        .unwrap();
    tx.send(FeedMessage::change("user", "s-bob", "delete"))
        .await
        .unwrap();
    drop(tx);

    let fault = listener.run().await;

    assert!(matches!(fault, FatalFault::ConnectionLost));
    let refreshed = cache.resolve_user(Some(&alice.token)).unwrap();
    assert!(refreshed.roles.contains("refreshed"));
    assert!(matches!(
        cache.resolve_user(Some(&bob.token)),
        Err(SessionError::InvalidSession(_))
    ));
    assert_eq!(cache.session_count(), 1);
}

#[tokio::test]
async fn test_run_storage_failure_is_fatal_and_cache_untouched() {
    let log: Log = Arc::default();
    let cache = cache_with_log(&log);
    let alice = cache.issue_session(&login("alice")).unwrap();
    let (tx, feed) = ChannelFeed::channel(8);
    let listener = InvalidationListener::new(
        feed,
        Arc::clone(&cache),
        Arc::new(LoggingStorage {
            log: log.clone(),
            fail: true,
        }),
    );

    tx.send(FeedMessage::change("user", "s-alice", "delete"))
        .await
        .unwrap();

    let fault = listener.run().await;

    assert!(matches!(
        fault,
        FatalFault::Processing(ListenerError::Storage(_))
    ));
    assert!(cache.resolve_user(Some(&alice.token)).is_ok());
}

#[tokio::test]
async fn test_run_malformed_user_message_is_fatal() {
    let log: Log = Arc::default();
    let (tx, feed) = ChannelFeed::channel(8);
    let listener = InvalidationListener::new(
        feed,
        cache_with_log(&log),
        Arc::new(NoopStorageInvalidation),
    );

    tx.send(FeedMessage::change("other", "x", "whatever"))
        .await
        .unwrap();
    tx.send(FeedMessage::change("user", "s-1", "rename"))
        .await
        .unwrap();

    let fault = listener.run().await;

    assert!(matches!(
        fault,
        FatalFault::Processing(ListenerError::Protocol(_))
    ));
}

#[tokio::test]
async fn test_run_feed_error_is_fatal() {
    let log: Log = Arc::default();
    let listener = InvalidationListener::new(
        BrokenFeed,
        cache_with_log(&log),
        Arc::new(NoopStorageInvalidation),
    );

    let fault = listener.run().await;

    assert!(matches!(fault, FatalFault::Processing(ListenerError::Feed(_))));
    assert_eq!(
        fault.to_string(),
        "error keeping data in sync: change feed failed: socket reset"
    );
}
