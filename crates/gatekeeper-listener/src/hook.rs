//! Storage-invalidation hook.
//!
//! The user-storage layer may keep its own cache. It is told about every
//! user change before the session cache is, so that re-reading an updated
//! user does not hit a stale storage cache.

use gatekeeper_protocol::ChangeAction;

/// Receives every `user` change ahead of the session cache.
pub trait StorageInvalidation: Send + Sync + 'static {
    /// # Errors
    /// Any error is treated as fatal by the listener.
    fn data_changed(
        &self,
        entity_type: &str,
        id: &str,
        action: ChangeAction,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// A hook for deployments whose user storage keeps no cache.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopStorageInvalidation;

impl StorageInvalidation for NoopStorageInvalidation {
    fn data_changed(
        &self,
        _entity_type: &str,
        _id: &str,
        _action: ChangeAction,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        Ok(())
    }
}
