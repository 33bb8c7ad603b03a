//! Change feed abstraction and an in-process implementation.

use std::collections::HashMap;

use tokio::sync::mpsc;

use crate::ListenerError;

/// One message delivered by a change feed.
///
/// Only the headers matter for invalidation; the body is kept so hosts
/// can log it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedMessage {
    pub headers: HashMap<String, String>,
    pub body: String,
}

impl FeedMessage {
    /// Builds a message carrying the three change headers.
    pub fn change(entity_type: &str, id: &str, action: &str) -> Self {
        let headers = [("type", entity_type), ("id", id), ("action", action)]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Self {
            headers,
            body: String::new(),
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }
}

/// A subscription to change notifications.
///
/// Implementations wrap whatever message bus the deployment uses. The
/// subscription is expected to be scoped to the `user` entity type
/// already; the listener still checks the `type` header.
pub trait ChangeFeed: Send + 'static {
    /// Waits for the next message.
    ///
    /// Returns `Ok(None)` when the subscription is closed for good.
    ///
    /// The future must be `Send` so the listener can run on any worker
    /// thread.
    fn recv(
        &mut self,
    ) -> impl Future<Output = Result<Option<FeedMessage>, ListenerError>> + Send;
}

/// Sending half of a [`ChannelFeed`].
pub type FeedSender = mpsc::Sender<FeedMessage>;

/// A [`ChangeFeed`] fed through a Tokio channel.
///
/// Useful in tests and when the bus client lives elsewhere in the
/// process and forwards messages. The feed closes once every
/// [`FeedSender`] is dropped.
pub struct ChannelFeed {
    rx: mpsc::Receiver<FeedMessage>,
}

impl ChannelFeed {
    /// Creates a bounded feed and its sender.
    pub fn channel(capacity: usize) -> (FeedSender, Self) {
        let (tx, rx) = mpsc::channel(capacity);
        (tx, Self { rx })
    }
}

impl ChangeFeed for ChannelFeed {
    async fn recv(&mut self) -> Result<Option<FeedMessage>, ListenerError> {
        Ok(self.rx.recv().await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feed_message_change_sets_headers() {
        let msg = FeedMessage::change("user", "u-1", "update");

        assert_eq!(msg.header("type"), Some("user"));
        assert_eq!(msg.header("id"), Some("u-1"));
        assert_eq!(msg.header("action"), Some("update"));
        assert_eq!(msg.header("missing"), None);
    }

    #[tokio::test]
    async fn test_channel_feed_delivers_then_closes() {
        let (tx, mut feed) = ChannelFeed::channel(4);
        tx.send(FeedMessage::change("user", "u-1", "delete"))
            .await
            .unwrap();
        drop(tx);

        let first = feed.recv().await.unwrap();
        let second = feed.recv().await.unwrap();

        assert_eq!(first.unwrap().header("id"), Some("u-1"));
        assert!(second.is_none());
    }
}
