//! Subscription and deferred-notification registry.

use dashmap::DashMap;
use quilldb_commons::{LiveQueryId, SessionId};
use serde_json::Value;
use tokio::sync::mpsc;

use crate::notification::{Action, Notification};

const NOTIFY_QUEUE_CAPACITY: usize = 256;

/// One registered live-query subscription.
struct SubscriptionHandle {
    session: SessionId,
    table: String,
    notification_tx: mpsc::Sender<Notification>,
}

/// A change recorded by a writer, not yet visible to subscribers.
#[derive(Debug, Clone)]
pub struct DeferredChange {
    pub table: String,
    pub action: Action,
    pub result: Value,
}

/// Registry of live-query subscriptions and per-session deferred changes.
///
/// Subscriptions use DashMap internally for lock-free concurrent access,
/// so the registry is shared as a plain `Arc` without an outer lock.
#[derive(Default)]
pub struct LiveRegistry {
    subscriptions: DashMap<LiveQueryId, SubscriptionHandle>,
    deferred: DashMap<SessionId, Vec<DeferredChange>>,
    /// Streams registered by a `LIVE` statement, parked until the protocol
    /// layer claims them with [`take_stream`](Self::take_stream).
    pending_streams: DashMap<LiveQueryId, mpsc::Receiver<Notification>>,
}

impl LiveRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a subscription on `table` for `session`. Returns the
    /// live-query id (the handle for `KILL`) and the notification stream.
    pub fn subscribe(
        &self,
        session: &SessionId,
        table: &str,
    ) -> (LiveQueryId, mpsc::Receiver<Notification>) {
        let id = LiveQueryId::generate();
        let (notification_tx, notification_rx) = mpsc::channel(NOTIFY_QUEUE_CAPACITY);
        self.subscriptions.insert(
            id.clone(),
            SubscriptionHandle {
                session: session.clone(),
                table: table.to_string(),
                notification_tx,
            },
        );
        (id, notification_rx)
    }

    /// Register a subscription whose stream is held by the registry until
    /// the protocol layer claims it. Notifications buffer in the channel in
    /// the meantime.
    pub fn register(&self, session: &SessionId, table: &str) -> LiveQueryId {
        let (id, rx) = self.subscribe(session, table);
        self.pending_streams.insert(id.clone(), rx);
        id
    }

    /// Claim the notification stream parked by [`register`](Self::register).
    pub fn take_stream(&self, id: &LiveQueryId) -> Option<mpsc::Receiver<Notification>> {
        self.pending_streams.remove(id).map(|(_, rx)| rx)
    }

    /// Remove a subscription. Returns `false` if the id is unknown.
    pub fn kill(&self, id: &LiveQueryId) -> bool {
        self.pending_streams.remove(id);
        self.subscriptions.remove(id).is_some()
    }

    /// Remove every subscription owned by `session`.
    pub fn kill_session(&self, session: &SessionId) {
        self.subscriptions.retain(|id, handle| {
            if handle.session == *session {
                self.pending_streams.remove(id);
                false
            } else {
                true
            }
        });
    }

    /// Record a change under the writing session. Nothing is delivered
    /// until [`flush`](Self::flush) runs for that session.
    pub fn defer(&self, session: &SessionId, change: DeferredChange) {
        self.deferred.entry(session.clone()).or_default().push(change);
    }

    /// Publish every deferred change for `session` to matching
    /// subscriptions. Idempotent: a second flush finds nothing to publish.
    pub fn flush(&self, session: &SessionId) {
        let Some((_, changes)) = self.deferred.remove(session) else {
            return;
        };
        for change in changes {
            for entry in self.subscriptions.iter() {
                let handle = entry.value();
                if handle.table != change.table {
                    continue;
                }
                let notification = Notification {
                    id: entry.key().clone(),
                    action: change.action,
                    result: change.result.clone(),
                };
                if let Err(e) = handle.notification_tx.try_send(notification) {
                    use tokio::sync::mpsc::error::TrySendError;
                    match e {
                        TrySendError::Full(_) => {
                            log::warn!(
                                "Notification channel full for live_id={}, dropping notification",
                                entry.key()
                            );
                        }
                        TrySendError::Closed(_) => {
                            log::debug!(
                                "Notification channel closed for live_id={}, subscriber gone",
                                entry.key()
                            );
                        }
                    }
                }
            }
        }
    }

    /// Discard every deferred change for `session`. Idempotent.
    pub fn clear(&self, session: &SessionId) {
        self.deferred.remove(session);
    }

    /// Number of deferred changes currently held for `session`.
    pub fn pending(&self, session: &SessionId) -> usize {
        self.deferred.get(session).map(|v| v.len()).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn change(table: &str) -> DeferredChange {
        DeferredChange {
            table: table.to_string(),
            action: Action::Create,
            result: json!({"id": "person:one"}),
        }
    }

    #[tokio::test]
    async fn flush_delivers_to_matching_table() {
        let registry = LiveRegistry::new();
        let session = SessionId::generate();

        let (live_id, mut rx) = registry.subscribe(&session, "person");
        registry.defer(&session, change("person"));
        registry.defer(&session, change("animal"));
        registry.flush(&session);

        let n = rx.recv().await.unwrap();
        assert_eq!(n.id, live_id);
        assert_eq!(n.action, Action::Create);
        // The animal change had no subscriber; nothing else arrives.
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn clear_discards_without_delivery() {
        let registry = LiveRegistry::new();
        let session = SessionId::generate();

        let (_, mut rx) = registry.subscribe(&session, "person");
        registry.defer(&session, change("person"));
        registry.clear(&session);
        registry.flush(&session);

        assert!(rx.try_recv().is_err());
        assert_eq!(registry.pending(&session), 0);
    }

    #[tokio::test]
    async fn flush_is_idempotent() {
        let registry = LiveRegistry::new();
        let session = SessionId::generate();

        let (_, mut rx) = registry.subscribe(&session, "person");
        registry.defer(&session, change("person"));
        registry.flush(&session);
        registry.flush(&session);

        assert!(rx.recv().await.is_some());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn killed_subscription_receives_nothing() {
        let registry = LiveRegistry::new();
        let session = SessionId::generate();

        let (live_id, mut rx) = registry.subscribe(&session, "person");
        assert!(registry.kill(&live_id));
        assert!(!registry.kill(&live_id));

        registry.defer(&session, change("person"));
        registry.flush(&session);
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn registered_stream_buffers_until_claimed() {
        let registry = LiveRegistry::new();
        let session = SessionId::generate();

        let live_id = registry.register(&session, "person");
        registry.defer(&session, change("person"));
        registry.flush(&session);

        let mut rx = registry.take_stream(&live_id).unwrap();
        assert!(rx.try_recv().is_ok());
        // The stream can only be claimed once.
        assert!(registry.take_stream(&live_id).is_none());
    }

    #[tokio::test]
    async fn kill_session_removes_all_subscriptions() {
        let registry = LiveRegistry::new();
        let session = SessionId::generate();
        let other = SessionId::generate();

        let (_, mut rx_a) = registry.subscribe(&session, "person");
        let (_, mut rx_b) = registry.subscribe(&other, "person");
        registry.kill_session(&session);

        registry.defer(&other, change("person"));
        registry.flush(&other);

        assert!(rx_a.recv().await.is_none());
        assert!(rx_b.recv().await.is_some());
    }
}
