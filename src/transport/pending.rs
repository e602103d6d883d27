//! Correlation table for in-flight signing operations.
//!
//! Each operation registers a fresh id and waits on a oneshot channel. The
//! dispatcher resolves the channel at most once: `DashMap::remove` is the
//! atomic claim, so a late duplicate outcome finds no waiter and is dropped.

use dashmap::DashMap;
use tokio::sync::oneshot;
use uuid::Uuid;

use crate::transport::message::WalletMessage;

/// In-flight operations keyed by correlation id.
#[derive(Debug, Default)]
pub struct PendingOperations {
    waiters: DashMap<Uuid, oneshot::Sender<WalletMessage>>,
}

impl PendingOperations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new operation, returning its id and the outcome receiver.
    pub fn register(&self) -> (Uuid, oneshot::Receiver<WalletMessage>) {
        let id = Uuid::new_v4();
        let (tx, rx) = oneshot::channel();
        self.waiters.insert(id, tx);
        (id, rx)
    }

    /// Resolve one operation with a terminal outcome.
    ///
    /// Returns false if the id is unknown or already resolved.
    pub fn resolve(&self, id: Uuid, message: WalletMessage) -> bool {
        match self.waiters.remove(&id) {
            Some((_, tx)) => tx.send(message).is_ok(),
            None => false,
        }
    }

    /// Drop the waiter for an abandoned operation. The receiver observes a
    /// closed channel.
    pub fn cancel(&self, id: Uuid) {
        self.waiters.remove(&id);
    }

    /// Whether an operation is still waiting.
    pub fn contains(&self, id: Uuid) -> bool {
        self.waiters.contains_key(&id)
    }
}
