//! Live feed — broadcast of the full content list after each change.
//!
//! Subscribers receive whole snapshots and replace their view; nothing is
//! diffed. A subscriber that falls behind the channel buffer sees `Lagged`
//! and simply waits for the next snapshot, which supersedes what it missed.
//!
//! Reload and send happen under one lock, so snapshots leave in the order
//! they were read.

use std::sync::Arc;

use tokio::sync::{Mutex, broadcast};
use tracing::{info, warn};

use super::content::{ContentError, ContentRecord, ContentStore};

const DEFAULT_FEED_CAPACITY: usize = 16;

pub type Snapshot = Arc<Vec<ContentRecord>>;

#[derive(Clone)]
pub struct ContentFeed {
    tx: broadcast::Sender<Snapshot>,
    publish_lock: Arc<Mutex<()>>,
}

impl ContentFeed {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx, publish_lock: Arc::new(Mutex::new(())) }
    }

    #[must_use]
    pub fn from_env() -> Self {
        Self::new(crate::env_parse("FEED_CAPACITY", DEFAULT_FEED_CAPACITY))
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Snapshot> {
        self.tx.subscribe()
    }

    /// Reload the list from `store` and push it to every subscriber.
    ///
    /// # Errors
    ///
    /// Returns an error if the list cannot be loaded. Nothing is sent then.
    pub async fn publish(&self, store: &dyn ContentStore) -> Result<Snapshot, ContentError> {
        let _ordered = self.publish_lock.lock().await;
        let snapshot: Snapshot = Arc::new(store.list().await?);
        // No receivers is not an error.
        let receivers = self.tx.send(Arc::clone(&snapshot)).unwrap_or(0);
        info!(items = snapshot.len(), receivers, "feed: snapshot published");
        Ok(snapshot)
    }

    /// Publish after a committed mutation. A reload failure is logged only;
    /// the mutation itself already succeeded.
    pub async fn publish_after_commit(&self, store: &dyn ContentStore) {
        if let Err(e) = self.publish(store).await {
            warn!(error = %e, "feed: snapshot reload failed");
        }
    }
}

impl Default for ContentFeed {
    fn default() -> Self {
        Self::new(DEFAULT_FEED_CAPACITY)
    }
}

#[cfg(test)]
#[path = "feed_test.rs"]
mod tests;
