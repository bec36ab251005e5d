use std::collections::HashMap;
use std::sync::RwLock;

use tokio::sync::broadcast;

use solace_types::events::ChangeBatch;

const CHANNEL_CAPACITY: usize = 1024;

/// Fan-out hub for committed change batches: one broadcast channel per
/// subscribed collection plus a firehose channel carrying everything.
/// Batches are published only after their commit succeeds. A receiver that
/// falls behind observes `Lagged` and must re-read the collections it
/// mirrors.
pub struct WatchHub {
    all: broadcast::Sender<ChangeBatch>,
    by_collection: RwLock<HashMap<String, broadcast::Sender<ChangeBatch>>>,
}

impl WatchHub {
    pub(crate) fn new() -> Self {
        let (all, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            all,
            by_collection: RwLock::new(HashMap::new()),
        }
    }

    /// Subscribe to one collection's change batches. Cancelling is just
    /// dropping the receiver.
    pub fn subscribe(&self, collection: &str) -> broadcast::Receiver<ChangeBatch> {
        let mut map = self.by_collection.write().unwrap_or_else(|e| e.into_inner());
        map.entry(collection.to_string())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .subscribe()
    }

    /// Subscribe to every collection at once. Used by reactive consumers
    /// that match on collection paths, e.g. subcollection patterns like
    /// `chats/{chat}/messages`.
    pub fn subscribe_all(&self) -> broadcast::Receiver<ChangeBatch> {
        self.all.subscribe()
    }

    pub(crate) fn publish(&self, batches: Vec<ChangeBatch>) {
        let map = self.by_collection.read().unwrap_or_else(|e| e.into_inner());
        for batch in batches {
            if let Some(tx) = map.get(&batch.collection) {
                let _ = tx.send(batch.clone());
            }
            let _ = self.all.send(batch);
        }
    }
}
