pub mod error;
pub mod migrations;
pub mod tx;
pub mod watch;

pub use error::StoreError;
pub use tx::Tx;

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::{Connection, OptionalExtension, params};
use serde::de::DeserializeOwned;
use tokio::sync::broadcast;
use tracing::{debug, info};

use solace_types::DocPath;
use solace_types::events::ChangeBatch;

use tx::CommitOutcome;
use watch::WatchHub;

/// Bounded automatic retry before an optimistic transaction surfaces
/// `Contention` to its caller.
pub const MAX_TX_ATTEMPTS: u32 = 5;

/// Shared document store: collection/id addressed documents over a single
/// SQLite connection, with optimistic multi-document transactions and a
/// snapshot channel publishing committed changes.
pub struct Store {
    conn: Mutex<Connection>,
    hub: WatchHub,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;

        // WAL mode for concurrent reads
        conn.pragma_update(None, "journal_mode", "WAL")?;

        migrations::run(&conn)?;

        info!("Document store opened at {}", path.display());
        Ok(Self {
            conn: Mutex::new(conn),
            hub: WatchHub::new(),
        })
    }

    /// File-less store for tests and tooling. WAL needs a file-backed
    /// database, so the pragma is skipped here.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        migrations::run(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            hub: WatchHub::new(),
        })
    }

    /// Run an optimistic transaction. The closure may run several times:
    /// each attempt reads fresh committed state, and the commit applies
    /// only if nothing the closure read has moved underneath it. After
    /// `MAX_TX_ATTEMPTS` conflicting attempts the call fails with
    /// `Contention`. Change batches are published to watchers only after
    /// the commit succeeds.
    pub fn run<T, E, F>(&self, mut f: F) -> Result<T, E>
    where
        E: From<StoreError>,
        F: FnMut(&mut Tx<'_>) -> Result<T, E>,
    {
        for attempt in 1..=MAX_TX_ATTEMPTS {
            let mut tx = Tx::new(self);
            let out = f(&mut tx)?;
            match tx.commit() {
                Ok(CommitOutcome::Committed(batches)) => {
                    self.hub.publish(batches);
                    return Ok(out);
                }
                Ok(CommitOutcome::Conflict) => {
                    if attempt == MAX_TX_ATTEMPTS {
                        return Err(StoreError::Contention { attempts: attempt }.into());
                    }
                    debug!(attempt, "transaction conflict, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        }
        unreachable!("transaction loop always returns")
    }

    /// One-shot committed read.
    pub fn get<T: DeserializeOwned>(&self, path: &DocPath) -> Result<Option<T>, StoreError> {
        match self.read_raw(path)? {
            Some((_, body)) => Ok(Some(serde_json::from_str(&body)?)),
            None => Ok(None),
        }
    }

    /// All documents of a collection, ordered by document id.
    pub fn list<T: DeserializeOwned>(&self, collection: &str) -> Result<Vec<(String, T)>, StoreError> {
        let conn = self.lock_conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, body FROM documents WHERE collection = ?1 ORDER BY id",
        )?;
        let rows = stmt
            .query_map(params![collection], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        drop(stmt);
        drop(conn);

        rows.into_iter()
            .map(|(id, body)| Ok((id, serde_json::from_str(&body)?)))
            .collect()
    }

    /// Documents of a collection whose id starts with `prefix`, ordered by
    /// document id. Used for composite-key day queries.
    pub fn list_prefix<T: DeserializeOwned>(
        &self,
        collection: &str,
        prefix: &str,
    ) -> Result<Vec<(String, T)>, StoreError> {
        let upper = format!("{prefix}\u{10FFFF}");
        let conn = self.lock_conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, body FROM documents
             WHERE collection = ?1 AND id >= ?2 AND id < ?3
             ORDER BY id",
        )?;
        let rows = stmt
            .query_map(params![collection, prefix, upper], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        drop(stmt);
        drop(conn);

        rows.into_iter()
            .map(|(id, body)| Ok((id, serde_json::from_str(&body)?)))
            .collect()
    }

    /// Subscribe to one collection's committed change batches.
    pub fn subscribe(&self, collection: &str) -> broadcast::Receiver<ChangeBatch> {
        self.hub.subscribe(collection)
    }

    /// Subscribe to every collection at once.
    pub fn subscribe_all(&self) -> broadcast::Receiver<ChangeBatch> {
        self.hub.subscribe_all()
    }

    pub(crate) fn read_raw(&self, path: &DocPath) -> Result<Option<(i64, String)>, StoreError> {
        let conn = self.lock_conn()?;
        let row = conn
            .query_row(
                "SELECT version, body FROM documents WHERE collection = ?1 AND id = ?2",
                params![path.collection, path.id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        Ok(row)
    }

    pub(crate) fn lock_conn(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::LockPoisoned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Barrier;
    use std::sync::atomic::{AtomicU32, Ordering};

    use serde::{Deserialize, Serialize};
    use solace_types::events::ChangeKind;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Counter {
        n: i64,
    }

    fn doc(id: &str) -> DocPath {
        DocPath::new("counters", id)
    }

    fn seed(store: &Store, id: &str, n: i64) {
        store
            .run(|tx| {
                tx.set(&doc(id), &Counter { n })?;
                Ok::<_, StoreError>(())
            })
            .unwrap();
    }

    #[test]
    fn set_then_get_roundtrip() {
        let store = Store::open_in_memory().unwrap();
        seed(&store, "a", 7);

        let got: Counter = store.get(&doc("a")).unwrap().unwrap();
        assert_eq!(got, Counter { n: 7 });
        assert!(store.get::<Counter>(&doc("missing")).unwrap().is_none());
    }

    #[test]
    fn reads_within_tx_see_staged_writes() {
        let store = Store::open_in_memory().unwrap();
        store
            .run(|tx| {
                tx.set(&doc("a"), &Counter { n: 1 })?;
                let seen: Counter = tx.get(&doc("a"))?.unwrap();
                assert_eq!(seen.n, 1);
                tx.delete(&doc("a"));
                assert!(tx.get::<Counter>(&doc("a"))?.is_none());
                Ok::<_, StoreError>(())
            })
            .unwrap();
        assert!(store.get::<Counter>(&doc("a")).unwrap().is_none());
    }

    #[test]
    fn create_rejects_existing_document() {
        let store = Store::open_in_memory().unwrap();
        seed(&store, "a", 1);

        let err = store
            .run(|tx| {
                tx.create(&doc("a"), &Counter { n: 2 })?;
                Ok::<_, StoreError>(())
            })
            .unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists(_)));

        // The losing create must not have clobbered anything.
        let got: Counter = store.get(&doc("a")).unwrap().unwrap();
        assert_eq!(got.n, 1);
    }

    #[test]
    fn conflicting_commit_reruns_closure_with_fresh_state() {
        let store = Store::open_in_memory().unwrap();
        seed(&store, "a", 0);

        let barrier = Barrier::new(2);
        let attempts = AtomicU32::new(0);

        std::thread::scope(|s| {
            s.spawn(|| {
                store
                    .run(|tx| {
                        let seen: Counter = tx.get(&doc("a"))?.unwrap();
                        if attempts.fetch_add(1, Ordering::SeqCst) == 0 {
                            // Let the other writer commit between our read
                            // and our commit.
                            barrier.wait();
                            barrier.wait();
                        }
                        tx.set(&doc("a"), &Counter { n: seen.n + 1 })?;
                        Ok::<_, StoreError>(())
                    })
                    .unwrap();
            });

            barrier.wait();
            seed(&store, "a", 10);
            barrier.wait();
        });

        // First attempt lost the race, second applied on fresh state.
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
        let got: Counter = store.get(&doc("a")).unwrap().unwrap();
        assert_eq!(got.n, 11);
    }

    #[test]
    fn list_prefix_scopes_and_orders() {
        let store = Store::open_in_memory().unwrap();
        for id in ["m/2026-08-06/10:00", "m/2026-08-06/09:00", "m/2026-08-07/09:00", "y/2026-08-06/09:00"] {
            store
                .run(|tx| {
                    tx.set(&DocPath::new("bookings", id), &Counter { n: 0 })?;
                    Ok::<_, StoreError>(())
                })
                .unwrap();
        }

        let day: Vec<(String, Counter)> = store.list_prefix("bookings", "m/2026-08-06/").unwrap();
        let ids: Vec<&str> = day.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, vec!["m/2026-08-06/09:00", "m/2026-08-06/10:00"]);
    }

    #[test]
    fn watchers_observe_committed_batches_only() {
        let store = Store::open_in_memory().unwrap();
        let mut rx = store.subscribe("counters");

        // A failed transaction publishes nothing.
        let _ = store.run(|tx| {
            tx.set(&doc("a"), &Counter { n: 1 })?;
            Err::<(), StoreError>(StoreError::LockPoisoned)
        });
        assert!(rx.try_recv().is_err());

        seed(&store, "a", 1);
        let batch = rx.try_recv().unwrap();
        assert_eq!(batch.collection, "counters");
        assert_eq!(batch.changes.len(), 1);
        assert_eq!(batch.changes[0].id, "a");
        assert_eq!(batch.changes[0].kind, ChangeKind::Created);

        seed(&store, "a", 2);
        let batch = rx.try_recv().unwrap();
        assert_eq!(batch.changes[0].kind, ChangeKind::Updated);
        assert_eq!(batch.changes[0].version, 2);
    }

    #[test]
    fn delete_of_absent_document_publishes_nothing() {
        let store = Store::open_in_memory().unwrap();
        let mut rx = store.subscribe("counters");

        store
            .run(|tx| {
                tx.delete(&doc("ghost"));
                Ok::<_, StoreError>(())
            })
            .unwrap();
        assert!(rx.try_recv().is_err());
    }
}
