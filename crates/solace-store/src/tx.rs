use std::collections::{BTreeMap, HashMap};

use rusqlite::{OptionalExtension, TransactionBehavior, params};
use serde::Serialize;
use serde::de::DeserializeOwned;

use solace_types::DocPath;
use solace_types::events::{ChangeBatch, ChangeKind, DocChange};

use crate::{Store, StoreError};

enum StagedWrite {
    Put(serde_json::Value),
    Create(serde_json::Value),
    Delete,
}

pub(crate) enum CommitOutcome {
    Committed(Vec<ChangeBatch>),
    Conflict,
}

/// One optimistic transaction. Reads record the committed version they
/// observed (0 for an absent document), writes are buffered, and commit
/// re-validates every recorded version inside a single SQLite transaction
/// before applying anything. A mismatch means a concurrent commit touched
/// a document this transaction depends on; the whole closure re-runs.
pub struct Tx<'s> {
    store: &'s Store,
    reads: HashMap<DocPath, i64>,
    writes: Vec<(DocPath, StagedWrite)>,
}

impl<'s> Tx<'s> {
    pub(crate) fn new(store: &'s Store) -> Self {
        Self {
            store,
            reads: HashMap::new(),
            writes: Vec::new(),
        }
    }

    /// Read a document. Writes already staged in this transaction are
    /// visible (read-your-writes); otherwise the committed state is read
    /// and its version recorded for commit-time validation.
    pub fn get<T: DeserializeOwned>(&mut self, path: &DocPath) -> Result<Option<T>, StoreError> {
        if let Some((_, write)) = self.writes.iter().rev().find(|(p, _)| p == path) {
            return match write {
                StagedWrite::Put(body) | StagedWrite::Create(body) => {
                    Ok(Some(serde_json::from_value(body.clone())?))
                }
                StagedWrite::Delete => Ok(None),
            };
        }

        let raw = self.store.read_raw(path)?;
        let version = raw.as_ref().map(|(v, _)| *v).unwrap_or(0);
        self.reads.entry(path.clone()).or_insert(version);

        match raw {
            Some((_, body)) => Ok(Some(serde_json::from_str(&body)?)),
            None => Ok(None),
        }
    }

    /// Stage an unconditional write.
    pub fn set<T: Serialize>(&mut self, path: &DocPath, doc: &T) -> Result<(), StoreError> {
        self.writes
            .push((path.clone(), StagedWrite::Put(serde_json::to_value(doc)?)));
        Ok(())
    }

    /// Stage a create-if-absent write. The commit fails the whole
    /// transaction with `AlreadyExists` if the document exists at commit
    /// time — this is the exclusive-allocation primitive.
    pub fn create<T: Serialize>(&mut self, path: &DocPath, doc: &T) -> Result<(), StoreError> {
        self.writes
            .push((path.clone(), StagedWrite::Create(serde_json::to_value(doc)?)));
        Ok(())
    }

    pub fn delete(&mut self, path: &DocPath) {
        self.writes.push((path.clone(), StagedWrite::Delete));
    }

    pub(crate) fn commit(self) -> Result<CommitOutcome, StoreError> {
        let mut conn = self.store.lock_conn()?;
        let sq = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        for (path, expected) in &self.reads {
            let current: i64 = sq
                .query_row(
                    "SELECT version FROM documents WHERE collection = ?1 AND id = ?2",
                    params![path.collection, path.id],
                    |row| row.get(0),
                )
                .optional()?
                .unwrap_or(0);
            if current != *expected {
                return Ok(CommitOutcome::Conflict);
            }
        }

        let mut touched: BTreeMap<String, Vec<DocChange>> = BTreeMap::new();
        for (path, write) in &self.writes {
            let current: Option<i64> = sq
                .query_row(
                    "SELECT version FROM documents WHERE collection = ?1 AND id = ?2",
                    params![path.collection, path.id],
                    |row| row.get(0),
                )
                .optional()?;

            match write {
                StagedWrite::Create(body) => {
                    if current.is_some() {
                        return Err(StoreError::AlreadyExists(path.clone()));
                    }
                    sq.execute(
                        "INSERT INTO documents (collection, id, body, version) VALUES (?1, ?2, ?3, 1)",
                        params![path.collection, path.id, body.to_string()],
                    )?;
                    touched.entry(path.collection.clone()).or_default().push(DocChange {
                        id: path.id.clone(),
                        kind: ChangeKind::Created,
                        body: Some(body.clone()),
                        version: 1,
                    });
                }
                StagedWrite::Put(body) => {
                    let next = current.unwrap_or(0) + 1;
                    sq.execute(
                        "INSERT INTO documents (collection, id, body, version) VALUES (?1, ?2, ?3, ?4)
                         ON CONFLICT(collection, id) DO UPDATE SET
                             body = excluded.body,
                             version = excluded.version,
                             updated_at = datetime('now')",
                        params![path.collection, path.id, body.to_string(), next],
                    )?;
                    touched.entry(path.collection.clone()).or_default().push(DocChange {
                        id: path.id.clone(),
                        kind: if current.is_some() {
                            ChangeKind::Updated
                        } else {
                            ChangeKind::Created
                        },
                        body: Some(body.clone()),
                        version: next,
                    });
                }
                StagedWrite::Delete => {
                    let removed = sq.execute(
                        "DELETE FROM documents WHERE collection = ?1 AND id = ?2",
                        params![path.collection, path.id],
                    )?;
                    if removed > 0 {
                        touched.entry(path.collection.clone()).or_default().push(DocChange {
                            id: path.id.clone(),
                            kind: ChangeKind::Deleted,
                            body: None,
                            version: current.unwrap_or(0),
                        });
                    }
                }
            }
        }

        sq.commit()?;

        let batches = touched
            .into_iter()
            .map(|(collection, mut changes)| {
                changes.sort_by(|a, b| a.id.cmp(&b.id));
                ChangeBatch { collection, changes }
            })
            .collect();
        Ok(CommitOutcome::Committed(batches))
    }
}
