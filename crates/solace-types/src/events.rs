use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;
use tracing::warn;

/// Change notifications published on the snapshot channel.
///
/// One `ChangeBatch` per commit per touched collection, changes ordered by
/// document id. Delivery is per-query ordered but lossy under receiver lag:
/// consumers must key updates by document identity rather than arrival
/// order, and tolerate observing the same logical state twice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeBatch {
    pub collection: String,
    pub changes: Vec<DocChange>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocChange {
    pub id: String,
    pub kind: ChangeKind,
    /// Committed body for creates/updates; `None` for deletes.
    pub body: Option<serde_json::Value>,
    pub version: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeKind {
    Created,
    Updated,
    Deleted,
}

impl DocChange {
    /// Decodes the carried body into a typed document. Logs and returns
    /// `None` on schema mismatch so one malformed document cannot wedge a
    /// consumer loop.
    pub fn decode<T: DeserializeOwned>(&self) -> Option<T> {
        let body = self.body.as_ref()?;
        match serde_json::from_value(body.clone()) {
            Ok(doc) => Some(doc),
            Err(e) => {
                warn!("Undecodable document {}: {}", self.id, e);
                None
            }
        }
    }
}
