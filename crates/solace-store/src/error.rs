use solace_types::DocPath;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    /// A create-if-absent write found a document already at its key.
    /// Terminal: never retried.
    #[error("document already exists at {0}")]
    AlreadyExists(DocPath),

    /// The transaction kept losing against concurrent commits and gave up.
    #[error("transaction gave up after {attempts} conflicting attempts")]
    Contention { attempts: u32 },

    #[error("store lock poisoned")]
    LockPoisoned,

    #[error(transparent)]
    Storage(#[from] rusqlite::Error),

    #[error(transparent)]
    Codec(#[from] serde_json::Error),
}
