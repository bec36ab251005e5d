use solace_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngageError {
    /// Target vanished between the caller's view and the transactional
    /// re-check. Surfaced as "content no longer available", never retried.
    #[error("content no longer available")]
    NotFound,

    #[error("not allowed")]
    PermissionDenied,

    #[error(transparent)]
    Store(#[from] StoreError),
}
