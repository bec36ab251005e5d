use chrono::Utc;
use tracing::{error, warn};
use uuid::Uuid;

use solace_store::{Store, StoreError};
use solace_types::models::DeadLetter;
use solace_types::paths;

/// Records a swallowed best-effort failure so it stays observable. The
/// sink itself is best-effort too: a failed write only reaches the log.
pub fn record(store: &Store, stage: &str, subject: &str, reason: &str) {
    warn!(stage, subject, reason, "best-effort step failed");

    let letter = DeadLetter {
        id: Uuid::new_v4(),
        stage: stage.to_string(),
        subject: subject.to_string(),
        reason: reason.to_string(),
        at: Utc::now(),
    };

    let result = store.run(|tx| {
        tx.create(&paths::dead_letter(letter.id), &letter)?;
        Ok::<_, StoreError>(())
    });
    if let Err(e) = result {
        error!("dead letter write failed: {e}");
    }
}
