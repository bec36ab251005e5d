use chrono::{DateTime, Utc};
use tracing::{debug, warn};
use uuid::Uuid;

use solace_store::{Store, StoreError};
use solace_types::models::{Profile, ScannedSession, Session, SessionStatus};
use solace_types::paths;

/// Name used when the submitter's profile cannot be resolved.
pub const UNKNOWN_CLIENT: &str = "Unknown client";

/// Client intake: persists the raw scan event. The session derivation
/// happens server-side when the trigger engine observes this creation.
pub fn submit_scan(
    store: &Store,
    user_id: Uuid,
    therapy: &str,
    scanned_at: DateTime<Utc>,
) -> Result<ScannedSession, StoreError> {
    let scanned = ScannedSession {
        id: Uuid::new_v4(),
        user_id,
        therapy: therapy.to_string(),
        scanned_at,
    };

    store.run(|tx| {
        tx.create(&paths::scanned_session(scanned.id), &scanned)?;
        Ok::<_, StoreError>(())
    })?;

    Ok(scanned)
}

#[derive(Debug)]
pub enum Derivation {
    Created(Session),
    /// A Session keyed by this scan already exists — an earlier delivery
    /// of the same event got here first.
    AlreadyDerived,
}

/// Derives the Session record for one scan event. Keyed by the scan id,
/// so processing the same event again is detected and skipped. Profile
/// resolution is best-effort: a miss or a lookup failure falls back to
/// the placeholder name and the Session is created anyway.
pub fn derive_session(store: &Store, scanned: &ScannedSession) -> Result<Derivation, StoreError> {
    let client_name = match store.get::<Profile>(&paths::profile(scanned.user_id)) {
        Ok(Some(profile)) => profile.display_name,
        Ok(None) => {
            debug!(user = %scanned.user_id, "no profile for scan submitter, using placeholder");
            UNKNOWN_CLIENT.to_string()
        }
        Err(e) => {
            warn!(user = %scanned.user_id, "profile lookup failed, using placeholder: {e}");
            UNKNOWN_CLIENT.to_string()
        }
    };

    let session = Session {
        id: scanned.id,
        client_name,
        therapy: scanned.therapy.clone(),
        date: scanned.scanned_at.format("%Y-%m-%d").to_string(),
        time: scanned.scanned_at.format("%H:%M").to_string(),
        status: SessionStatus::Planned,
        scanned_session_id: scanned.id,
    };

    let result = store.run(|tx| {
        tx.create(&paths::session(session.id), &session)?;
        Ok::<_, StoreError>(())
    });

    match result {
        Ok(()) => Ok(Derivation::Created(session)),
        Err(StoreError::AlreadyExists(_)) => Ok(Derivation::AlreadyDerived),
        Err(e) => Err(e),
    }
}

/// Admin console listing.
pub fn list_sessions(store: &Store) -> Result<Vec<Session>, StoreError> {
    Ok(store
        .list::<Session>(paths::SESSIONS)?
        .into_iter()
        .map(|(_, session)| session)
        .collect())
}
