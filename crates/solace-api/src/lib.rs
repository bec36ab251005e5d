pub mod booking;
pub mod chat;
pub mod feed;
pub mod middleware;
pub mod sessions;
pub mod state;

use axum::http::StatusCode;
use tracing::error;

use solace_booking::BookingError;
use solace_engage::EngageError;
use solace_store::StoreError;
use solace_types::api::Claims;

use solace_engage::Actor;

pub(crate) fn actor(claims: &Claims) -> Actor {
    Actor {
        user_id: claims.sub,
        moderator: claims.moderator,
    }
}

/// Permission and not-found errors are one-shot; contention means the
/// store gave up after its bounded retries and the client should try
/// again later.
pub(crate) fn engage_status(e: EngageError) -> StatusCode {
    match e {
        EngageError::NotFound => StatusCode::NOT_FOUND,
        EngageError::PermissionDenied => StatusCode::FORBIDDEN,
        EngageError::Store(e) => store_status(e),
    }
}

/// Slot conflicts are the caller's cue to re-query and pick another time.
pub(crate) fn booking_status(e: BookingError) -> StatusCode {
    match e {
        BookingError::SlotTaken => StatusCode::CONFLICT,
        BookingError::Store(e) => store_status(e),
    }
}

pub(crate) fn store_status(e: StoreError) -> StatusCode {
    match e {
        StoreError::Contention { .. } => StatusCode::SERVICE_UNAVAILABLE,
        e => {
            error!("store error: {e}");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}
