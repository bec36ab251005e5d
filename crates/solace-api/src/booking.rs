use axum::{
    Extension, Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::error;

use solace_types::api::{BookSlotRequest, BookSlotResponse, BookedTimesQuery, Claims};
use solace_types::models::SlotKey;

use crate::booking_status;
use crate::state::AppState;

pub async fn book_slot(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<BookSlotRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    let slot = SlotKey::new(req.resource, req.date, req.time);

    let store = state.store.clone();
    let booking = tokio::task::spawn_blocking(move || {
        solace_booking::book_slot(&store, slot, claims.sub)
    })
    .await
    .map_err(|e| {
        error!("spawn_blocking join error: {e}");
        StatusCode::INTERNAL_SERVER_ERROR
    })?
    .map_err(booking_status)?;

    Ok((
        StatusCode::CREATED,
        Json(BookSlotResponse {
            resource: booking.resource,
            date: booking.date,
            time: booking.time,
            created_at: booking.created_at,
        }),
    ))
}

pub async fn booked_times(
    State(state): State<AppState>,
    Query(query): Query<BookedTimesQuery>,
    Extension(_claims): Extension<Claims>,
) -> Result<impl IntoResponse, StatusCode> {
    let store = state.store.clone();
    let times = tokio::task::spawn_blocking(move || {
        solace_booking::booked_times(&store, &query.resource, query.date)
    })
    .await
    .map_err(|e| {
        error!("spawn_blocking join error: {e}");
        StatusCode::INTERNAL_SERVER_ERROR
    })?
    .map_err(booking_status)?;

    Ok(Json(times))
}
