use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use tracing::error;

use solace_types::api::{Claims, SubmitScanRequest};

use crate::state::AppState;
use crate::store_status;

fn join_error(e: tokio::task::JoinError) -> StatusCode {
    error!("spawn_blocking join error: {e}");
    StatusCode::INTERNAL_SERVER_ERROR
}

/// Persists the raw scan; the trigger engine derives the Session
/// asynchronously.
pub async fn submit_scan(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<SubmitScanRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    let store = state.store.clone();
    let scanned = tokio::task::spawn_blocking(move || {
        solace_triggers::submit_scan(&store, claims.sub, &req.therapy, req.scanned_at)
    })
    .await
    .map_err(join_error)?
    .map_err(store_status)?;

    Ok((StatusCode::ACCEPTED, Json(scanned)))
}

/// Admin console listing; staff only.
pub async fn list_sessions(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, StatusCode> {
    if !claims.moderator {
        return Err(StatusCode::FORBIDDEN);
    }

    let store = state.store.clone();
    let sessions = tokio::task::spawn_blocking(move || solace_triggers::list_sessions(&store))
        .await
        .map_err(join_error)?
        .map_err(store_status)?;

    Ok(Json(sessions))
}
