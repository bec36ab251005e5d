use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::error;
use uuid::Uuid;

use solace_engage::chat;
use solace_types::api::{Claims, OpenChatRequest, SendChatMessageRequest};

use crate::engage_status;
use crate::state::AppState;

fn join_error(e: tokio::task::JoinError) -> StatusCode {
    error!("spawn_blocking join error: {e}");
    StatusCode::INTERNAL_SERVER_ERROR
}

pub async fn open_chat(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<OpenChatRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    let store = state.store.clone();
    let opened = tokio::task::spawn_blocking(move || {
        chat::open_chat(&store, claims.sub, req.participant)
    })
    .await
    .map_err(join_error)?
    .map_err(engage_status)?;

    Ok((StatusCode::CREATED, Json(opened)))
}

pub async fn send_message(
    State(state): State<AppState>,
    Path(chat_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<SendChatMessageRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    let store = state.store.clone();
    let message = tokio::task::spawn_blocking(move || {
        chat::send_message(&store, chat_id, claims.sub, &req.text)
    })
    .await
    .map_err(join_error)?
    .map_err(engage_status)?;

    Ok((StatusCode::CREATED, Json(message)))
}

pub async fn list_messages(
    State(state): State<AppState>,
    Path(chat_id): Path<Uuid>,
    Extension(_claims): Extension<Claims>,
) -> Result<impl IntoResponse, StatusCode> {
    let store = state.store.clone();
    let messages = tokio::task::spawn_blocking(move || chat::list_messages(&store, chat_id))
        .await
        .map_err(join_error)?
        .map_err(engage_status)?;

    Ok(Json(messages))
}

pub async fn mark_read(
    State(state): State<AppState>,
    Path((chat_id, message_id)): Path<(Uuid, Uuid)>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, StatusCode> {
    let store = state.store.clone();
    tokio::task::spawn_blocking(move || chat::mark_read(&store, chat_id, message_id, claims.sub))
        .await
        .map_err(join_error)?
        .map_err(engage_status)?;

    Ok(StatusCode::NO_CONTENT)
}
