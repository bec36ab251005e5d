use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::error;
use uuid::Uuid;

use solace_engage::{RemovalKind, comments, likes, posts};
use solace_types::api::{
    AddCommentRequest, Claims, CommentResponse, CreatePostRequest, RemoveCommentResponse,
    ToggleLikeResponse,
};
use solace_types::models::Comment;

use crate::state::AppState;
use crate::{actor, engage_status};

fn join_error(e: tokio::task::JoinError) -> StatusCode {
    error!("spawn_blocking join error: {e}");
    StatusCode::INTERNAL_SERVER_ERROR
}

fn comment_response(comment: Comment) -> CommentResponse {
    CommentResponse {
        id: comment.id,
        post_id: comment.post_id,
        author_id: comment.author_id,
        text: comment.text,
        created_at: comment.created_at,
        moderation: comment.moderation,
    }
}

pub async fn create_post(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreatePostRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    let store = state.store.clone();
    let post = tokio::task::spawn_blocking(move || {
        posts::create_post(&store, claims.sub, req.text, req.media_url)
    })
    .await
    .map_err(join_error)?
    .map_err(engage_status)?;

    Ok((StatusCode::CREATED, Json(post)))
}

pub async fn list_posts(
    State(state): State<AppState>,
    Extension(_claims): Extension<Claims>,
) -> Result<impl IntoResponse, StatusCode> {
    let store = state.store.clone();
    let posts = tokio::task::spawn_blocking(move || posts::list_posts(&store))
        .await
        .map_err(join_error)?
        .map_err(engage_status)?;

    Ok(Json(posts))
}

pub async fn delete_post(
    State(state): State<AppState>,
    Path(post_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, StatusCode> {
    let store = state.store.clone();
    tokio::task::spawn_blocking(move || posts::delete_post(&store, &actor(&claims), post_id))
        .await
        .map_err(join_error)?
        .map_err(engage_status)?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn toggle_like(
    State(state): State<AppState>,
    Path(post_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, StatusCode> {
    let store = state.store.clone();
    let toggle = tokio::task::spawn_blocking(move || likes::toggle_like(&store, post_id, claims.sub))
        .await
        .map_err(join_error)?
        .map_err(engage_status)?;

    Ok(Json(ToggleLikeResponse {
        liked: toggle.liked,
        like_count: toggle.like_count,
    }))
}

pub async fn add_comment(
    State(state): State<AppState>,
    Path(post_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<AddCommentRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    let store = state.store.clone();
    let comment = tokio::task::spawn_blocking(move || {
        comments::add_comment(&store, post_id, claims.sub, &req.text)
    })
    .await
    .map_err(join_error)?
    .map_err(engage_status)?;

    Ok((StatusCode::CREATED, Json(comment_response(comment))))
}

pub async fn list_comments(
    State(state): State<AppState>,
    Path(post_id): Path<Uuid>,
    Extension(_claims): Extension<Claims>,
) -> Result<impl IntoResponse, StatusCode> {
    let store = state.store.clone();
    let comments = tokio::task::spawn_blocking(move || comments::list_comments(&store, post_id))
        .await
        .map_err(join_error)?
        .map_err(engage_status)?;

    let responses: Vec<CommentResponse> = comments.into_iter().map(comment_response).collect();
    Ok(Json(responses))
}

#[derive(Debug, Deserialize)]
pub struct RemoveCommentQuery {
    /// Moderator admin override: hard-delete instead of the role default.
    #[serde(default)]
    pub hard: bool,
}

pub async fn remove_comment(
    State(state): State<AppState>,
    Path((post_id, comment_id)): Path<(Uuid, Uuid)>,
    Query(query): Query<RemoveCommentQuery>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, StatusCode> {
    let requested = query.hard.then_some(RemovalKind::Hard);

    let store = state.store.clone();
    let removal = tokio::task::spawn_blocking(move || {
        comments::remove_comment(&store, &actor(&claims), post_id, comment_id, requested)
    })
    .await
    .map_err(join_error)?
    .map_err(engage_status)?;

    Ok(Json(RemoveCommentResponse {
        tombstoned: removal.kind == RemovalKind::Tombstone,
        comment_count: removal.comment_count,
    }))
}
