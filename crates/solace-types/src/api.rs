use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::ModerationState;

// -- Identity --

/// Verified identity claims attached to every request. Issued by the
/// out-of-scope identity service; the moderator flag is that service's
/// privilege-lookup answer baked into the signed token. Canonical
/// definition lives here so API middleware and consumers share one type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub name: String,
    #[serde(default)]
    pub moderator: bool,
    pub exp: usize,
}

// -- Feed --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreatePostRequest {
    pub text: String,
    pub media_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ToggleLikeResponse {
    pub liked: bool,
    pub like_count: i64,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AddCommentRequest {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct CommentResponse {
    pub id: Uuid,
    pub post_id: Uuid,
    pub author_id: Uuid,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub moderation: ModerationState,
}

#[derive(Debug, Serialize)]
pub struct RemoveCommentResponse {
    pub tombstoned: bool,
    pub comment_count: i64,
}

// -- Booking --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BookSlotRequest {
    pub resource: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
}

#[derive(Debug, Serialize)]
pub struct BookSlotResponse {
    pub resource: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct BookedTimesQuery {
    pub resource: String,
    pub date: NaiveDate,
}

// -- Chat --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OpenChatRequest {
    pub participant: Uuid,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SendChatMessageRequest {
    pub text: String,
}

// -- Sessions --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SubmitScanRequest {
    pub therapy: String,
    pub scanned_at: DateTime<Utc>,
}
