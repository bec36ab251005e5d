use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Document schemas for every persisted entity. These map 1:1 to store
/// documents; a document that does not decode into its schema is rejected
/// at the store-client boundary before any transaction runs.

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub author_id: Uuid,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_url: Option<String>,
    /// Derived: must equal the number of documents in this post's likes
    /// subcollection at every committed state.
    pub like_count: i64,
    /// Derived: counts comments that are not hard-deleted. Tombstoned
    /// comments still count.
    pub comment_count: i64,
    pub created_at: DateTime<Utc>,
}

/// Existence of the document at `posts/{post}/likes/{user}` IS the liked
/// boolean; the body only records when.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Like {
    pub user_id: Uuid,
    pub liked_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModerationState {
    Active,
    Tombstoned,
}

/// Text shown in place of a tombstoned comment's content.
pub const TOMBSTONE_NOTICE: &str = "This comment has been removed by a moderator.";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub post_id: Uuid,
    pub author_id: Uuid,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub moderation: ModerationState,
}

/// The exclusive unit of bookable resource identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotKey {
    pub resource: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
}

impl SlotKey {
    pub fn new(resource: impl Into<String>, date: NaiveDate, time: NaiveTime) -> Self {
        Self { resource: resource.into(), date, time }
    }

    /// Deterministic composite document id: `{resource}/{date}/{time}`.
    /// Booking uniqueness lives in this key, not in caller-side checks.
    pub fn doc_id(&self) -> String {
        format!(
            "{}/{}/{}",
            self.resource,
            self.date.format("%Y-%m-%d"),
            self.time.format("%H:%M")
        )
    }

    /// Id prefix shared by every slot of one resource on one day.
    pub fn day_prefix(resource: &str, date: NaiveDate) -> String {
        format!("{}/{}/", resource, date.format("%Y-%m-%d"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub resource: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl Booking {
    pub fn slot(&self) -> SlotKey {
        SlotKey::new(self.resource.clone(), self.date, self.time)
    }
}

/// Raw client-submitted scan event; the trigger engine derives a Session
/// from it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannedSession {
    pub id: Uuid,
    pub user_id: Uuid,
    pub therapy: String,
    pub scanned_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionStatus {
    Planned,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    pub client_name: String,
    pub therapy: String,
    pub date: String,
    pub time: String,
    pub status: SessionStatus,
    /// Back-reference making repeated derivation detectable.
    pub scanned_session_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chat {
    pub id: Uuid,
    pub participants: [Uuid; 2],
    pub created_at: DateTime<Utc>,
}

impl Chat {
    /// The participant that is not `user`, if `user` is in the chat.
    pub fn other_participant(&self, user: Uuid) -> Option<Uuid> {
        if self.participants[0] == user {
            Some(self.participants[1])
        } else if self.participants[1] == user {
            Some(self.participants[0])
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub chat_id: Uuid,
    pub sender_id: Uuid,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub is_read: bool,
}

/// Written by the identity service (out of scope); read here for display
/// names, push tokens and the moderator privilege lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub user_id: Uuid,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub push_token: Option<String>,
    #[serde(default)]
    pub moderator: bool,
}

/// Sink record for swallowed best-effort failures, so they stay observable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeadLetter {
    pub id: Uuid,
    pub stage: String,
    pub subject: String,
    pub reason: String,
    pub at: DateTime<Utc>,
}
