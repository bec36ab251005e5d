use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Address of one document: a collection path plus a document id.
/// Subcollections are path-shaped collections, e.g. `posts/{post}/likes`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocPath {
    pub collection: String,
    pub id: String,
}

impl DocPath {
    pub fn new(collection: impl Into<String>, id: impl Into<String>) -> Self {
        Self { collection: collection.into(), id: id.into() }
    }
}

impl fmt::Display for DocPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.collection, self.id)
    }
}

pub const POSTS: &str = "posts";
pub const BOOKINGS: &str = "bookings";
pub const SCANNED_SESSIONS: &str = "scannedSessions";
pub const SESSIONS: &str = "sessions";
pub const CHATS: &str = "chats";
pub const PROFILES: &str = "profiles";
pub const DEAD_LETTERS: &str = "deadLetters";

pub fn post(post_id: Uuid) -> DocPath {
    DocPath::new(POSTS, post_id.to_string())
}

pub fn likes_of(post_id: Uuid) -> String {
    format!("{POSTS}/{post_id}/likes")
}

pub fn like(post_id: Uuid, user_id: Uuid) -> DocPath {
    DocPath::new(likes_of(post_id), user_id.to_string())
}

pub fn comments_of(post_id: Uuid) -> String {
    format!("{POSTS}/{post_id}/comments")
}

pub fn comment(post_id: Uuid, comment_id: Uuid) -> DocPath {
    DocPath::new(comments_of(post_id), comment_id.to_string())
}

pub fn booking(slot_doc_id: &str) -> DocPath {
    DocPath::new(BOOKINGS, slot_doc_id)
}

pub fn scanned_session(id: Uuid) -> DocPath {
    DocPath::new(SCANNED_SESSIONS, id.to_string())
}

pub fn session(id: Uuid) -> DocPath {
    DocPath::new(SESSIONS, id.to_string())
}

pub fn chat(chat_id: Uuid) -> DocPath {
    DocPath::new(CHATS, chat_id.to_string())
}

pub fn messages_of(chat_id: Uuid) -> String {
    format!("{CHATS}/{chat_id}/messages")
}

pub fn message(chat_id: Uuid, message_id: Uuid) -> DocPath {
    DocPath::new(messages_of(chat_id), message_id.to_string())
}

pub fn profile(user_id: Uuid) -> DocPath {
    DocPath::new(PROFILES, user_id.to_string())
}

pub fn dead_letter(id: Uuid) -> DocPath {
    DocPath::new(DEAD_LETTERS, id.to_string())
}

/// Parses `chats/{chat}/messages` back into the chat id. Returns `None`
/// for any other collection.
pub fn parse_messages_collection(collection: &str) -> Option<Uuid> {
    let rest = collection.strip_prefix("chats/")?;
    let chat_id = rest.strip_suffix("/messages")?;
    chat_id.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_collection_roundtrip() {
        let chat_id = Uuid::new_v4();
        let collection = messages_of(chat_id);
        assert_eq!(parse_messages_collection(&collection), Some(chat_id));
        assert_eq!(parse_messages_collection("posts"), None);
        assert_eq!(parse_messages_collection("chats/not-a-uuid/messages"), None);
    }
}
