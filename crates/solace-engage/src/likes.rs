use chrono::Utc;
use uuid::Uuid;

use solace_store::Store;
use solace_types::models::{Like, Post};
use solace_types::paths;

use crate::EngageError;

#[derive(Debug, Clone, Copy)]
pub struct LikeToggle {
    pub liked: bool,
    pub like_count: i64,
}

/// Atomic like-toggle. The Like document's existence is the deduplication
/// key: present means liked, absent means not. One transaction re-reads
/// the Post, reads the Like at (post, user), and moves the record and the
/// counter together — a concurrent commit on either document aborts the
/// attempt and the closure re-runs against fresh state, so the counter
/// can never drift from the record set.
pub fn toggle_like(store: &Store, post_id: Uuid, user_id: Uuid) -> Result<LikeToggle, EngageError> {
    store.run(|tx| {
        let post_path = paths::post(post_id);
        let mut post: Post = tx.get(&post_path)?.ok_or(EngageError::NotFound)?;

        let like_path = paths::like(post_id, user_id);
        let liked = if tx.get::<Like>(&like_path)?.is_some() {
            tx.delete(&like_path);
            post.like_count -= 1;
            false
        } else {
            tx.create(&like_path, &Like { user_id, liked_at: Utc::now() })?;
            post.like_count += 1;
            true
        };

        tx.set(&post_path, &post)?;
        Ok(LikeToggle { liked, like_count: post.like_count })
    })
}
