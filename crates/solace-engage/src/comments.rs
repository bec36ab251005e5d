use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use solace_store::Store;
use solace_types::models::{Comment, ModerationState, Post, TOMBSTONE_NOTICE};
use solace_types::paths;

use crate::moderation::{self, Actor, RemovalKind};
use crate::EngageError;

/// Creates the Comment and increments the post's comment_count in one
/// transaction; both happen or neither does.
pub fn add_comment(
    store: &Store,
    post_id: Uuid,
    author_id: Uuid,
    text: &str,
) -> Result<Comment, EngageError> {
    let comment_id = Uuid::new_v4();
    let created_at = Utc::now();

    store.run(|tx| {
        let post_path = paths::post(post_id);
        let mut post: Post = tx.get(&post_path)?.ok_or(EngageError::NotFound)?;

        let comment = Comment {
            id: comment_id,
            post_id,
            author_id,
            text: text.to_string(),
            created_at,
            moderation: ModerationState::Active,
        };
        tx.create(&paths::comment(post_id, comment_id), &comment)?;

        post.comment_count += 1;
        tx.set(&post_path, &post)?;
        Ok(comment)
    })
}

#[derive(Debug, Clone, Copy)]
pub struct CommentRemoval {
    pub kind: RemovalKind,
    pub comment_count: i64,
}

/// Removes a comment under the moderation state machine. `requested` is
/// `None` for the role default (authors hard-delete their own, moderators
/// tombstone others'), `Some(Hard)` for the moderator admin override.
/// Hard removal deletes the record and decrements comment_count
/// atomically; tombstoning rewrites the text to the moderation notice and
/// leaves the counter and the comment's slot in ordering untouched.
pub fn remove_comment(
    store: &Store,
    actor: &Actor,
    post_id: Uuid,
    comment_id: Uuid,
    requested: Option<RemovalKind>,
) -> Result<CommentRemoval, EngageError> {
    let removal = store.run(|tx| {
        let comment_path = paths::comment(post_id, comment_id);
        let mut comment: Comment = tx.get(&comment_path)?.ok_or(EngageError::NotFound)?;

        let kind = requested.unwrap_or_else(|| moderation::default_kind(actor, comment.author_id));
        moderation::authorize(actor, comment.author_id, comment.moderation, kind)?;

        let post_path = paths::post(post_id);
        match kind {
            RemovalKind::Hard => {
                tx.delete(&comment_path);
                // Orphan-tolerant: after a post hard-delete its comments
                // linger with no counter left to adjust.
                let count = match tx.get::<Post>(&post_path)? {
                    Some(mut post) => {
                        post.comment_count -= 1;
                        let count = post.comment_count;
                        tx.set(&post_path, &post)?;
                        count
                    }
                    None => 0,
                };
                Ok::<_, EngageError>(CommentRemoval { kind, comment_count: count })
            }
            RemovalKind::Tombstone => {
                comment.moderation = ModerationState::Tombstoned;
                comment.text = TOMBSTONE_NOTICE.to_string();
                tx.set(&comment_path, &comment)?;
                let count = tx
                    .get::<Post>(&post_path)?
                    .map(|post| post.comment_count)
                    .unwrap_or(0);
                Ok(CommentRemoval { kind, comment_count: count })
            }
        }
    })?;

    if actor.moderator {
        info!(%post_id, %comment_id, kind = ?removal.kind, "moderator removed comment");
    }
    Ok(removal)
}

/// Comments of a post in creation order. Tombstoned comments keep their
/// slot; their stored text already carries the moderation notice.
pub fn list_comments(store: &Store, post_id: Uuid) -> Result<Vec<Comment>, EngageError> {
    let mut comments: Vec<Comment> = store
        .list::<Comment>(&paths::comments_of(post_id))?
        .into_iter()
        .map(|(_, comment)| comment)
        .collect();
    comments.sort_by(|a, b| a.created_at.cmp(&b.created_at));
    Ok(comments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::posts::create_post;

    fn fixture() -> (Store, Post, Uuid) {
        let store = Store::open_in_memory().unwrap();
        let post = create_post(&store, Uuid::new_v4(), "hello".into(), None).unwrap();
        let commenter = Uuid::new_v4();
        (store, post, commenter)
    }

    fn comment_count(store: &Store, post_id: Uuid) -> i64 {
        store
            .get::<Post>(&paths::post(post_id))
            .unwrap()
            .unwrap()
            .comment_count
    }

    #[test]
    fn add_comment_increments_count() {
        let (store, post, commenter) = fixture();

        add_comment(&store, post.id, commenter, "first").unwrap();
        add_comment(&store, post.id, commenter, "second").unwrap();

        assert_eq!(comment_count(&store, post.id), 2);
        assert_eq!(list_comments(&store, post.id).unwrap().len(), 2);
    }

    #[test]
    fn add_comment_to_missing_post_fails_whole_transaction() {
        let store = Store::open_in_memory().unwrap();
        let missing = Uuid::new_v4();
        assert!(matches!(
            add_comment(&store, missing, Uuid::new_v4(), "hi"),
            Err(EngageError::NotFound)
        ));
        assert!(list_comments(&store, missing).unwrap().is_empty());
    }

    #[test]
    fn author_hard_delete_decrements_and_removes() {
        let (store, post, commenter) = fixture();
        let comment = add_comment(&store, post.id, commenter, "bye").unwrap();

        let removal =
            remove_comment(&store, &Actor::user(commenter), post.id, comment.id, None).unwrap();

        assert_eq!(removal.kind, RemovalKind::Hard);
        assert_eq!(removal.comment_count, 0);
        assert_eq!(comment_count(&store, post.id), 0);
        assert!(list_comments(&store, post.id).unwrap().is_empty());
    }

    #[test]
    fn tombstone_keeps_slot_and_count() {
        let (store, post, commenter) = fixture();
        let first = add_comment(&store, post.id, commenter, "rude").unwrap();
        let second = add_comment(&store, post.id, commenter, "fine").unwrap();

        let moderator = Actor::moderator(Uuid::new_v4());
        let removal = remove_comment(&store, &moderator, post.id, first.id, None).unwrap();
        assert_eq!(removal.kind, RemovalKind::Tombstone);
        assert_eq!(removal.comment_count, 2);
        assert_eq!(comment_count(&store, post.id), 2);

        let listed = list_comments(&store, post.id).unwrap();
        assert_eq!(listed.len(), 2);
        // Position preserved, content withheld.
        assert_eq!(listed[0].id, first.id);
        assert_eq!(listed[0].text, TOMBSTONE_NOTICE);
        assert_eq!(listed[0].moderation, ModerationState::Tombstoned);
        assert_eq!(listed[1].id, second.id);
        assert_eq!(listed[1].text, "fine");
    }

    #[test]
    fn tombstoned_comment_rejects_owner_delete() {
        let (store, post, commenter) = fixture();
        let comment = add_comment(&store, post.id, commenter, "rude").unwrap();
        let moderator = Actor::moderator(Uuid::new_v4());
        remove_comment(&store, &moderator, post.id, comment.id, None).unwrap();

        assert!(matches!(
            remove_comment(&store, &Actor::user(commenter), post.id, comment.id, None),
            Err(EngageError::PermissionDenied)
        ));
        assert_eq!(comment_count(&store, post.id), 1);
    }

    #[test]
    fn moderator_hard_override_adjusts_count() {
        let (store, post, commenter) = fixture();
        let comment = add_comment(&store, post.id, commenter, "spam").unwrap();

        let moderator = Actor::moderator(Uuid::new_v4());
        let removal = remove_comment(
            &store,
            &moderator,
            post.id,
            comment.id,
            Some(RemovalKind::Hard),
        )
        .unwrap();

        assert_eq!(removal.kind, RemovalKind::Hard);
        assert_eq!(comment_count(&store, post.id), 0);
        assert!(list_comments(&store, post.id).unwrap().is_empty());
    }

    #[test]
    fn hard_delete_of_orphaned_comment_still_removes_it() {
        let (store, post, commenter) = fixture();
        let comment = add_comment(&store, post.id, commenter, "orphan me").unwrap();

        crate::posts::delete_post(&store, &Actor::moderator(Uuid::new_v4()), post.id).unwrap();

        let removal =
            remove_comment(&store, &Actor::user(commenter), post.id, comment.id, None).unwrap();
        assert_eq!(removal.comment_count, 0);
        assert!(list_comments(&store, post.id).unwrap().is_empty());
    }
}
