use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use solace_store::Store;
use solace_types::models::Post;
use solace_types::paths;

use crate::moderation::Actor;
use crate::EngageError;

pub fn create_post(
    store: &Store,
    author_id: Uuid,
    text: String,
    media_url: Option<String>,
) -> Result<Post, EngageError> {
    let post = Post {
        id: Uuid::new_v4(),
        author_id,
        text,
        media_url,
        like_count: 0,
        comment_count: 0,
        created_at: Utc::now(),
    };

    store.run(|tx| {
        tx.create(&paths::post(post.id), &post)?;
        Ok::<_, EngageError>(())
    })?;

    Ok(post)
}

/// Feed listing, newest first.
pub fn list_posts(store: &Store) -> Result<Vec<Post>, EngageError> {
    let mut posts: Vec<Post> = store
        .list::<Post>(paths::POSTS)?
        .into_iter()
        .map(|(_, post)| post)
        .collect();
    posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(posts)
}

/// Hard delete of the Post document, gated on author or moderator.
/// Likes and comments under the post are left behind as orphans — readers
/// reach them only through a post id they already hold, and the comment
/// operations tolerate a missing parent.
pub fn delete_post(store: &Store, actor: &Actor, post_id: Uuid) -> Result<(), EngageError> {
    store.run(|tx| {
        let post: Post = tx.get(&paths::post(post_id))?.ok_or(EngageError::NotFound)?;
        if post.author_id != actor.user_id && !actor.moderator {
            return Err(EngageError::PermissionDenied);
        }
        tx.delete(&paths::post(post_id));
        Ok(())
    })?;

    info!(%post_id, actor = %actor.user_id, "post deleted");
    Ok(())
}
