use uuid::Uuid;

use solace_types::models::ModerationState;

use crate::EngageError;

/// The acting user: an opaque verified id plus the privilege lookup's
/// answer, both supplied by out-of-scope collaborators.
#[derive(Debug, Clone, Copy)]
pub struct Actor {
    pub user_id: Uuid,
    pub moderator: bool,
}

impl Actor {
    pub fn user(user_id: Uuid) -> Self {
        Self { user_id, moderator: false }
    }

    pub fn moderator(user_id: Uuid) -> Self {
        Self { user_id, moderator: true }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalKind {
    /// Record removed, counters adjusted. Terminal.
    Hard,
    /// Record retained with its content withheld, counters untouched.
    /// Terminal.
    Tombstone,
}

/// The removal an actor's role implies when they hit "delete": authors
/// hard-delete their own content, moderators tombstone other people's.
pub fn default_kind(actor: &Actor, author_id: Uuid) -> RemovalKind {
    if actor.user_id == author_id {
        RemovalKind::Hard
    } else {
        RemovalKind::Tombstone
    }
}

/// Authority check for leaving `Active`. Hard deletion is open to the
/// author and, as an admin override, to moderators. Tombstoning requires
/// moderator privilege and never applies to the actor's own content —
/// authors do not tombstone. Nothing transitions out of a terminal state.
pub fn authorize(
    actor: &Actor,
    author_id: Uuid,
    state: ModerationState,
    kind: RemovalKind,
) -> Result<(), EngageError> {
    if state != ModerationState::Active {
        return Err(EngageError::PermissionDenied);
    }

    let permitted = match kind {
        RemovalKind::Hard => actor.user_id == author_id || actor.moderator,
        RemovalKind::Tombstone => actor.moderator && actor.user_id != author_id,
    };

    if permitted {
        Ok(())
    } else {
        Err(EngageError::PermissionDenied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ModerationState::{Active, Tombstoned};

    #[test]
    fn author_hard_deletes_own_content() {
        let author = Uuid::new_v4();
        assert!(authorize(&Actor::user(author), author, Active, RemovalKind::Hard).is_ok());
    }

    #[test]
    fn author_cannot_tombstone() {
        let author = Uuid::new_v4();
        let err = authorize(&Actor::user(author), author, Active, RemovalKind::Tombstone);
        assert!(matches!(err, Err(EngageError::PermissionDenied)));

        // Moderator privilege does not change this for their own content.
        let err = authorize(&Actor::moderator(author), author, Active, RemovalKind::Tombstone);
        assert!(matches!(err, Err(EngageError::PermissionDenied)));
    }

    #[test]
    fn stranger_removes_nothing() {
        let author = Uuid::new_v4();
        let stranger = Actor::user(Uuid::new_v4());
        for kind in [RemovalKind::Hard, RemovalKind::Tombstone] {
            assert!(matches!(
                authorize(&stranger, author, Active, kind),
                Err(EngageError::PermissionDenied)
            ));
        }
    }

    #[test]
    fn moderator_tombstones_and_may_hard_delete_as_override() {
        let author = Uuid::new_v4();
        let moderator = Actor::moderator(Uuid::new_v4());
        assert!(authorize(&moderator, author, Active, RemovalKind::Tombstone).is_ok());
        assert!(authorize(&moderator, author, Active, RemovalKind::Hard).is_ok());
    }

    #[test]
    fn tombstoned_is_terminal_for_everyone() {
        let author = Uuid::new_v4();
        let moderator = Actor::moderator(Uuid::new_v4());
        for (actor, kind) in [
            (Actor::user(author), RemovalKind::Hard),
            (moderator, RemovalKind::Hard),
            (moderator, RemovalKind::Tombstone),
        ] {
            assert!(matches!(
                authorize(&actor, author, Tombstoned, kind),
                Err(EngageError::PermissionDenied)
            ));
        }
    }

    #[test]
    fn role_default_matches_actor() {
        let author = Uuid::new_v4();
        assert_eq!(default_kind(&Actor::user(author), author), RemovalKind::Hard);
        assert_eq!(
            default_kind(&Actor::moderator(Uuid::new_v4()), author),
            RemovalKind::Tombstone
        );
        // A moderator deleting their own content is still an author delete.
        assert_eq!(default_kind(&Actor::moderator(author), author), RemovalKind::Hard);
    }
}
