use chrono::Utc;
use uuid::Uuid;

use solace_store::Store;
use solace_types::models::{Chat, ChatMessage};
use solace_types::paths;

use crate::EngageError;

pub fn open_chat(store: &Store, a: Uuid, b: Uuid) -> Result<Chat, EngageError> {
    let chat = Chat {
        id: Uuid::new_v4(),
        participants: [a, b],
        created_at: Utc::now(),
    };

    store.run(|tx| {
        tx.create(&paths::chat(chat.id), &chat)?;
        Ok::<_, EngageError>(())
    })?;

    Ok(chat)
}

pub fn send_message(
    store: &Store,
    chat_id: Uuid,
    sender_id: Uuid,
    text: &str,
) -> Result<ChatMessage, EngageError> {
    let message_id = Uuid::new_v4();
    let created_at = Utc::now();

    store.run(|tx| {
        let chat: Chat = tx.get(&paths::chat(chat_id))?.ok_or(EngageError::NotFound)?;
        if chat.other_participant(sender_id).is_none() {
            return Err(EngageError::PermissionDenied);
        }

        let message = ChatMessage {
            id: message_id,
            chat_id,
            sender_id,
            text: text.to_string(),
            created_at,
            is_read: false,
        };
        tx.create(&paths::message(chat_id, message_id), &message)?;
        Ok(message)
    })
}

/// Read-state belongs to the recipient: the sender cannot mark their own
/// message read, and outsiders cannot touch the chat at all.
pub fn mark_read(
    store: &Store,
    chat_id: Uuid,
    message_id: Uuid,
    reader_id: Uuid,
) -> Result<(), EngageError> {
    store.run(|tx| {
        let chat: Chat = tx.get(&paths::chat(chat_id))?.ok_or(EngageError::NotFound)?;
        if chat.other_participant(reader_id).is_none() {
            return Err(EngageError::PermissionDenied);
        }

        let message_path = paths::message(chat_id, message_id);
        let mut message: ChatMessage =
            tx.get(&message_path)?.ok_or(EngageError::NotFound)?;
        if message.sender_id == reader_id {
            return Err(EngageError::PermissionDenied);
        }

        if !message.is_read {
            message.is_read = true;
            tx.set(&message_path, &message)?;
        }
        Ok(())
    })
}

/// Messages of one chat in send order. Ordering holds within the chat
/// only; nothing is guaranteed across chats.
pub fn list_messages(store: &Store, chat_id: Uuid) -> Result<Vec<ChatMessage>, EngageError> {
    let mut messages: Vec<ChatMessage> = store
        .list::<ChatMessage>(&paths::messages_of(chat_id))?
        .into_iter()
        .map(|(_, message)| message)
        .collect();
    messages.sort_by(|a, b| a.created_at.cmp(&b.created_at));
    Ok(messages)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> (Store, Chat, Uuid, Uuid) {
        let store = Store::open_in_memory().unwrap();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let chat = open_chat(&store, a, b).unwrap();
        (store, chat, a, b)
    }

    #[test]
    fn send_and_list_in_order() {
        let (store, chat, a, b) = fixture();
        send_message(&store, chat.id, a, "hi").unwrap();
        send_message(&store, chat.id, b, "hello").unwrap();

        let messages = list_messages(&store, chat.id).unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].text, "hi");
        assert_eq!(messages[1].text, "hello");
        assert!(!messages[0].is_read);
    }

    #[test]
    fn outsider_cannot_send() {
        let (store, chat, _, _) = fixture();
        assert!(matches!(
            send_message(&store, chat.id, Uuid::new_v4(), "intruding"),
            Err(EngageError::PermissionDenied)
        ));
    }

    #[test]
    fn recipient_marks_read_sender_cannot() {
        let (store, chat, a, b) = fixture();
        let message = send_message(&store, chat.id, a, "hi").unwrap();

        assert!(matches!(
            mark_read(&store, chat.id, message.id, a),
            Err(EngageError::PermissionDenied)
        ));

        mark_read(&store, chat.id, message.id, b).unwrap();
        let messages = list_messages(&store, chat.id).unwrap();
        assert!(messages[0].is_read);

        // Duplicate delivery of the same read is harmless.
        mark_read(&store, chat.id, message.id, b).unwrap();
    }
}
