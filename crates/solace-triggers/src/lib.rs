pub mod dead_letter;
pub mod notify;
pub mod sessions;

pub use notify::{HttpNotifier, LogNotifier, NotePayload, Notifier};
pub use sessions::{Derivation, derive_session, list_sessions, submit_scan};

use std::sync::Arc;

use anyhow::{Context, anyhow};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use solace_store::Store;
use solace_types::events::{ChangeBatch, ChangeKind};
use solace_types::models::{Chat, ChatMessage, Profile, ScannedSession};
use solace_types::paths;

/// Server-side reactive functions over the store's change feed. Runs
/// independently of any connected client. The feed is at-least-once from
/// this engine's point of view, so every handler is idempotent with
/// respect to its triggering document. Best-effort sub-steps (profile
/// resolution, notification dispatch) are isolated: their failure is
/// logged and dead-lettered, never propagated into the write that fired
/// the trigger.
pub struct TriggerEngine {
    store: Arc<Store>,
    notifier: Arc<dyn Notifier>,
    rx: broadcast::Receiver<ChangeBatch>,
}

impl TriggerEngine {
    /// Subscribes immediately, so no creation committed after this call
    /// is missed.
    pub fn new(store: Arc<Store>, notifier: Arc<dyn Notifier>) -> Self {
        let rx = store.subscribe_all();
        Self { store, notifier, rx }
    }

    /// Consumes the change feed until the store side closes.
    pub async fn run(mut self) {
        info!("trigger engine running");
        loop {
            match self.rx.recv().await {
                Ok(batch) => self.dispatch(batch).await,
                Err(RecvError::Lagged(missed)) => {
                    warn!(missed, "change feed lagged, continuing");
                }
                Err(RecvError::Closed) => break,
            }
        }
    }

    async fn dispatch(&self, batch: ChangeBatch) {
        for change in &batch.changes {
            if change.kind != ChangeKind::Created {
                continue;
            }

            if batch.collection == paths::SCANNED_SESSIONS {
                let Some(scanned) = change.decode::<ScannedSession>() else {
                    continue;
                };
                self.on_scan_created(scanned).await;
            } else if let Some(chat_id) = paths::parse_messages_collection(&batch.collection) {
                let Some(message) = change.decode::<ChatMessage>() else {
                    continue;
                };
                self.on_message_created(chat_id, message).await;
            }
        }
    }

    async fn on_scan_created(&self, scanned: ScannedSession) {
        let store = self.store.clone();
        let scan_id = scanned.id;
        let outcome =
            tokio::task::spawn_blocking(move || derive_session(&store, &scanned)).await;

        match outcome {
            Ok(Ok(Derivation::Created(session))) => {
                info!(session = %session.id, client = %session.client_name, "session derived")
            }
            Ok(Ok(Derivation::AlreadyDerived)) => {
                debug!(scan = %scan_id, "session already derived, skipping")
            }
            // No automatic retry: the failure is recorded and the event
            // dropped.
            Ok(Err(e)) => {
                let store = self.store.clone();
                let reason = format!("session write failed: {e}");
                let _ = tokio::task::spawn_blocking(move || {
                    dead_letter::record(&store, "derive-session", &scan_id.to_string(), &reason)
                })
                .await;
            }
            Err(e) => error!("derive task join error: {e}"),
        }
    }

    async fn on_message_created(&self, chat_id: Uuid, message: ChatMessage) {
        let store = self.store.clone();
        let sender_id = message.sender_id;
        let resolved =
            tokio::task::spawn_blocking(move || resolve_reply_target(&store, chat_id, sender_id))
                .await;

        let target = match resolved {
            Ok(Ok(Some(target))) => target,
            // Unprivileged senders fan out nothing.
            Ok(Ok(None)) => return,
            Ok(Err(e)) => {
                self.dead_letter("notify-reply", message.id, format!("{e:#}")).await;
                return;
            }
            Err(e) => {
                error!("resolve task join error: {e}");
                return;
            }
        };

        let payload = NotePayload {
            title: format!("{} replied", target.sender_name),
            body: message.text.clone(),
        };
        if let Err(e) = self.notifier.send(&target.token, &payload).await {
            self.dead_letter("notify-reply", message.id, format!("dispatch failed: {e:#}"))
                .await;
        }
    }

    async fn dead_letter(&self, stage: &'static str, subject: Uuid, reason: String) {
        let store = self.store.clone();
        let _ = tokio::task::spawn_blocking(move || {
            dead_letter::record(&store, stage, &subject.to_string(), &reason)
        })
        .await;
    }
}

struct ReplyTarget {
    token: String,
    sender_name: String,
}

/// A reply notification goes out only for privileged (staff) senders.
/// Returns `Ok(None)` when the sender is not privileged; any other
/// unresolvable step is an error for the dead-letter sink.
fn resolve_reply_target(
    store: &Store,
    chat_id: Uuid,
    sender_id: Uuid,
) -> anyhow::Result<Option<ReplyTarget>> {
    let sender = match store.get::<Profile>(&paths::profile(sender_id))? {
        Some(profile) if profile.moderator => profile,
        _ => return Ok(None),
    };

    let chat: Chat = store
        .get(&paths::chat(chat_id))?
        .with_context(|| format!("chat {chat_id} missing"))?;
    let other = chat
        .other_participant(sender_id)
        .ok_or_else(|| anyhow!("sender {sender_id} not in chat {chat_id}"))?;

    let token = store
        .get::<Profile>(&paths::profile(other))?
        .and_then(|profile| profile.push_token)
        .with_context(|| format!("no push token for {other}"))?;

    Ok(Some(ReplyTarget {
        token,
        sender_name: sender.display_name,
    }))
}
