use async_trait::async_trait;
use serde::Serialize;
use tracing::info;

#[derive(Debug, Clone, Serialize)]
pub struct NotePayload {
    pub title: String,
    pub body: String,
}

/// Outbound notification delivery collaborator. Implementations are
/// best-effort: callers log and dead-letter failures, never propagate
/// them into the write that triggered the send.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, token: &str, payload: &NotePayload) -> anyhow::Result<()>;
}

/// Default when no push gateway is configured: the notification only
/// reaches the log.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, token: &str, payload: &NotePayload) -> anyhow::Result<()> {
        info!(token, title = %payload.title, "notification (log only)");
        Ok(())
    }
}

/// Posts notifications to a push gateway endpoint.
pub struct HttpNotifier {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpNotifier {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl Notifier for HttpNotifier {
    async fn send(&self, token: &str, payload: &NotePayload) -> anyhow::Result<()> {
        self.client
            .post(&self.endpoint)
            .json(&serde_json::json!({
                "to": token,
                "title": payload.title,
                "body": payload.body,
            }))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}
