//! Delivery of progress and report messages to humans.
//!
//! Orchestrators narrate their work through a [`NotificationSink`]. A failed delivery
//! is logged and never aborts a run, see [`notify`].

use async_trait::async_trait;
use serde::Serialize;
use tracing::{info, warn};
use url::Url;

use crate::{WardenError, WardenResult};

#[cfg(test)]
#[path = "notifications_tests.rs"]
mod tests;

/// Maximum number of characters Discord accepts in one message.
pub const MAX_MESSAGE_LENGTH: usize = 2000;

/// Destination for human readable messages.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn send(&self, message: &str) -> WardenResult<()>;
}

#[derive(Serialize)]
struct DiscordMessage<'a> {
    content: &'a str,
}

/// Posts messages to a Discord webhook.
pub struct DiscordNotifier {
    client: reqwest::Client,
    webhook_url: Url,
}

impl DiscordNotifier {
    pub fn new(webhook_url: Url) -> Self {
        Self::with_client(reqwest::Client::new(), webhook_url)
    }

    pub fn with_client(client: reqwest::Client, webhook_url: Url) -> Self {
        Self {
            client,
            webhook_url,
        }
    }
}

#[async_trait]
impl NotificationSink for DiscordNotifier {
    async fn send(&self, message: &str) -> WardenResult<()> {
        self.client
            .post(self.webhook_url.clone())
            .json(&DiscordMessage { content: message })
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|e| WardenError::Notification(e.to_string()))?;
        Ok(())
    }
}

/// Writes messages to the log only. Used when no webhook is configured.
#[derive(Debug, Default)]
pub struct LogOnlyNotifier;

#[async_trait]
impl NotificationSink for LogOnlyNotifier {
    async fn send(&self, message: &str) -> WardenResult<()> {
        info!(notification = message, "Notification");
        Ok(())
    }
}

/// Sends `message`, logging instead of failing when delivery does not succeed.
pub async fn notify(sink: &dyn NotificationSink, message: &str) {
    if let Err(e) = sink.send(message).await {
        warn!(error = %e, "Failed to deliver notification");
    }
}

/// Packs `parts` into messages of at most `limit` characters.
///
/// Parts are never split unless a single part exceeds `limit` on its own; such a part
/// is cut on character boundaries. Order is preserved.
///
/// ```rust
/// use repo_warden_core::chunk_messages;
///
/// let chunks = chunk_messages(&["aaa", "bbb", "cc"], 6);
/// assert_eq!(chunks, vec!["aaabbb".to_string(), "cc".to_string()]);
/// ```
pub fn chunk_messages<S: AsRef<str>>(parts: &[S], limit: usize) -> Vec<String> {
    let limit = limit.max(1);
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for part in parts {
        let part = part.as_ref();
        let part_len = part.chars().count();

        if part_len > limit {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
                current_len = 0;
            }
            let characters: Vec<char> = part.chars().collect();
            chunks.extend(characters.chunks(limit).map(|c| c.iter().collect::<String>()));
            continue;
        }

        if current_len + part_len > limit && !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }
        current.push_str(part);
        current_len += part_len;
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}
