use crate::error::AlerterError;
use configuration::DiscordConfig;
use reqwest::Client;
use serde::Serialize;
use std::fmt;
use tokio::sync::mpsc;
pub mod error;

/// Discord rejects message content longer than this many characters.
pub const DISCORD_MESSAGE_LIMIT: usize = 2000;

/// Where a message is delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    /// Routine status updates.
    Logs,
    /// Trade signals, outcomes and errors.
    Alerts,
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Channel::Logs => f.write_str("logs"),
            Channel::Alerts => f.write_str("alerts"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub channel: Channel,
    pub text: String,
}

/// Cheap, cloneable handle for queueing notifications.
///
/// `notify` never blocks and never fails. Messages are dropped silently once the
/// delivery service has stopped, or always when the handle is disabled.
#[derive(Debug, Clone)]
pub struct Notifier {
    tx: Option<mpsc::UnboundedSender<Notification>>,
}

impl Notifier {
    /// Creates a handle and the receiving end for `run_alerter_service`.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx: Some(tx) }, rx)
    }

    /// A handle that discards everything.
    pub fn disabled() -> Self {
        Self { tx: None }
    }

    pub fn notify(&self, channel: Channel, text: impl Into<String>) {
        let Some(tx) = &self.tx else {
            return;
        };
        let notification = Notification {
            channel,
            text: text.into(),
        };
        if tx.send(notification).is_err() {
            tracing::debug!(%channel, "Alerter service stopped; notification dropped.");
        }
    }

    pub fn log(&self, text: impl Into<String>) {
        self.notify(Channel::Logs, text);
    }

    pub fn alert(&self, text: impl Into<String>) {
        self.notify(Channel::Alerts, text);
    }
}

/// The JSON payload for a Discord webhook execution.
#[derive(Debug, Serialize)]
struct WebhookPayload<'a> {
    content: &'a str,
}

/// Posts messages to Discord webhooks.
pub struct DiscordAlerter {
    client: Client,
    logs_webhook: String,
    alerts_webhook: String,
}

impl DiscordAlerter {
    /// Creates a new `DiscordAlerter`.
    ///
    /// Returns `None` when neither webhook is configured, so notifications can be
    /// disabled without touching the callers.
    pub fn new(config: &DiscordConfig) -> Option<Self> {
        if config.logs_webhook.is_empty() && config.alerts_webhook.is_empty() {
            tracing::warn!("Discord alerter is not configured (no webhook URLs).");
            return None;
        }
        Some(Self {
            client: Client::new(),
            logs_webhook: config.logs_webhook.clone(),
            alerts_webhook: config.alerts_webhook.clone(),
        })
    }

    fn webhook(&self, channel: Channel) -> &str {
        match channel {
            Channel::Logs => &self.logs_webhook,
            Channel::Alerts => &self.alerts_webhook,
        }
    }

    /// Sends a text message to the webhook of `channel`.
    pub async fn send_message(&self, channel: Channel, message: &str) -> Result<(), AlerterError> {
        let url = self.webhook(channel);
        if url.is_empty() {
            return Err(AlerterError::NotConfigured(channel));
        }

        let payload = WebhookPayload {
            content: truncate(message, DISCORD_MESSAGE_LIMIT),
        };
        let response = self.client.post(url).json(&payload).send().await?;

        if !response.status().is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to decode error response".to_string());
            return Err(AlerterError::ApiError(error_text));
        }

        Ok(())
    }
}

/// Cuts `text` to at most `max_chars` characters.
pub fn truncate(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

/// A long-running service that delivers queued notifications until every
/// `Notifier` has been dropped.
///
/// Without an alerter the queue is drained and discarded.
pub async fn run_alerter_service(
    alerter: Option<DiscordAlerter>,
    mut rx: mpsc::UnboundedReceiver<Notification>,
) {
    tracing::info!(enabled = alerter.is_some(), "Alerter service started.");

    while let Some(notification) = rx.recv().await {
        let Some(alerter) = &alerter else {
            continue;
        };
        match alerter
            .send_message(notification.channel, &notification.text)
            .await
        {
            Ok(()) => {}
            Err(AlerterError::NotConfigured(_)) => {}
            Err(e) => {
                tracing::error!(error = %e, channel = %notification.channel, "Failed to send Discord notification.");
            }
        }
    }

    tracing::info!("Alerter service stopped.");
}
