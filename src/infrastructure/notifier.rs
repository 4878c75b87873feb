//! Notifier: formats and delivers plain-text alert messages. Delivery
//! failures are logged and never propagate to the monitor loop. Grounded
//! on `telegram_notifier.py`/`slack_notifier.py`'s best-effort, plain-text
//! contract, reimplemented with the `reqwest-middleware`/`reqwest-retry`
//! stack.

use crate::domain::ports::Notifier;
use anyhow::Result;
use async_trait::async_trait;
use tracing::{info, warn};

/// Default notifier: logs the message instead of delivering it. Used in
/// tests and whenever no transport is configured.
pub struct LoggingNotifier;

#[async_trait]
impl Notifier for LoggingNotifier {
    async fn send(&self, message: &str) -> Result<()> {
        info!(target: "ladder_engine::notifier", "{message}");
        Ok(())
    }
}

/// Posts plain-text alerts to a configured webhook URL (Telegram/Slack-shaped),
/// retried through the shared backoff-with-jitter HTTP client.
pub struct WebhookNotifier {
    client: reqwest_middleware::ClientWithMiddleware,
    webhook_url: String,
}

impl WebhookNotifier {
    pub fn new(webhook_url: String) -> Self {
        Self {
            client: crate::infrastructure::http_client_factory::build_client(5),
            webhook_url,
        }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn send(&self, message: &str) -> Result<()> {
        let body = serde_json::json!({ "text": message });
        match self.client.post(&self.webhook_url).json(&body).send().await {
            Ok(response) if response.status().is_success() => Ok(()),
            Ok(response) => {
                warn!("notification delivery failed with status {}", response.status());
                Ok(())
            }
            Err(e) => {
                // Best-effort delivery: log and move on.
                warn!("notification delivery failed: {e}");
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn logging_notifier_never_fails() {
        let notifier = LoggingNotifier;
        assert!(notifier.send("BTC approaching B2 at 52.00").await.is_ok());
    }
}
