//! # Alert Channel
//!
//! Fire-and-forget operator alerts. A missing channel is a logged skip, not
//! an error.

use crate::services::NotifyError;
use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_alert(&self, subject: &str, message: &str) -> Result<(), NotifyError>;
}

/// Used when no alert channel is configured
#[derive(Debug, Default, Clone, Copy)]
pub struct LogOnlyNotifier;

#[async_trait]
impl Notifier for LogOnlyNotifier {
    async fn send_alert(&self, subject: &str, message: &str) -> Result<(), NotifyError> {
        warn!(
            subject = %subject,
            message = %message,
            "No alert channel configured - skipping alert"
        );
        Ok(())
    }
}

/// An alert as delivered to a channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    pub subject: String,
    pub message: String,
}

/// Keeps every alert in memory
#[derive(Debug, Default)]
pub struct InMemoryNotifier {
    sent: Mutex<Vec<Alert>>,
}

impl InMemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<Alert> {
        self.sent.lock().clone()
    }
}

#[async_trait]
impl Notifier for InMemoryNotifier {
    async fn send_alert(&self, subject: &str, message: &str) -> Result<(), NotifyError> {
        self.sent.lock().push(Alert {
            subject: subject.to_string(),
            message: message.to_string(),
        });
        Ok(())
    }
}

/// Posts alerts as JSON to a webhook URL
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    client: Client,
    url: String,
    timeout: Duration,
}

impl WebhookNotifier {
    pub fn new(client: Client, url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client,
            url: url.into(),
            timeout,
        }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn send_alert(&self, subject: &str, message: &str) -> Result<(), NotifyError> {
        let alert = Alert {
            subject: subject.to_string(),
            message: message.to_string(),
        };

        self.client
            .post(&self.url)
            .timeout(self.timeout)
            .json(&alert)
            .send()
            .await?
            .error_for_status()?;

        debug!(url = %self.url, subject = %subject, "Alert delivered");
        Ok(())
    }
}
