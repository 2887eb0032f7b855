//! Notification collaborators.
//!
//! Workflow code never waits on delivery outcomes: every send goes through
//! [`dispatch_best_effort`], which logs failures and carries on.

use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use super::BaseNotifier;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    ReviewApproved,
    ReviewRejected,
    ReviewEscalated,
    CorrectionPublished,
    CorrectionsOverdue,
    TransparencyReportReady,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub subject: String,
    pub body: String,
    pub data: serde_json::Value,
}

impl Notification {
    pub fn new(
        kind: NotificationKind,
        subject: impl Into<String>,
        body: impl Into<String>,
        data: serde_json::Value,
    ) -> Self {
        Self {
            kind,
            subject: subject.into(),
            body: body.into(),
            data,
        }
    }
}

/// Send and forget. Delivery problems are logged, never returned.
pub async fn dispatch_best_effort(notifier: &dyn BaseNotifier, notification: Notification) {
    if let Err(e) = notifier.notify(&notification).await {
        warn!(
            kind = ?notification.kind,
            subject = %notification.subject,
            error = %e,
            "Notification dispatch failed"
        );
    }
}

// =============================================================================
// Webhook notifier (mail relay / chat integration)
// =============================================================================

pub struct WebhookNotifier {
    client: Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            url: url.into(),
        }
    }
}

#[async_trait]
impl BaseNotifier for WebhookNotifier {
    async fn notify(&self, notification: &Notification) -> Result<()> {
        info!(kind = ?notification.kind, "Posting notification webhook");

        let response = self.client.post(&self.url).json(notification).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!("Notification webhook failed {}: {}", status, body);
            anyhow::bail!("Notification webhook error {}: {}", status, body);
        }

        Ok(())
    }
}

// =============================================================================
// Log-only notifier (no webhook configured)
// =============================================================================

#[derive(Default)]
pub struct LogNotifier;

#[async_trait]
impl BaseNotifier for LogNotifier {
    async fn notify(&self, notification: &Notification) -> Result<()> {
        info!(
            kind = ?notification.kind,
            subject = %notification.subject,
            "Notification (log only): {}",
            notification.body
        );
        Ok(())
    }
}
