//! Notification dispatcher.
//!
//! Every dispatch persists a [`Notification`] first. Delivery to the
//! recipient's device goes through a [`PushTransport`] on a detached task;
//! its outcome is logged and never reaches the caller.

use std::sync::Arc;

use serde_json::json;
use uuid::Uuid;

use crate::error::{DomainError, DomainResult};
use crate::models::alert::Alert;
use crate::models::notification::{
    NewNotification, Notification, NotificationType, Recipient, HISTORY_LIMIT,
};
use crate::ports::NotificationStore;

/// A message handed to a push transport.
#[derive(Debug, Clone, PartialEq)]
pub struct PushMessage {
    pub token: String,
    pub title: String,
    pub body: String,
    pub data: serde_json::Value,
}

/// Result of a push attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum PushOutcome {
    Sent,
    /// Recipient has no device token registered.
    NoToken,
    Failed(String),
}

/// Device push delivery.
#[async_trait::async_trait]
pub trait PushTransport: Send + Sync {
    async fn send(&self, message: PushMessage) -> PushOutcome;
}

/// Push transport for development. Logs messages but doesn't send them.
#[derive(Debug, Clone, Default)]
pub struct LoggingPushTransport {
    pub simulate_failure: bool,
}

impl LoggingPushTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            simulate_failure: true,
        }
    }
}

#[async_trait::async_trait]
impl PushTransport for LoggingPushTransport {
    async fn send(&self, message: PushMessage) -> PushOutcome {
        if self.simulate_failure {
            tracing::warn!(title = %message.title, "Logging push transport simulating failure");
            return PushOutcome::Failed("Simulated failure".to_string());
        }

        tracing::info!(
            title = %message.title,
            body = %message.body,
            "Push delivery disabled, message logged only"
        );
        PushOutcome::Sent
    }
}

/// Persists notifications and triggers best-effort device delivery.
#[derive(Clone)]
pub struct NotificationDispatcher {
    store: Arc<dyn NotificationStore>,
    push: Arc<dyn PushTransport>,
}

impl NotificationDispatcher {
    pub fn new(store: Arc<dyn NotificationStore>, push: Arc<dyn PushTransport>) -> Self {
        Self { store, push }
    }

    /// Records a notification for `recipient` and starts a push attempt.
    ///
    /// Fails only if the record cannot be stored. Push failures are logged.
    pub async fn dispatch(
        &self,
        recipient: &Recipient,
        alert: Option<&Alert>,
        notification_type: NotificationType,
        message: impl Into<String>,
    ) -> DomainResult<Notification> {
        let data = match alert {
            Some(a) => json!({
                "alertId": a.id,
                "bloodType": a.blood_type,
                "type": notification_type,
            }),
            None => json!({ "type": notification_type }),
        };

        let notification = self
            .store
            .insert(NewNotification {
                recipient_id: recipient.id,
                recipient_kind: recipient.kind,
                alert_id: alert.map(|a| a.id),
                notification_type,
                title: notification_type.title().to_string(),
                message: message.into(),
                data,
            })
            .await?;

        self.spawn_push(recipient, &notification);

        Ok(notification)
    }

    fn spawn_push(&self, recipient: &Recipient, notification: &Notification) {
        let Some(token) = recipient.push_token.clone() else {
            tracing::debug!(
                recipient_id = %recipient.id,
                notification_id = %notification.id,
                "Recipient has no push token, skipping delivery"
            );
            return;
        };

        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            tracing::warn!(
                notification_id = %notification.id,
                "No async runtime available, skipping push delivery"
            );
            return;
        };

        let push = Arc::clone(&self.push);
        let notification_id = notification.id;
        let recipient_id = recipient.id;
        let message = PushMessage {
            token,
            title: notification.title.clone(),
            body: notification.message.clone(),
            data: notification.data.clone(),
        };

        handle.spawn(async move {
            match push.send(message).await {
                PushOutcome::Sent => tracing::debug!(
                    notification_id = %notification_id,
                    recipient_id = %recipient_id,
                    "Push notification delivered"
                ),
                PushOutcome::NoToken => tracing::debug!(
                    notification_id = %notification_id,
                    "Push transport reported no token"
                ),
                PushOutcome::Failed(reason) => tracing::warn!(
                    notification_id = %notification_id,
                    recipient_id = %recipient_id,
                    error = %reason,
                    "Push notification failed"
                ),
            }
        });
    }

    /// Newest first, capped at 50.
    pub async fn list_history(&self, recipient_id: Uuid) -> DomainResult<Vec<Notification>> {
        self.store
            .list_for_recipient(recipient_id, HISTORY_LIMIT)
            .await
    }

    /// Marks a notification read. Notifications addressed to someone else
    /// are reported as not found.
    pub async fn mark_read(&self, id: Uuid, recipient_id: Uuid) -> DomainResult<Notification> {
        self.store
            .mark_read(id, recipient_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Notification not found"))
    }
}
