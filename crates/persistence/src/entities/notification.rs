//! Notification entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use domain::models::notification::Notification;
use domain::DomainError;

/// Database row mapping for the notifications table.
#[derive(Debug, Clone, FromRow)]
pub struct NotificationEntity {
    pub id: Uuid,
    pub recipient_id: Uuid,
    pub recipient_kind: String,
    pub alert_id: Option<Uuid>,
    pub notification_type: String,
    pub title: String,
    pub message: String,
    pub data: serde_json::Value,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<NotificationEntity> for Notification {
    type Error = DomainError;

    fn try_from(entity: NotificationEntity) -> Result<Self, Self::Error> {
        Ok(Self {
            id: entity.id,
            recipient_id: entity.recipient_id,
            recipient_kind: entity.recipient_kind.parse()?,
            alert_id: entity.alert_id,
            notification_type: entity.notification_type.parse()?,
            title: entity.title,
            message: entity.message,
            data: entity.data,
            read: entity.read,
            created_at: entity.created_at,
        })
    }
}
