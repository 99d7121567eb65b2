//! Notification repository.

use sqlx::PgPool;
use uuid::Uuid;

use domain::models::notification::{NewNotification, Notification};
use domain::ports::NotificationStore;
use domain::DomainResult;

use crate::entities::NotificationEntity;
use crate::metrics::QueryTimer;

/// Repository for notification database operations.
#[derive(Clone)]
pub struct NotificationRepository {
    pool: PgPool,
}

impl NotificationRepository {
    /// Creates a new NotificationRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl NotificationStore for NotificationRepository {
    async fn insert(&self, notification: NewNotification) -> DomainResult<Notification> {
        let timer = QueryTimer::new("insert_notification");
        let result = sqlx::query_as::<_, NotificationEntity>(
            r#"
            INSERT INTO notifications (
                recipient_id, recipient_kind, alert_id, notification_type, title, message, data
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(notification.recipient_id)
        .bind(notification.recipient_kind.as_str())
        .bind(notification.alert_id)
        .bind(notification.notification_type.as_str())
        .bind(&notification.title)
        .bind(&notification.message)
        .bind(&notification.data)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        Notification::try_from(result?)
    }

    async fn list_for_recipient(
        &self,
        recipient_id: Uuid,
        limit: i64,
    ) -> DomainResult<Vec<Notification>> {
        let timer = QueryTimer::new("list_notifications_for_recipient");
        let result = sqlx::query_as::<_, NotificationEntity>(
            r#"
            SELECT * FROM notifications
            WHERE recipient_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(recipient_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result?.into_iter().map(Notification::try_from).collect()
    }

    async fn mark_read(
        &self,
        id: Uuid,
        recipient_id: Uuid,
    ) -> DomainResult<Option<Notification>> {
        let timer = QueryTimer::new("mark_notification_read");
        let result = sqlx::query_as::<_, NotificationEntity>(
            r#"
            UPDATE notifications
            SET read = TRUE
            WHERE id = $1 AND recipient_id = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(recipient_id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result?.map(Notification::try_from).transpose()
    }
}
