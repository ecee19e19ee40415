use crate::error::CoreError;
use crate::models::{NotificationStatus, ScheduledNotification};
use crate::repository::SqliteRepository;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

fn decode(body: String) -> Result<ScheduledNotification, CoreError> {
    Ok(serde_json::from_str(&body)?)
}

#[async_trait]
impl super::NotificationRepository for SqliteRepository {
    async fn add_notification(
        &self,
        notification: &ScheduledNotification,
    ) -> Result<(), CoreError> {
        let body = serde_json::to_string(notification)?;
        sqlx::query(
            r#"INSERT INTO notifications (id, event_id, user_id, status, scheduled_time, body)
            VALUES ($1, $2, $3, $4, $5, $6)"#,
        )
        .bind(&notification.id)
        .bind(&notification.event_id)
        .bind(&notification.user_id)
        .bind(notification.status.to_string())
        .bind(notification.scheduled_time)
        .bind(body)
        .execute(self.pool())
        .await?;
        Ok(())
    }

    async fn update_notification(
        &self,
        notification: &ScheduledNotification,
    ) -> Result<(), CoreError> {
        let body = serde_json::to_string(notification)?;
        let result = sqlx::query(
            r#"UPDATE notifications
            SET status = $1, scheduled_time = $2, body = $3
            WHERE id = $4"#,
        )
        .bind(notification.status.to_string())
        .bind(notification.scheduled_time)
        .bind(body)
        .bind(&notification.id)
        .execute(self.pool())
        .await?;
        if result.rows_affected() == 0 {
            return Err(CoreError::NotFound(format!(
                "Notification with id {} not found",
                notification.id
            )));
        }
        Ok(())
    }

    async fn find_pending_for_event(
        &self,
        event_id: &str,
    ) -> Result<Vec<ScheduledNotification>, CoreError> {
        let bodies: Vec<String> = sqlx::query_scalar(
            "SELECT body FROM notifications WHERE event_id = $1 AND status = $2 ORDER BY scheduled_time",
        )
        .bind(event_id)
        .bind(NotificationStatus::Pending.to_string())
        .fetch_all(self.pool())
        .await?;
        bodies.into_iter().map(decode).collect()
    }

    async fn find_due_pending(
        &self,
        now: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<ScheduledNotification>, CoreError> {
        let bodies: Vec<String> = sqlx::query_scalar(
            r#"SELECT body FROM notifications
            WHERE status = $1 AND scheduled_time <= $2
            ORDER BY scheduled_time
            LIMIT $3"#,
        )
        .bind(NotificationStatus::Pending.to_string())
        .bind(now)
        .bind(limit as i64)
        .fetch_all(self.pool())
        .await?;
        bodies.into_iter().map(decode).collect()
    }
}
