use crate::error::CoreError;
use crate::models::EventDefinition;
use crate::repository::SqliteRepository;
use async_trait::async_trait;
use chrono::NaiveDate;

fn decode(body: String) -> Result<EventDefinition, CoreError> {
    Ok(serde_json::from_str(&body)?)
}

fn decode_all(bodies: Vec<String>) -> Result<Vec<EventDefinition>, CoreError> {
    bodies.into_iter().map(decode).collect()
}

#[async_trait]
impl super::EventRepository for SqliteRepository {
    async fn find_event_by_id(&self, id: &str) -> Result<Option<EventDefinition>, CoreError> {
        let body: Option<String> = sqlx::query_scalar("SELECT body FROM events WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool())
            .await?;
        body.map(decode).transpose()
    }

    async fn put_event(&self, event: &EventDefinition) -> Result<(), CoreError> {
        let body = serde_json::to_string(event)?;
        sqlx::query(
            r#"INSERT INTO events (id, family_id, annual_event_id, is_reminder, event_date, status, last_modified, body)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT(id) DO UPDATE SET
                family_id = excluded.family_id,
                annual_event_id = excluded.annual_event_id,
                is_reminder = excluded.is_reminder,
                event_date = excluded.event_date,
                status = excluded.status,
                last_modified = excluded.last_modified,
                body = excluded.body"#,
        )
        .bind(&event.id)
        .bind(&event.family_id)
        .bind(&event.annual_event_id)
        .bind(event.is_reminder)
        .bind(event.date)
        .bind(event.status.to_string())
        .bind(event.last_modified)
        .bind(body)
        .execute(self.pool())
        .await?;
        Ok(())
    }

    async fn find_events_for_family(
        &self,
        family_id: &str,
    ) -> Result<Vec<EventDefinition>, CoreError> {
        let bodies: Vec<String> =
            sqlx::query_scalar("SELECT body FROM events WHERE family_id = $1 ORDER BY id")
                .bind(family_id)
                .fetch_all(self.pool())
                .await?;
        decode_all(bodies)
    }

    async fn find_events_by_annual_id(
        &self,
        annual_event_id: &str,
    ) -> Result<Vec<EventDefinition>, CoreError> {
        let bodies: Vec<String> =
            sqlx::query_scalar("SELECT body FROM events WHERE annual_event_id = $1 ORDER BY id")
                .bind(annual_event_id)
                .fetch_all(self.pool())
                .await?;
        decode_all(bodies)
    }

    async fn delete_events(&self, ids: &[String]) -> Result<(), CoreError> {
        if ids.is_empty() {
            return Ok(());
        }
        let mut tx = self.pool().begin().await?;
        for id in ids {
            sqlx::query("DELETE FROM events WHERE id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn find_expired_reminders(
        &self,
        cutoff: NaiveDate,
    ) -> Result<Vec<EventDefinition>, CoreError> {
        let bodies: Vec<String> = sqlx::query_scalar(
            "SELECT body FROM events WHERE is_reminder = 1 AND event_date IS NOT NULL AND event_date < $1",
        )
        .bind(cutoff)
        .fetch_all(self.pool())
        .await?;
        decode_all(bodies)
    }
}
