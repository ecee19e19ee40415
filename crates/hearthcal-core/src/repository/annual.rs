use crate::error::CoreError;
use crate::models::AnnualEvent;
use crate::repository::SqliteRepository;
use async_trait::async_trait;

#[async_trait]
impl super::AnnualEventRepository for SqliteRepository {
    async fn find_annual_event_by_id(&self, id: &str) -> Result<Option<AnnualEvent>, CoreError> {
        let body: Option<String> =
            sqlx::query_scalar("SELECT body FROM annual_events WHERE id = $1")
                .bind(id)
                .fetch_optional(self.pool())
                .await?;
        body.map(|b| serde_json::from_str(&b).map_err(CoreError::from))
            .transpose()
    }

    async fn put_annual_event(&self, event: &AnnualEvent) -> Result<(), CoreError> {
        let body = serde_json::to_string(event)?;
        sqlx::query(
            r#"INSERT INTO annual_events (id, family_id, body)
            VALUES ($1, $2, $3)
            ON CONFLICT(id) DO UPDATE SET
                family_id = excluded.family_id,
                body = excluded.body"#,
        )
        .bind(&event.id)
        .bind(&event.family_id)
        .bind(body)
        .execute(self.pool())
        .await?;
        Ok(())
    }

    async fn find_annual_events_for_family(
        &self,
        family_id: &str,
    ) -> Result<Vec<AnnualEvent>, CoreError> {
        let bodies: Vec<String> =
            sqlx::query_scalar("SELECT body FROM annual_events WHERE family_id = $1 ORDER BY id")
                .bind(family_id)
                .fetch_all(self.pool())
                .await?;
        bodies
            .into_iter()
            .map(|b| serde_json::from_str(&b).map_err(CoreError::from))
            .collect()
    }

    async fn delete_annual_event(&self, id: &str) -> Result<(), CoreError> {
        let result = sqlx::query("DELETE FROM annual_events WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await?;
        if result.rows_affected() == 0 {
            return Err(CoreError::NotFound(format!(
                "Annual event with id {} not found",
                id
            )));
        }
        Ok(())
    }
}
