use async_trait::async_trait;

use shopmind_core::domain::analytics::AnalyticsEvent;
use shopmind_core::domain::store::StoreId;

use super::{encode_timestamp, AnalyticsRepository, RepositoryError};
use crate::DbPool;

pub struct SqlAnalyticsRepository {
    pool: DbPool,
}

impl SqlAnalyticsRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AnalyticsRepository for SqlAnalyticsRepository {
    async fn log_event(&self, event: AnalyticsEvent) -> Result<(), RepositoryError> {
        let event_data = serde_json::to_string(&event.event_data)
            .map_err(|error| RepositoryError::Decode(error.to_string()))?;

        sqlx::query(
            "INSERT INTO analytics_event (id, store_id, event_type, event_data_json, session_id,
                                          customer_identifier, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&event.id)
        .bind(&event.store_id.0)
        .bind(event.event_type.as_str())
        .bind(event_data)
        .bind(&event.session_id)
        .bind(&event.customer_identifier)
        .bind(encode_timestamp(&event.created_at))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn count_events(
        &self,
        store_id: &StoreId,
        event_type: Option<&str>,
    ) -> Result<u64, RepositoryError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(1) FROM analytics_event
             WHERE store_id = ?1 AND (?2 IS NULL OR event_type = ?2)",
        )
        .bind(&store_id.0)
        .bind(event_type)
        .fetch_one(&self.pool)
        .await?;
        Ok(count.max(0) as u64)
    }
}
