use async_trait::async_trait;
use sqlx::Row;

use shopmind_core::domain::conversation::{
    ConversationId, ConversationRecord, ConversationTurn, IntentLabel,
};
use shopmind_core::domain::product::ProductId;
use shopmind_core::domain::store::StoreId;

use super::{
    decode_timestamp, encode_timestamp, ConversationPage, ConversationRepository, RepositoryError,
};
use crate::DbPool;

pub struct SqlConversationRepository {
    pool: DbPool,
}

impl SqlConversationRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_record(row: &sqlx::sqlite::SqliteRow) -> Result<ConversationRecord, RepositoryError> {
    let id: String = row.try_get("id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let store_id: String =
        row.try_get("store_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let customer_identifier: Option<String> =
        row.try_get("customer_identifier").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let customer_message: String =
        row.try_get("customer_message").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let ai_response: String =
        row.try_get("ai_response").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let message_count: i64 =
        row.try_get("message_count").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let products_json: String = row
        .try_get("products_referenced_json")
        .map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let intent: String =
        row.try_get("intent_detected").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let response_time_ms: i64 =
        row.try_get("response_time_ms").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let created_at: String =
        row.try_get("created_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    let products_referenced: Vec<String> = serde_json::from_str(&products_json)
        .map_err(|error| RepositoryError::Decode(error.to_string()))?;

    Ok(ConversationRecord {
        id: ConversationId(id),
        store_id: StoreId(store_id),
        customer_identifier,
        customer_message,
        ai_response,
        message_count: u32::try_from(message_count)
            .map_err(|_| RepositoryError::Decode(format!("invalid message_count {message_count}")))?,
        products_referenced: products_referenced.into_iter().map(ProductId).collect(),
        intent_detected: IntentLabel::parse(&intent).unwrap_or_default(),
        response_time_ms: u64::try_from(response_time_ms).map_err(|_| {
            RepositoryError::Decode(format!("invalid response_time_ms {response_time_ms}"))
        })?,
        created_at: decode_timestamp(&created_at)?,
    })
}

#[async_trait]
impl ConversationRepository for SqlConversationRepository {
    async fn recent_turns(
        &self,
        store_id: &StoreId,
        limit: usize,
    ) -> Result<Vec<ConversationTurn>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT customer_message, ai_response
             FROM conversation
             WHERE store_id = ?
             ORDER BY created_at DESC, rowid DESC
             LIMIT ?",
        )
        .bind(&store_id.0)
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await?;

        let mut turns = rows
            .iter()
            .map(|row| -> Result<ConversationTurn, RepositoryError> {
                Ok(ConversationTurn {
                    customer_message: row
                        .try_get("customer_message")
                        .map_err(|e| RepositoryError::Decode(e.to_string()))?,
                    ai_response: row
                        .try_get("ai_response")
                        .map_err(|e| RepositoryError::Decode(e.to_string()))?,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        turns.reverse();
        Ok(turns)
    }

    async fn append(&self, record: ConversationRecord) -> Result<(), RepositoryError> {
        let products_json = serde_json::to_string(
            &record.products_referenced.iter().map(|id| id.0.as_str()).collect::<Vec<_>>(),
        )
        .map_err(|error| RepositoryError::Decode(error.to_string()))?;

        sqlx::query(
            "INSERT INTO conversation (id, store_id, customer_identifier, customer_message,
                                       ai_response, message_count, products_referenced_json,
                                       intent_detected, response_time_ms, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&record.id.0)
        .bind(&record.store_id.0)
        .bind(&record.customer_identifier)
        .bind(&record.customer_message)
        .bind(&record.ai_response)
        .bind(i64::from(record.message_count))
        .bind(products_json)
        .bind(record.intent_detected.as_str())
        .bind(i64::try_from(record.response_time_ms).unwrap_or(i64::MAX))
        .bind(encode_timestamp(&record.created_at))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_page(
        &self,
        store_id: &StoreId,
        customer_identifier: Option<&str>,
        limit: u32,
        offset: u32,
    ) -> Result<ConversationPage, RepositoryError> {
        let total_count: i64 = sqlx::query_scalar(
            "SELECT COUNT(1) FROM conversation
             WHERE store_id = ?1 AND (?2 IS NULL OR customer_identifier = ?2)",
        )
        .bind(&store_id.0)
        .bind(customer_identifier)
        .fetch_one(&self.pool)
        .await?;

        let rows = sqlx::query(
            "SELECT id, store_id, customer_identifier, customer_message, ai_response,
                    message_count, products_referenced_json, intent_detected,
                    response_time_ms, created_at
             FROM conversation
             WHERE store_id = ?1 AND (?2 IS NULL OR customer_identifier = ?2)
             ORDER BY created_at DESC, rowid DESC
             LIMIT ?3 OFFSET ?4",
        )
        .bind(&store_id.0)
        .bind(customer_identifier)
        .bind(i64::from(limit))
        .bind(i64::from(offset))
        .fetch_all(&self.pool)
        .await?;

        let records = rows.iter().map(row_to_record).collect::<Result<Vec<_>, _>>()?;
        Ok(ConversationPage { records, total_count: total_count.max(0) as u64 })
    }

    async fn clear(&self, store_id: &StoreId) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM conversation WHERE store_id = ?")
            .bind(&store_id.0)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use shopmind_core::domain::conversation::{
        ConversationId, ConversationRecord, ConversationTurn, IntentLabel,
    };
    use shopmind_core::domain::product::ProductId;
    use shopmind_core::domain::store::{StoreId, StoreProfile, Tone};

    use super::SqlConversationRepository;
    use crate::repositories::{ConversationRepository, SqlStoreRepository, StoreRepository};
    use crate::{connect_with_settings, migrations, DbPool};

    async fn pool_with_store(store: &str) -> DbPool {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        SqlStoreRepository::new(pool.clone())
            .save(StoreProfile::new(StoreId(store.to_string()), None, Tone::Friendly))
            .await
            .expect("save store");
        pool
    }

    fn record(index: i64, customer: Option<&str>) -> ConversationRecord {
        ConversationRecord {
            id: ConversationId(format!("conv-{index}")),
            store_id: StoreId("S1".to_string()),
            customer_identifier: customer.map(str::to_string),
            customer_message: format!("question {index}"),
            ai_response: format!("answer {index}"),
            message_count: index as u32,
            products_referenced: vec![ProductId("p1".to_string())],
            intent_detected: IntentLabel::ProductInquiry,
            response_time_ms: 42,
            created_at: Utc.with_ymd_and_hms(2025, 11, 15, 10, 0, 0).single().expect("ts")
                + Duration::seconds(index),
        }
    }

    #[tokio::test]
    async fn recent_turns_are_latest_n_oldest_first() {
        let repo = SqlConversationRepository::new(pool_with_store("S1").await);
        for index in 1..=7 {
            repo.append(record(index, None)).await.expect("append");
        }

        let turns = repo.recent_turns(&StoreId("S1".to_string()), 5).await.expect("turns");

        let messages = turns.iter().map(|t| t.customer_message.as_str()).collect::<Vec<_>>();
        assert_eq!(
            messages,
            vec!["question 3", "question 4", "question 5", "question 6", "question 7"]
        );
        assert_eq!(
            turns[4],
            ConversationTurn {
                customer_message: "question 7".to_string(),
                ai_response: "answer 7".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn append_then_page_round_trips_record_fields() {
        let repo = SqlConversationRepository::new(pool_with_store("S1").await);
        let original = record(1, Some("customer@example.com"));
        repo.append(original.clone()).await.expect("append");

        let page =
            repo.list_page(&StoreId("S1".to_string()), None, 20, 0).await.expect("page");

        assert_eq!(page.total_count, 1);
        assert_eq!(page.records, vec![original]);
    }

    #[tokio::test]
    async fn page_filters_by_customer_and_orders_newest_first() {
        let repo = SqlConversationRepository::new(pool_with_store("S1").await);
        for index in 1..=4 {
            let customer = if index % 2 == 0 { "even@example.com" } else { "odd@example.com" };
            repo.append(record(index, Some(customer))).await.expect("append");
        }
        let store = StoreId("S1".to_string());

        let evens = repo.list_page(&store, Some("even@example.com"), 20, 0).await.expect("page");
        let ids = evens.records.iter().map(|r| r.id.0.as_str()).collect::<Vec<_>>();
        assert_eq!(ids, vec!["conv-4", "conv-2"]);
        assert_eq!(evens.total_count, 2);

        let second_page = repo.list_page(&store, None, 3, 3).await.expect("page");
        assert_eq!(second_page.total_count, 4);
        assert_eq!(second_page.records.len(), 1);
        assert_eq!(second_page.records[0].id.0, "conv-1");
    }

    #[tokio::test]
    async fn clear_removes_only_the_store_history() {
        let pool = pool_with_store("S1").await;
        SqlStoreRepository::new(pool.clone())
            .save(StoreProfile::new(StoreId("S2".to_string()), None, Tone::Casual))
            .await
            .expect("save store");
        let repo = SqlConversationRepository::new(pool);
        repo.append(record(1, None)).await.expect("append");
        let mut other = record(2, None);
        other.store_id = StoreId("S2".to_string());
        repo.append(other).await.expect("append other");

        let removed = repo.clear(&StoreId("S1".to_string())).await.expect("clear");

        assert_eq!(removed, 1);
        assert!(repo.recent_turns(&StoreId("S1".to_string()), 5).await.expect("turns").is_empty());
        assert_eq!(repo.recent_turns(&StoreId("S2".to_string()), 5).await.expect("turns").len(), 1);
    }
}
