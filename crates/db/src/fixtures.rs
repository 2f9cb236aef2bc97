use crate::connection::DbPool;
use crate::repositories::RepositoryError;

pub const DEMO_STORE_ID: &str = "store-demo-001";

const DEMO_ACTIVE_PRODUCT_IDS: &[&str] =
    &["prod-headphones", "prod-speaker", "prod-charger", "prod-cable"];

/// Deterministic demo store: one friendly-toned store, four active products and one retired.
pub struct DemoStoreSeed;

impl DemoStoreSeed {
    pub const SQL: &str = include_str!("../../../config/fixtures/demo_store.sql");

    /// Loads the demo rows. Re-running is a no-op for rows that already exist.
    pub async fn load(pool: &DbPool) -> Result<SeedResult, RepositoryError> {
        let mut tx = pool.begin().await?;
        sqlx::raw_sql(Self::SQL).execute(&mut *tx).await?;
        tx.commit().await?;

        let active_products: i64 = sqlx::query_scalar(
            "SELECT COUNT(1) FROM product WHERE store_id = ?1 AND is_active = 1",
        )
        .bind(DEMO_STORE_ID)
        .fetch_one(pool)
        .await?;

        Ok(SeedResult { store_id: DEMO_STORE_ID, active_products: active_products.max(0) as u64 })
    }

    /// True when the demo store and every expected active product are present.
    pub async fn verify(pool: &DbPool) -> Result<bool, RepositoryError> {
        let store_exists: i64 =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM store WHERE id = ?1)")
                .bind(DEMO_STORE_ID)
                .fetch_one(pool)
                .await?;
        if store_exists != 1 {
            return Ok(false);
        }

        for product_id in DEMO_ACTIVE_PRODUCT_IDS {
            let present: i64 = sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM product WHERE id = ?1 AND store_id = ?2 AND is_active = 1)",
            )
            .bind(product_id)
            .bind(DEMO_STORE_ID)
            .fetch_one(pool)
            .await?;
            if present != 1 {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SeedResult {
    pub store_id: &'static str,
    pub active_products: u64,
}
