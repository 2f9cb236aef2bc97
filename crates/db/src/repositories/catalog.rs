use async_trait::async_trait;
use sqlx::Row;

use shopmind_core::catalog::{CatalogError, CatalogStore};
use shopmind_core::domain::product::{CatalogItem, ProductId};
use shopmind_core::domain::store::{StoreId, StoreProfile};

use super::product::{decode_price, row_to_store};
use super::RepositoryError;
use crate::DbPool;

/// Catalog reads for the response pipeline. Active products come back in insertion order.
#[derive(Clone)]
pub struct SqlCatalogStore {
    pool: DbPool,
}

impl SqlCatalogStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn backend(error: impl Into<RepositoryError>) -> CatalogError {
    CatalogError::Backend(error.into().to_string())
}

fn row_to_item(row: &sqlx::sqlite::SqliteRow) -> Result<CatalogItem, RepositoryError> {
    let id: String = row.try_get("id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let name: String = row.try_get("name").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let price: String =
        row.try_get("price").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let description: Option<String> =
        row.try_get("description").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let category: Option<String> =
        row.try_get("category").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    Ok(CatalogItem {
        id: ProductId(id),
        name,
        price: decode_price(&price)?,
        description: description.unwrap_or_default(),
        category,
    })
}

#[async_trait]
impl CatalogStore for SqlCatalogStore {
    async fn fetch_store_meta(&self, store_id: &StoreId) -> Result<StoreProfile, CatalogError> {
        let row = sqlx::query("SELECT id, name, ai_tone FROM store WHERE id = ?")
            .bind(&store_id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)?;

        match row {
            Some(ref r) => row_to_store(r).map_err(backend),
            None => Err(CatalogError::StoreNotFound(store_id.clone())),
        }
    }

    async fn fetch_active_products(
        &self,
        store_id: &StoreId,
        limit: u32,
    ) -> Result<Vec<CatalogItem>, CatalogError> {
        let rows = sqlx::query(
            "SELECT id, name, price, description, category
             FROM product
             WHERE store_id = ? AND is_active = 1
             ORDER BY rowid
             LIMIT ?",
        )
        .bind(&store_id.0)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;

        rows.iter().map(row_to_item).collect::<Result<Vec<_>, _>>().map_err(backend)
    }
}

#[cfg(test)]
mod tests {
    use shopmind_core::catalog::{CatalogError, CatalogStore};
    use shopmind_core::domain::store::{StoreId, Tone};

    use super::SqlCatalogStore;
    use crate::fixtures::{DemoStoreSeed, DEMO_STORE_ID};
    use crate::{connect_with_settings, migrations};

    async fn seeded_store() -> SqlCatalogStore {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        DemoStoreSeed::load(&pool).await.expect("seed");
        SqlCatalogStore::new(pool)
    }

    #[tokio::test]
    async fn store_meta_resolves_persona() {
        let store = seeded_store().await;
        let profile =
            store.fetch_store_meta(&StoreId(DEMO_STORE_ID.to_string())).await.expect("meta");

        assert_eq!(profile.display_name, "Gadget Barn");
        assert_eq!(profile.tone, Tone::Friendly);
    }

    #[tokio::test]
    async fn unknown_store_is_distinguishable_from_backend_failure() {
        let store = seeded_store().await;
        let error = store
            .fetch_store_meta(&StoreId("missing".to_string()))
            .await
            .expect_err("unknown store");

        assert_eq!(error, CatalogError::StoreNotFound(StoreId("missing".to_string())));
    }

    #[tokio::test]
    async fn active_products_only_in_insertion_order_and_limited() {
        let store = seeded_store().await;
        let store_id = StoreId(DEMO_STORE_ID.to_string());

        let all = store.fetch_active_products(&store_id, 100).await.expect("products");
        let ids = all.iter().map(|item| item.id.0.as_str()).collect::<Vec<_>>();
        assert_eq!(ids, vec!["prod-headphones", "prod-speaker", "prod-charger", "prod-cable"]);
        assert_eq!(all[2].description, "");

        let limited = store.fetch_active_products(&store_id, 2).await.expect("products");
        assert_eq!(limited.len(), 2);
    }
}
