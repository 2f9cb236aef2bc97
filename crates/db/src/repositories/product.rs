use std::str::FromStr;

use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::Row;

use shopmind_core::domain::product::{Product, ProductId};
use shopmind_core::domain::store::{StoreId, StoreProfile, Tone};

use super::{encode_timestamp, ProductRepository, RepositoryError, StoreRepository};
use crate::DbPool;

pub struct SqlProductRepository {
    pool: DbPool,
}

impl SqlProductRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

pub(crate) fn decode_price(value: &str) -> Result<Decimal, RepositoryError> {
    Decimal::from_str(value.trim())
        .map_err(|error| RepositoryError::Decode(format!("invalid price `{value}`: {error}")))
}

fn row_to_product(row: &sqlx::sqlite::SqliteRow) -> Result<Product, RepositoryError> {
    let id: String = row.try_get("id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let name: String = row.try_get("name").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let price: String =
        row.try_get("price").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let description: Option<String> =
        row.try_get("description").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let category: Option<String> =
        row.try_get("category").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let image_url: Option<String> =
        row.try_get("image_url").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let is_active: i64 =
        row.try_get("is_active").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    Ok(Product {
        id: ProductId(id),
        name,
        price: decode_price(&price)?,
        description: description.unwrap_or_default(),
        category,
        image_url,
        active: is_active != 0,
    })
}

#[async_trait::async_trait]
impl ProductRepository for SqlProductRepository {
    async fn find_by_ids(
        &self,
        store_id: &StoreId,
        ids: &[ProductId],
    ) -> Result<Vec<Product>, RepositoryError> {
        let mut products = Vec::with_capacity(ids.len());
        for id in ids {
            let row = sqlx::query(
                "SELECT id, name, price, description, category, image_url, is_active
                 FROM product WHERE id = ? AND store_id = ?",
            )
            .bind(&id.0)
            .bind(&store_id.0)
            .fetch_optional(&self.pool)
            .await?;

            if let Some(ref row) = row {
                products.push(row_to_product(row)?);
            }
        }
        Ok(products)
    }

    async fn save(&self, store_id: &StoreId, product: Product) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO product (id, store_id, name, price, description, category, image_url,
                                  is_active, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                 name = excluded.name,
                 price = excluded.price,
                 description = excluded.description,
                 category = excluded.category,
                 image_url = excluded.image_url,
                 is_active = excluded.is_active",
        )
        .bind(&product.id.0)
        .bind(&store_id.0)
        .bind(&product.name)
        .bind(product.price.to_string())
        .bind(&product.description)
        .bind(&product.category)
        .bind(&product.image_url)
        .bind(i64::from(product.active))
        .bind(encode_timestamp(&Utc::now()))
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

pub struct SqlStoreRepository {
    pool: DbPool,
}

impl SqlStoreRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

pub(crate) fn row_to_store(row: &sqlx::sqlite::SqliteRow) -> Result<StoreProfile, RepositoryError> {
    let id: String = row.try_get("id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let name: Option<String> =
        row.try_get("name").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let tone: Option<String> =
        row.try_get("ai_tone").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    Ok(StoreProfile::new(StoreId(id), name, Tone::from_setting(tone.as_deref())))
}

#[async_trait::async_trait]
impl StoreRepository for SqlStoreRepository {
    async fn find_by_id(&self, id: &StoreId) -> Result<Option<StoreProfile>, RepositoryError> {
        let row = sqlx::query("SELECT id, name, ai_tone FROM store WHERE id = ?")
            .bind(&id.0)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(ref r) => Ok(Some(row_to_store(r)?)),
            None => Ok(None),
        }
    }

    async fn save(&self, store: StoreProfile) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO store (id, name, ai_tone, created_at)
             VALUES (?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                 name = excluded.name,
                 ai_tone = excluded.ai_tone",
        )
        .bind(&store.id.0)
        .bind(&store.display_name)
        .bind(store.tone.as_str())
        .bind(encode_timestamp(&Utc::now()))
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use shopmind_core::domain::product::{Product, ProductId};
    use shopmind_core::domain::store::{StoreId, StoreProfile, Tone};

    use super::{SqlProductRepository, SqlStoreRepository};
    use crate::repositories::{ProductRepository, StoreRepository};
    use crate::{connect_with_settings, migrations};

    fn product(id: &str, name: &str) -> Product {
        Product {
            id: ProductId(id.to_string()),
            name: name.to_string(),
            price: Decimal::new(12999, 2),
            description: "Over-ear".to_string(),
            category: Some("Electronics".to_string()),
            image_url: None,
            active: true,
        }
    }

    #[tokio::test]
    async fn find_by_ids_preserves_requested_order_and_skips_unknown() {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        let store_id = StoreId("S1".to_string());
        SqlStoreRepository::new(pool.clone())
            .save(StoreProfile::new(store_id.clone(), Some("Shop".to_string()), Tone::Casual))
            .await
            .expect("save store");

        let repo = SqlProductRepository::new(pool);
        repo.save(&store_id, product("p1", "Headphones")).await.expect("save p1");
        repo.save(&store_id, product("p2", "Speaker")).await.expect("save p2");

        let found = repo
            .find_by_ids(
                &store_id,
                &[ProductId("p2".to_string()), ProductId("nope".to_string()), ProductId("p1".to_string())],
            )
            .await
            .expect("find");

        let names = found.iter().map(|p| p.name.as_str()).collect::<Vec<_>>();
        assert_eq!(names, vec!["Speaker", "Headphones"]);
        assert_eq!(found[1].price, Decimal::new(12999, 2));
    }

    #[tokio::test]
    async fn products_are_scoped_to_their_store() {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        let stores = SqlStoreRepository::new(pool.clone());
        for id in ["S1", "S2"] {
            stores
                .save(StoreProfile::new(StoreId(id.to_string()), None, Tone::Friendly))
                .await
                .expect("save store");
        }
        let repo = SqlProductRepository::new(pool);
        repo.save(&StoreId("S1".to_string()), product("p1", "Headphones")).await.expect("save");

        let found = repo
            .find_by_ids(&StoreId("S2".to_string()), &[ProductId("p1".to_string())])
            .await
            .expect("find");
        assert!(found.is_empty());
    }

    #[tokio::test]
    async fn store_round_trip_keeps_tone_and_defaults_name() {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        let repo = SqlStoreRepository::new(pool);
        let store = StoreProfile::new(StoreId("S1".to_string()), None, Tone::Energetic);

        repo.save(store.clone()).await.expect("save");
        let found = repo.find_by_id(&store.id).await.expect("find");

        assert_eq!(found, Some(store));
        assert_eq!(repo.find_by_id(&StoreId("missing".to_string())).await.expect("find"), None);
    }
}
