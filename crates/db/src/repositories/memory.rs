use std::collections::HashMap;

use tokio::sync::RwLock;

use shopmind_core::catalog::{CatalogError, CatalogStore};
use shopmind_core::domain::analytics::AnalyticsEvent;
use shopmind_core::domain::conversation::{ConversationRecord, ConversationTurn};
use shopmind_core::domain::product::{CatalogItem, Product, ProductId};
use shopmind_core::domain::store::{StoreId, StoreProfile};

use super::{
    AnalyticsRepository, ConversationPage, ConversationRepository, ProductRepository,
    RepositoryError, StoreRepository,
};

/// Stores and their products, insertion-ordered per store.
#[derive(Default)]
pub struct InMemoryCatalogRepository {
    stores: RwLock<HashMap<String, StoreProfile>>,
    products: RwLock<HashMap<String, Vec<Product>>>,
}

#[async_trait::async_trait]
impl StoreRepository for InMemoryCatalogRepository {
    async fn find_by_id(&self, id: &StoreId) -> Result<Option<StoreProfile>, RepositoryError> {
        let stores = self.stores.read().await;
        Ok(stores.get(&id.0).cloned())
    }

    async fn save(&self, store: StoreProfile) -> Result<(), RepositoryError> {
        let mut stores = self.stores.write().await;
        stores.insert(store.id.0.clone(), store);
        Ok(())
    }
}

#[async_trait::async_trait]
impl ProductRepository for InMemoryCatalogRepository {
    async fn find_by_ids(
        &self,
        store_id: &StoreId,
        ids: &[ProductId],
    ) -> Result<Vec<Product>, RepositoryError> {
        let products = self.products.read().await;
        let Some(catalog) = products.get(&store_id.0) else {
            return Ok(Vec::new());
        };
        Ok(ids
            .iter()
            .filter_map(|id| catalog.iter().find(|product| &product.id == id).cloned())
            .collect())
    }

    async fn save(&self, store_id: &StoreId, product: Product) -> Result<(), RepositoryError> {
        let mut products = self.products.write().await;
        let catalog = products.entry(store_id.0.clone()).or_default();
        match catalog.iter_mut().find(|existing| existing.id == product.id) {
            Some(existing) => *existing = product,
            None => catalog.push(product),
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl CatalogStore for InMemoryCatalogRepository {
    async fn fetch_store_meta(&self, store_id: &StoreId) -> Result<StoreProfile, CatalogError> {
        let stores = self.stores.read().await;
        stores.get(&store_id.0).cloned().ok_or_else(|| CatalogError::StoreNotFound(store_id.clone()))
    }

    async fn fetch_active_products(
        &self,
        store_id: &StoreId,
        limit: u32,
    ) -> Result<Vec<CatalogItem>, CatalogError> {
        let products = self.products.read().await;
        Ok(products
            .get(&store_id.0)
            .map(|catalog| {
                catalog
                    .iter()
                    .filter(|product| product.active)
                    .take(limit as usize)
                    .map(Product::as_catalog_item)
                    .collect()
            })
            .unwrap_or_default())
    }
}

#[derive(Default)]
pub struct InMemoryConversationRepository {
    records: RwLock<Vec<ConversationRecord>>,
}

impl InMemoryConversationRepository {
    pub async fn records(&self) -> Vec<ConversationRecord> {
        self.records.read().await.clone()
    }
}

#[async_trait::async_trait]
impl ConversationRepository for InMemoryConversationRepository {
    async fn recent_turns(
        &self,
        store_id: &StoreId,
        limit: usize,
    ) -> Result<Vec<ConversationTurn>, RepositoryError> {
        let records = self.records.read().await;
        let mut turns = records
            .iter()
            .rev()
            .filter(|record| record.store_id == *store_id)
            .take(limit)
            .map(ConversationRecord::as_turn)
            .collect::<Vec<_>>();
        turns.reverse();
        Ok(turns)
    }

    async fn append(&self, record: ConversationRecord) -> Result<(), RepositoryError> {
        let mut records = self.records.write().await;
        records.push(record);
        Ok(())
    }

    async fn list_page(
        &self,
        store_id: &StoreId,
        customer_identifier: Option<&str>,
        limit: u32,
        offset: u32,
    ) -> Result<ConversationPage, RepositoryError> {
        let records = self.records.read().await;
        let matching = records
            .iter()
            .rev()
            .filter(|record| record.store_id == *store_id)
            .filter(|record| {
                customer_identifier
                    .map_or(true, |customer| record.customer_identifier.as_deref() == Some(customer))
            })
            .collect::<Vec<_>>();

        Ok(ConversationPage {
            total_count: matching.len() as u64,
            records: matching
                .into_iter()
                .skip(offset as usize)
                .take(limit as usize)
                .cloned()
                .collect(),
        })
    }

    async fn clear(&self, store_id: &StoreId) -> Result<u64, RepositoryError> {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|record| record.store_id != *store_id);
        Ok((before - records.len()) as u64)
    }
}

#[derive(Default)]
pub struct InMemoryAnalyticsRepository {
    events: RwLock<Vec<AnalyticsEvent>>,
}

impl InMemoryAnalyticsRepository {
    pub async fn events(&self) -> Vec<AnalyticsEvent> {
        self.events.read().await.clone()
    }
}

#[async_trait::async_trait]
impl AnalyticsRepository for InMemoryAnalyticsRepository {
    async fn log_event(&self, event: AnalyticsEvent) -> Result<(), RepositoryError> {
        let mut events = self.events.write().await;
        events.push(event);
        Ok(())
    }

    async fn count_events(
        &self,
        store_id: &StoreId,
        event_type: Option<&str>,
    ) -> Result<u64, RepositoryError> {
        let events = self.events.read().await;
        Ok(events
            .iter()
            .filter(|event| event.store_id == *store_id)
            .filter(|event| event_type.map_or(true, |kind| event.event_type.as_str() == kind))
            .count() as u64)
    }
}
