use std::sync::Arc;

use shopmind_core::catalog::{CatalogError, CatalogSnapshot, CatalogStore};
use shopmind_core::domain::store::StoreId;

/// Reads a fresh [`CatalogSnapshot`] per request. Nothing is cached between calls.
#[derive(Clone)]
pub struct CatalogSnapshotProvider {
    store: Arc<dyn CatalogStore>,
    product_limit: u32,
}

impl CatalogSnapshotProvider {
    pub fn new(store: Arc<dyn CatalogStore>, product_limit: u32) -> Self {
        Self { store, product_limit }
    }

    pub async fn snapshot(&self, store_id: &StoreId) -> Result<CatalogSnapshot, CatalogError> {
        let profile = self.store.fetch_store_meta(store_id).await?;
        let mut products = self.store.fetch_active_products(store_id, self.product_limit).await?;
        products.truncate(self.product_limit as usize);
        Ok(CatalogSnapshot::new(profile, products))
    }
}
