//! Catalog snapshot records and the store-side port the response pipeline reads through.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::product::{CatalogItem, ProductId};
use crate::domain::store::{StoreId, StoreProfile, Tone};

/// Immutable read of one store's persona settings and active products.
///
/// Built fresh for every pipeline invocation and never mutated afterwards.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogSnapshot {
    pub store_display_name: String,
    pub tone: Tone,
    pub products: Vec<CatalogItem>,
}

impl CatalogSnapshot {
    pub fn new(profile: StoreProfile, products: Vec<CatalogItem>) -> Self {
        Self { store_display_name: profile.display_name, tone: profile.tone, products }
    }

    pub fn contains(&self, product_id: &ProductId) -> bool {
        self.products.iter().any(|item| &item.id == product_id)
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("store `{0}` was not found")]
    StoreNotFound(StoreId),
    #[error("catalog store failure: {0}")]
    Backend(String),
}

#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Fails with [`CatalogError::StoreNotFound`] when the id does not resolve.
    async fn fetch_store_meta(&self, store_id: &StoreId) -> Result<StoreProfile, CatalogError>;

    /// Active products in the store's default ordering, at most `limit` of them.
    async fn fetch_active_products(
        &self,
        store_id: &StoreId,
        limit: u32,
    ) -> Result<Vec<CatalogItem>, CatalogError>;
}
