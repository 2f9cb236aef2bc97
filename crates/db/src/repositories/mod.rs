use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use thiserror::Error;

use shopmind_core::domain::analytics::AnalyticsEvent;
use shopmind_core::domain::conversation::{ConversationRecord, ConversationTurn};
use shopmind_core::domain::product::{Product, ProductId};
use shopmind_core::domain::store::{StoreId, StoreProfile};

pub mod analytics;
pub mod catalog;
pub mod conversation;
pub mod memory;
pub mod product;

pub use analytics::SqlAnalyticsRepository;
pub use catalog::SqlCatalogStore;
pub use conversation::SqlConversationRepository;
pub use memory::{
    InMemoryAnalyticsRepository, InMemoryCatalogRepository, InMemoryConversationRepository,
};
pub use product::{SqlProductRepository, SqlStoreRepository};

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

/// One page of a store's conversation log, newest first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConversationPage {
    pub records: Vec<ConversationRecord>,
    pub total_count: u64,
}

#[async_trait]
pub trait ConversationRepository: Send + Sync {
    /// Up to `limit` most recent turns for the store, returned oldest-first.
    async fn recent_turns(
        &self,
        store_id: &StoreId,
        limit: usize,
    ) -> Result<Vec<ConversationTurn>, RepositoryError>;

    async fn append(&self, record: ConversationRecord) -> Result<(), RepositoryError>;

    async fn list_page(
        &self,
        store_id: &StoreId,
        customer_identifier: Option<&str>,
        limit: u32,
        offset: u32,
    ) -> Result<ConversationPage, RepositoryError>;

    /// Removes every conversation for the store and returns how many were deleted.
    async fn clear(&self, store_id: &StoreId) -> Result<u64, RepositoryError>;
}

#[async_trait]
pub trait AnalyticsRepository: Send + Sync {
    async fn log_event(&self, event: AnalyticsEvent) -> Result<(), RepositoryError>;

    async fn count_events(
        &self,
        store_id: &StoreId,
        event_type: Option<&str>,
    ) -> Result<u64, RepositoryError>;
}

#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Products matching `ids`, in the order the ids were given. Unknown ids are skipped.
    async fn find_by_ids(
        &self,
        store_id: &StoreId,
        ids: &[ProductId],
    ) -> Result<Vec<Product>, RepositoryError>;

    async fn save(&self, store_id: &StoreId, product: Product) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait StoreRepository: Send + Sync {
    async fn find_by_id(&self, id: &StoreId) -> Result<Option<StoreProfile>, RepositoryError>;
    async fn save(&self, store: StoreProfile) -> Result<(), RepositoryError>;
}

pub(crate) fn encode_timestamp(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn decode_timestamp(value: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|error| RepositoryError::Decode(format!("invalid timestamp `{value}`: {error}")))
}
