//! Shared domain records, configuration, and error taxonomy for shopmind.
//!
//! Nothing here performs network I/O; the catalog port in [`catalog`] is
//! implemented by `shopmind-db` and consumed by `shopmind-agent`.

pub mod catalog;
pub mod config;
pub mod domain;
pub mod errors;

pub use catalog::{CatalogError, CatalogSnapshot, CatalogStore};
pub use domain::analytics::{AnalyticsEvent, EventType};
pub use domain::conversation::{
    validate_customer_message, validate_identifier, ConversationId, ConversationRecord,
    ConversationTurn, IntentLabel, PipelineResult,
};
pub use domain::product::{CatalogItem, Product, ProductId};
pub use domain::store::{StoreId, StoreProfile, Tone};
pub use errors::{ApplicationError, DomainError, InterfaceError};
