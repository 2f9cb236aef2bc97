pub mod analytics;
pub mod conversation;
pub mod product;
pub mod store;
