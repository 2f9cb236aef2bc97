use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProductId(pub String);

impl std::fmt::Display for ProductId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Point-in-time read of an active product, as handed to the response pipeline.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: ProductId,
    pub name: String,
    pub price: Decimal,
    pub description: String,
    pub category: Option<String>,
}

/// Full product row, used when rendering product cards for the chat client.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: Decimal,
    pub description: String,
    pub category: Option<String>,
    pub image_url: Option<String>,
    pub active: bool,
}

impl Product {
    pub fn as_catalog_item(&self) -> CatalogItem {
        CatalogItem {
            id: self.id.clone(),
            name: self.name.clone(),
            price: self.price,
            description: self.description.clone(),
            category: self.category.clone(),
        }
    }
}
