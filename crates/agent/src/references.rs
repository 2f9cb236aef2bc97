use std::collections::BTreeSet;

use shopmind_core::config::ChatConfig;
use shopmind_core::domain::product::{CatalogItem, ProductId};

/// Finds which catalog items a generated reply actually names.
///
/// A product is referenced when its lower-cased name is a substring of the
/// lower-cased reply. No word boundaries are enforced, so short names can
/// match inside unrelated words.
#[derive(Clone, Debug)]
pub struct ReferenceExtractor {
    max_references: usize,
}

impl Default for ReferenceExtractor {
    fn default() -> Self {
        Self::from_config(&ChatConfig::default())
    }
}

impl ReferenceExtractor {
    pub fn new(max_references: usize) -> Self {
        Self { max_references }
    }

    pub fn from_config(chat: &ChatConfig) -> Self {
        Self::new(chat.max_references)
    }

    /// Ids in catalog order, deduplicated, at most `max_references` of them.
    pub fn extract(&self, response_text: &str, catalog: &[CatalogItem]) -> Vec<ProductId> {
        let normalized_response = response_text.to_lowercase();
        let mut seen = BTreeSet::new();
        let mut referenced = Vec::new();

        for item in catalog {
            if referenced.len() >= self.max_references {
                break;
            }
            let name = item.name.to_lowercase();
            if name.trim().is_empty() || !normalized_response.contains(&name) {
                continue;
            }
            if seen.insert(item.id.clone()) {
                referenced.push(item.id.clone());
            }
        }

        referenced
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use shopmind_core::domain::product::{CatalogItem, ProductId};

    use super::ReferenceExtractor;

    fn item(id: &str, name: &str) -> CatalogItem {
        CatalogItem {
            id: ProductId(id.to_string()),
            name: name.to_string(),
            price: Decimal::new(500, 2),
            description: String::new(),
            category: None,
        }
    }

    fn ids(values: &[&str]) -> Vec<ProductId> {
        values.iter().map(|value| ProductId(value.to_string())).collect()
    }

    #[test]
    fn matches_names_case_insensitively() {
        let catalog = vec![item("p1", "Wireless Headphones"), item("p2", "Desk Lamp")];
        let found = ReferenceExtractor::default()
            .extract("Yes! We have WIRELESS headphones in stock.", &catalog);

        assert_eq!(found, ids(&["p1"]));
    }

    #[test]
    fn caps_at_five_in_catalog_order() {
        let catalog = (1..=7).map(|n| item(&format!("p{n}"), &format!("Gizmo {n}"))).collect::<Vec<_>>();
        let reply = "Try Gizmo 6, Gizmo 5, Gizmo 4, Gizmo 3, Gizmo 2 or Gizmo 1.";

        let found = ReferenceExtractor::default().extract(reply, &catalog);

        assert_eq!(found, ids(&["p1", "p2", "p3", "p4", "p5"]));
    }

    #[test]
    fn never_returns_ids_outside_the_catalog_and_skips_blank_names() {
        let catalog = vec![item("p1", ""), item("p2", "  "), item("p3", "Mug")];
        let found = ReferenceExtractor::default().extract("A mug and a teapot", &catalog);

        assert_eq!(found, ids(&["p3"]));
        assert!(found.iter().all(|id| catalog.iter().any(|item| &item.id == id)));
    }

    #[test]
    fn duplicate_ids_in_catalog_are_reported_once() {
        let catalog = vec![item("p1", "Mug"), item("p1", "Coffee Mug")];
        let found = ReferenceExtractor::default().extract("coffee mug", &catalog);

        assert_eq!(found, ids(&["p1"]));
    }

    #[test]
    fn short_names_match_inside_longer_words() {
        let catalog = vec![item("p1", "Pen")];
        let found = ReferenceExtractor::default().extract("Happy to help with your spending plan", &catalog);

        assert_eq!(found, ids(&["p1"]));
    }
}
