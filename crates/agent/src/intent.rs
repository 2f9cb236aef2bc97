use shopmind_core::domain::conversation::IntentLabel;

/// Ordered keyword rules; the first rule with any matching keyword wins.
///
/// Order is the tie-break: a message mentioning both an order and a product is
/// always an order lookup.
pub const INTENT_RULES: &[(IntentLabel, &[&str])] = &[
    (IntentLabel::OrderLookup, &["order", "tracking", "track", "delivery", "shipped", "where is"]),
    (IntentLabel::ProductInquiry, &["product", "buy", "purchase", "price", "cost", "sell", "have"]),
    (IntentLabel::ReturnRequest, &["return", "refund", "exchange", "cancel"]),
    (IntentLabel::ShippingQuestion, &["shipping", "ship", "deliver", "delivery time"]),
];

/// Deterministic surface-cue classifier over the customer's own text.
///
/// Matching is plain substring containment on the lower-cased message, so
/// `"behave"` matches `"have"`.
#[derive(Clone, Debug, Default)]
pub struct IntentClassifier;

impl IntentClassifier {
    pub fn new() -> Self {
        Self
    }

    pub fn classify(&self, customer_message: &str) -> IntentLabel {
        let normalized = customer_message.to_lowercase();
        INTENT_RULES
            .iter()
            .find(|(_, keywords)| keywords.iter().any(|keyword| normalized.contains(keyword)))
            .map(|(label, _)| *label)
            .unwrap_or(IntentLabel::GeneralQuestion)
    }
}
