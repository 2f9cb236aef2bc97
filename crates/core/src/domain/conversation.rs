use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::product::ProductId;
use crate::domain::store::StoreId;
use crate::errors::DomainError;

pub const MAX_CUSTOMER_MESSAGE_CHARS: usize = 2000;
pub const MAX_IDENTIFIER_CHARS: usize = 255;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConversationId(pub String);

/// One prior exchange, supplied oldest first.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub customer_message: String,
    pub ai_response: String,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentLabel {
    ProductInquiry,
    OrderLookup,
    ReturnRequest,
    ShippingQuestion,
    #[default]
    GeneralQuestion,
}

impl IntentLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ProductInquiry => "product_inquiry",
            Self::OrderLookup => "order_lookup",
            Self::ReturnRequest => "return_request",
            Self::ShippingQuestion => "shipping_question",
            Self::GeneralQuestion => "general_question",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "product_inquiry" => Some(Self::ProductInquiry),
            "order_lookup" => Some(Self::OrderLookup),
            "return_request" => Some(Self::ReturnRequest),
            "shipping_question" => Some(Self::ShippingQuestion),
            "general_question" => Some(Self::GeneralQuestion),
            _ => None,
        }
    }
}

impl std::fmt::Display for IntentLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sole output of one pipeline invocation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineResult {
    pub ai_response: String,
    pub intent_detected: IntentLabel,
    pub products_referenced: Vec<ProductId>,
    pub response_time_ms: u64,
}

/// A persisted exchange: the pipeline result plus the caller-side metadata.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationRecord {
    pub id: ConversationId,
    pub store_id: StoreId,
    pub customer_identifier: Option<String>,
    pub customer_message: String,
    pub ai_response: String,
    pub message_count: u32,
    pub products_referenced: Vec<ProductId>,
    pub intent_detected: IntentLabel,
    pub response_time_ms: u64,
    pub created_at: DateTime<Utc>,
}

impl ConversationRecord {
    pub fn from_result(
        store_id: StoreId,
        customer_identifier: Option<String>,
        customer_message: String,
        prior_turns: usize,
        result: &PipelineResult,
    ) -> Self {
        Self {
            id: ConversationId(uuid::Uuid::new_v4().to_string()),
            store_id,
            customer_identifier,
            customer_message,
            ai_response: result.ai_response.clone(),
            message_count: u32::try_from(prior_turns).unwrap_or(u32::MAX).saturating_add(1),
            products_referenced: result.products_referenced.clone(),
            intent_detected: result.intent_detected,
            response_time_ms: result.response_time_ms,
            created_at: Utc::now(),
        }
    }

    pub fn as_turn(&self) -> ConversationTurn {
        ConversationTurn {
            customer_message: self.customer_message.clone(),
            ai_response: self.ai_response.clone(),
        }
    }
}

pub fn validate_customer_message(message: &str) -> Result<(), DomainError> {
    let length = message.chars().count();
    if length == 0 {
        return Err(DomainError::InvalidCustomerMessage(
            "message must not be empty".to_string(),
        ));
    }
    if length > MAX_CUSTOMER_MESSAGE_CHARS {
        return Err(DomainError::InvalidCustomerMessage(format!(
            "message must be at most {MAX_CUSTOMER_MESSAGE_CHARS} characters (got {length})"
        )));
    }
    Ok(())
}

/// Customer and session identifiers are optional but bounded.
pub fn validate_identifier(field: &'static str, value: Option<&str>) -> Result<(), DomainError> {
    match value {
        Some(value) if value.chars().count() > MAX_IDENTIFIER_CHARS => {
            Err(DomainError::InvalidField {
                field,
                reason: format!("must be at most {MAX_IDENTIFIER_CHARS} characters"),
            })
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::{
        validate_customer_message, validate_identifier, ConversationRecord, IntentLabel,
        PipelineResult, MAX_CUSTOMER_MESSAGE_CHARS, MAX_IDENTIFIER_CHARS,
    };
    use crate::errors::DomainError;
    use crate::domain::product::ProductId;
    use crate::domain::store::StoreId;

    #[test]
    fn intent_labels_parse_their_own_wire_names() {
        for label in [
            IntentLabel::ProductInquiry,
            IntentLabel::OrderLookup,
            IntentLabel::ReturnRequest,
            IntentLabel::ShippingQuestion,
            IntentLabel::GeneralQuestion,
        ] {
            assert_eq!(IntentLabel::parse(label.as_str()), Some(label));
        }
        assert_eq!(IntentLabel::parse("complaint"), None);
    }

    #[test]
    fn customer_message_length_is_bounded() {
        assert!(validate_customer_message("").is_err());
        assert!(validate_customer_message("hi").is_ok());
        assert!(validate_customer_message(&"x".repeat(MAX_CUSTOMER_MESSAGE_CHARS)).is_ok());
        assert!(validate_customer_message(&"x".repeat(MAX_CUSTOMER_MESSAGE_CHARS + 1)).is_err());
    }

    #[test]
    fn identifiers_are_optional_but_bounded() {
        assert!(validate_identifier("session_id", None).is_ok());
        assert!(validate_identifier("session_id", Some("sess_abc123")).is_ok());
        let error = validate_identifier(
            "customer_identifier",
            Some(&"c".repeat(MAX_IDENTIFIER_CHARS + 1)),
        )
        .expect_err("too long");
        assert!(matches!(error, DomainError::InvalidField { field: "customer_identifier", .. }));
    }

    #[test]
    fn record_counts_the_new_message_after_prior_turns() {
        let result = PipelineResult {
            ai_response: "We have Desk Lamp.".to_string(),
            intent_detected: IntentLabel::ProductInquiry,
            products_referenced: vec![ProductId("p1".to_string())],
            response_time_ms: 12,
        };

        let record = ConversationRecord::from_result(
            StoreId("S1".to_string()),
            None,
            "lamps?".to_string(),
            3,
            &result,
        );

        assert_eq!(record.message_count, 4);
        assert_eq!(record.products_referenced, result.products_referenced);
        assert_eq!(record.as_turn().ai_response, "We have Desk Lamp.");
    }
}
