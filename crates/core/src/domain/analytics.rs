use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::store::StoreId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    QuestionAsked,
    ProductView,
    OrderLookup,
    ConversationStarted,
    ConversationEnded,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::QuestionAsked => "question_asked",
            Self::ProductView => "product_view",
            Self::OrderLookup => "order_lookup",
            Self::ConversationStarted => "conversation_started",
            Self::ConversationEnded => "conversation_ended",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "question_asked" => Some(Self::QuestionAsked),
            "product_view" => Some(Self::ProductView),
            "order_lookup" => Some(Self::OrderLookup),
            "conversation_started" => Some(Self::ConversationStarted),
            "conversation_ended" => Some(Self::ConversationEnded),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsEvent {
    pub id: String,
    pub store_id: StoreId,
    pub event_type: EventType,
    pub event_data: Value,
    pub session_id: Option<String>,
    pub customer_identifier: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl AnalyticsEvent {
    pub fn new(
        store_id: StoreId,
        event_type: EventType,
        event_data: Value,
        session_id: Option<String>,
        customer_identifier: Option<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            store_id,
            event_type,
            event_data,
            session_id,
            customer_identifier,
            created_at: Utc::now(),
        }
    }
}
