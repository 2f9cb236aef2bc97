use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{SecondsFormat, Utc};
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};

use shopmind_agent::ResponsePipeline;
use shopmind_core::domain::analytics::{AnalyticsEvent, EventType};
use shopmind_core::domain::conversation::{
    validate_customer_message, validate_identifier, ConversationRecord,
};
use shopmind_core::domain::product::Product;
use shopmind_core::domain::store::StoreId;
use shopmind_core::errors::{ApplicationError, DomainError, InterfaceError};
use shopmind_db::{AnalyticsRepository, ConversationRepository, ProductRepository, RepositoryError};

pub const MAX_PRODUCT_CARDS: usize = 3;
pub const CARD_DESCRIPTION_CHARS: usize = 200;
pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;

#[derive(Clone)]
pub struct ChatState {
    pub pipeline: ResponsePipeline,
    pub conversations: Arc<dyn ConversationRepository>,
    pub analytics: Arc<dyn AnalyticsRepository>,
    pub products: Arc<dyn ProductRepository>,
    pub history_turns: usize,
}

pub fn router(state: ChatState) -> Router {
    Router::new()
        .route("/api/v1/stores/{store_id}/chat/message", post(send_message))
        .route(
            "/api/v1/stores/{store_id}/chat/history",
            get(chat_history).delete(clear_history),
        )
        .with_state(state)
}

#[derive(Clone, Debug, Deserialize)]
pub struct ChatMessageRequest {
    pub message: String,
    #[serde(default)]
    pub customer_identifier: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ProductCard {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub category: Option<String>,
    pub image_url: Option<String>,
}

impl ProductCard {
    fn from_product(product: &Product) -> Self {
        Self {
            id: product.id.0.clone(),
            name: product.name.clone(),
            description: product.description.chars().take(CARD_DESCRIPTION_CHARS).collect(),
            price: product.price.to_f64().unwrap_or_default(),
            category: product.category.clone(),
            image_url: product.image_url.clone(),
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct ChatMessageData {
    pub id: String,
    pub customer_message: String,
    pub ai_response: String,
    pub products: Vec<ProductCard>,
    pub intent_detected: String,
    pub response_time_ms: u64,
}

#[derive(Clone, Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
    pub customer_identifier: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct HistoryEntry {
    pub id: String,
    pub message: String,
    pub response: String,
    pub timestamp: String,
    pub customer_identifier: Option<String>,
    pub intent_detected: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct HistoryPage {
    pub conversations: Vec<HistoryEntry>,
    pub total_count: u64,
    pub page: u32,
    pub page_size: u32,
    pub has_more: bool,
}

#[derive(Clone, Debug, Serialize)]
pub struct ApiEnvelope<T> {
    pub success: bool,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub timestamp: String,
}

impl<T> ApiEnvelope<T> {
    fn ok(data: T) -> Self {
        Self { success: true, data, message: None, timestamp: timestamp() }
    }
}

fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn correlation_id() -> String {
    format!("req-{}", uuid::Uuid::new_v4())
}

/// Interface error rendered as `{ success: false, error: {..} }`.
#[derive(Debug)]
pub struct ApiError(pub InterfaceError);

impl ApiError {
    fn new(error: impl Into<ApplicationError>, correlation_id: &str) -> Self {
        Self(error.into().into_interface(correlation_id))
    }

    pub fn status(&self) -> StatusCode {
        match self.0 {
            InterfaceError::BadRequest { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            InterfaceError::NotFound { .. } => StatusCode::NOT_FOUND,
            InterfaceError::Upstream { .. } => StatusCode::BAD_GATEWAY,
            InterfaceError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            InterfaceError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error = &self.0;
        warn!(
            event_name = "chat.request.failed",
            correlation_id = error.correlation_id(),
            code = error.code(),
            status_code = status.as_u16(),
            error = %error,
            "chat request failed"
        );

        let detail = match error {
            InterfaceError::BadRequest { message, .. } | InterfaceError::NotFound { message, .. } => {
                Some(message.clone())
            }
            _ => None,
        };
        let body = json!({
            "success": false,
            "error": {
                "code": error.code(),
                "message": error.user_message(),
                "detail": detail,
                "correlation_id": error.correlation_id(),
            },
            "timestamp": timestamp(),
        });
        (status, Json(body)).into_response()
    }
}

fn persistence(error: RepositoryError) -> ApplicationError {
    ApplicationError::Persistence(error.to_string())
}

pub async fn send_message(
    State(state): State<ChatState>,
    Path(store_id): Path<String>,
    payload: Result<Json<ChatMessageRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiEnvelope<ChatMessageData>>), ApiError> {
    let correlation_id = correlation_id();
    let store_id = StoreId(store_id);

    let Json(request) = payload.map_err(|rejection| {
        ApiError::new(
            DomainError::InvalidField { field: "body", reason: rejection.body_text() },
            &correlation_id,
        )
    })?;
    validate_customer_message(&request.message)
        .and_then(|_| validate_identifier("customer_identifier", request.customer_identifier.as_deref()))
        .and_then(|_| validate_identifier("session_id", request.session_id.as_deref()))
        .map_err(|error| ApiError::new(error, &correlation_id))?;

    let history = state
        .conversations
        .recent_turns(&store_id, state.history_turns)
        .await
        .map_err(|error| ApiError::new(persistence(error), &correlation_id))?;

    let result = state
        .pipeline
        .run(&store_id, &request.message, &history)
        .await
        .map_err(|error| ApiError::new(error, &correlation_id))?;

    let record = ConversationRecord::from_result(
        store_id.clone(),
        request.customer_identifier.clone(),
        request.message.clone(),
        history.len(),
        &result,
    );
    let conversation_id = record.id.0.clone();
    state
        .conversations
        .append(record)
        .await
        .map_err(|error| ApiError::new(persistence(error), &correlation_id))?;

    let event = AnalyticsEvent::new(
        store_id.clone(),
        EventType::QuestionAsked,
        json!({
            "message_length": request.message.chars().count(),
            "response_time_ms": result.response_time_ms,
            "intent_detected": result.intent_detected.as_str(),
        }),
        request.session_id.clone(),
        request.customer_identifier.clone(),
    );
    if let Err(error) = state.analytics.log_event(event).await {
        warn!(
            event_name = "analytics.event.dropped",
            correlation_id = %correlation_id,
            store_id = %store_id,
            error = %error,
            "failed to record question_asked event"
        );
    }

    let card_ids = &result.products_referenced
        [..result.products_referenced.len().min(MAX_PRODUCT_CARDS)];
    let products = if card_ids.is_empty() {
        Vec::new()
    } else {
        state
            .products
            .find_by_ids(&store_id, card_ids)
            .await
            .map_err(|error| ApiError::new(persistence(error), &correlation_id))?
            .iter()
            .map(ProductCard::from_product)
            .collect()
    };

    info!(
        event_name = "chat.message.answered",
        correlation_id = %correlation_id,
        store_id = %store_id,
        conversation_id = %conversation_id,
        intent = result.intent_detected.as_str(),
        product_cards = products.len(),
        response_time_ms = result.response_time_ms,
        "chat message answered"
    );

    Ok((
        StatusCode::CREATED,
        Json(ApiEnvelope::ok(ChatMessageData {
            id: conversation_id,
            customer_message: request.message,
            ai_response: result.ai_response,
            products,
            intent_detected: result.intent_detected.as_str().to_string(),
            response_time_ms: result.response_time_ms,
        })),
    ))
}

pub async fn chat_history(
    State(state): State<ChatState>,
    Path(store_id): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<ApiEnvelope<HistoryPage>>, ApiError> {
    let correlation_id = correlation_id();
    let store_id = StoreId(store_id);

    let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE);
    if !(1..=MAX_PAGE_SIZE).contains(&limit) {
        return Err(ApiError::new(
            DomainError::InvalidField {
                field: "limit",
                reason: format!("must be between 1 and {MAX_PAGE_SIZE}"),
            },
            &correlation_id,
        ));
    }
    let offset = query.offset.unwrap_or(0);
    let customer_identifier =
        query.customer_identifier.as_deref().map(str::trim).filter(|value| !value.is_empty());

    let page = state
        .conversations
        .list_page(&store_id, customer_identifier, limit, offset)
        .await
        .map_err(|error| ApiError::new(persistence(error), &correlation_id))?;

    let returned = page.records.len() as u64;
    let conversations = page
        .records
        .into_iter()
        .map(|record| HistoryEntry {
            id: record.id.0,
            message: record.customer_message,
            response: record.ai_response,
            timestamp: record.created_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            customer_identifier: record.customer_identifier,
            intent_detected: record.intent_detected.as_str().to_string(),
        })
        .collect();

    Ok(Json(ApiEnvelope::ok(HistoryPage {
        conversations,
        total_count: page.total_count,
        page: offset / limit + 1,
        page_size: limit,
        has_more: u64::from(offset) + returned < page.total_count,
    })))
}

pub async fn clear_history(
    State(state): State<ChatState>,
    Path(store_id): Path<String>,
) -> Result<Json<ApiEnvelope<serde_json::Value>>, ApiError> {
    let correlation_id = correlation_id();
    let store_id = StoreId(store_id);

    let deleted = state
        .conversations
        .clear(&store_id)
        .await
        .map_err(|error| ApiError::new(persistence(error), &correlation_id))?;

    info!(
        event_name = "chat.history.cleared",
        correlation_id = %correlation_id,
        store_id = %store_id,
        deleted,
        "chat history cleared"
    );

    let mut envelope = ApiEnvelope::ok(json!({ "deleted": deleted }));
    envelope.message = Some("Chat history cleared successfully".to_string());
    Ok(Json(envelope))
}
