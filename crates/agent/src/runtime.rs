use std::sync::Arc;
use std::time::Instant;

use shopmind_core::catalog::{CatalogError, CatalogStore};
use shopmind_core::config::{AppConfig, ChatConfig, LlmConfig};
use shopmind_core::domain::conversation::{ConversationTurn, PipelineResult};
use shopmind_core::domain::store::StoreId;
use shopmind_core::errors::ApplicationError;
use thiserror::Error;
use tracing::{info, warn};

use crate::catalog::CatalogSnapshotProvider;
use crate::intent::IntentClassifier;
use crate::llm::{GenerationClient, GenerationError, GenerationRequest};
use crate::prompt::PromptComposer;
use crate::references::ReferenceExtractor;

#[derive(Clone, Debug, PartialEq)]
pub struct PipelineSettings {
    pub temperature: f32,
    pub max_output_tokens: u32,
    pub chat: ChatConfig,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        let config = AppConfig::default();
        Self::from_config(&config.llm, &config.chat)
    }
}

impl PipelineSettings {
    pub fn from_config(llm: &LlmConfig, chat: &ChatConfig) -> Self {
        Self {
            temperature: llm.temperature,
            max_output_tokens: llm.max_output_tokens,
            chat: chat.clone(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PipelineStage {
    Start,
    SnapshotFetched,
    PromptComposed,
    GenerationCalled,
    Classified,
    Done,
}

impl PipelineStage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::SnapshotFetched => "snapshot_fetched",
            Self::PromptComposed => "prompt_composed",
            Self::GenerationCalled => "generation_called",
            Self::Classified => "classified",
            Self::Done => "done",
        }
    }
}

#[derive(Clone, Debug, Error, PartialEq)]
pub enum PipelineError {
    #[error("store not found: {0}")]
    StoreNotFound(StoreId),
    #[error("catalog unavailable: {0}")]
    Catalog(String),
    #[error("AI response generation failed: {0}")]
    Generation(#[from] GenerationError),
}

impl PipelineError {
    /// Stage at which the invocation aborted.
    pub fn stage(&self) -> PipelineStage {
        match self {
            Self::StoreNotFound(_) | Self::Catalog(_) => PipelineStage::SnapshotFetched,
            Self::Generation(_) => PipelineStage::GenerationCalled,
        }
    }
}

impl From<CatalogError> for PipelineError {
    fn from(value: CatalogError) -> Self {
        match value {
            CatalogError::StoreNotFound(store_id) => Self::StoreNotFound(store_id),
            CatalogError::Backend(message) => Self::Catalog(message),
        }
    }
}

impl From<PipelineError> for ApplicationError {
    fn from(value: PipelineError) -> Self {
        match value {
            PipelineError::StoreNotFound(store_id) => {
                ApplicationError::NotFound(format!("store `{store_id}`"))
            }
            PipelineError::Catalog(message) => ApplicationError::Persistence(message),
            error @ PipelineError::Generation(_) => ApplicationError::Integration(error.to_string()),
        }
    }
}

/// Sequences snapshot, compose, generate, classify and extract for one inbound message.
///
/// Holds only immutable collaborators; every call builds its own snapshot and prompt.
/// Generation failures are surfaced once, never retried here.
#[derive(Clone)]
pub struct ResponsePipeline {
    catalog: CatalogSnapshotProvider,
    generator: Arc<dyn GenerationClient>,
    composer: PromptComposer,
    classifier: IntentClassifier,
    extractor: ReferenceExtractor,
    settings: PipelineSettings,
}

impl ResponsePipeline {
    pub fn new(
        catalog_store: Arc<dyn CatalogStore>,
        generator: Arc<dyn GenerationClient>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            catalog: CatalogSnapshotProvider::new(
                catalog_store,
                settings.chat.catalog_product_limit,
            ),
            generator,
            composer: PromptComposer::from_config(&settings.chat),
            classifier: IntentClassifier::new(),
            extractor: ReferenceExtractor::from_config(&settings.chat),
            settings,
        }
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    pub async fn run(
        &self,
        store_id: &StoreId,
        customer_message: &str,
        history: &[ConversationTurn],
    ) -> Result<PipelineResult, PipelineError> {
        let started = Instant::now();

        let outcome = self.execute(store_id, customer_message, history, started).await;
        match &outcome {
            Ok(result) => info!(
                event_name = "chat.pipeline.completed",
                store_id = %store_id,
                provider = self.generator.provider(),
                intent = result.intent_detected.as_str(),
                references = result.products_referenced.len(),
                history_turns = history.len(),
                response_time_ms = result.response_time_ms,
                "response pipeline completed"
            ),
            Err(error) => warn!(
                event_name = "chat.pipeline.failed",
                store_id = %store_id,
                provider = self.generator.provider(),
                stage = error.stage().as_str(),
                error = %error,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "response pipeline aborted"
            ),
        }
        outcome
    }

    async fn execute(
        &self,
        store_id: &StoreId,
        customer_message: &str,
        history: &[ConversationTurn],
        started: Instant,
    ) -> Result<PipelineResult, PipelineError> {
        let snapshot = self.catalog.snapshot(store_id).await?;

        let transcript = self.composer.compose(&snapshot, history, customer_message);
        let request = GenerationRequest::new(
            transcript,
            self.settings.temperature,
            self.settings.max_output_tokens,
        );

        let generation = self.generator.generate(&request).await?;
        let response_time_ms = started.elapsed().as_millis() as u64;

        let intent_detected = self.classifier.classify(customer_message);
        let products_referenced =
            self.extractor.extract(&generation.response_text, &snapshot.products);

        Ok(PipelineResult {
            ai_response: generation.response_text,
            intent_detected,
            products_referenced,
            response_time_ms,
        })
    }
}
