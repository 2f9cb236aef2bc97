//! Conversational response pipeline - turns a customer message into a reply grounded
//! in the store's catalog.
//!
//! One invocation of [`runtime::ResponsePipeline::run`] walks a fixed, linear sequence:
//! 1. **Snapshot** (`catalog`) - read store persona and active products
//! 2. **Compose** (`prompt`) - bounded instruction block + recent history + new message
//! 3. **Generate** (`llm`) - one timed call to the generation provider
//! 4. **Classify** (`intent`) - keyword-rule intent label for analytics
//! 5. **Extract** (`references`) - which catalog items the reply actually names
//!
//! # Key Types
//!
//! - `ResponsePipeline` - the orchestrator; holds no state across invocations
//! - `GenerationClient` - provider seam, implemented by `GeminiClient`
//! - `PromptComposer`, `IntentClassifier`, `ReferenceExtractor` - pure, deterministic stages
//!
//! The model output is never trusted for structure: intent comes from the customer's
//! text and references are reconciled against the snapshot the reply was grounded in.

pub mod catalog;
pub mod intent;
pub mod llm;
pub mod prompt;
pub mod references;
pub mod runtime;

pub use catalog::CatalogSnapshotProvider;
pub use intent::IntentClassifier;
pub use llm::{
    GeminiClient, GenerationClient, GenerationError, GenerationRequest, GenerationResult,
    ScriptedGenerationClient, APOLOGY_RESPONSE,
};
pub use prompt::PromptComposer;
pub use references::ReferenceExtractor;
pub use runtime::{PipelineError, PipelineSettings, PipelineStage, ResponsePipeline};
