use std::sync::Arc;

use axum::Router;
use shopmind_agent::{GeminiClient, GenerationClient, GenerationError, PipelineSettings, ResponsePipeline};
use shopmind_core::config::{AppConfig, ConfigError};
use shopmind_db::repositories::{
    SqlAnalyticsRepository, SqlCatalogStore, SqlConversationRepository, SqlProductRepository,
};
use shopmind_db::{connect_with_config, migrations, DbPool};
use thiserror::Error;
use tracing::{info, warn};

use crate::chat::{self, ChatState};
use crate::health::{self, HealthState};

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub router: Router,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error("generation client setup failed: {0}")]
    Generation(#[source] GenerationError),
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let db_pool =
        connect_with_config(&config.database).await.map_err(BootstrapError::DatabaseConnect)?;
    info!(
        event_name = "system.bootstrap.database_connected",
        correlation_id = "bootstrap",
        "database connection established"
    );

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(
        event_name = "system.bootstrap.migrations_applied",
        correlation_id = "bootstrap",
        "database migrations applied"
    );

    let generator: Arc<dyn GenerationClient> =
        Arc::new(GeminiClient::from_config(&config.llm).map_err(BootstrapError::Generation)?);
    if !config.has_llm_api_key() {
        warn!(
            event_name = "system.bootstrap.llm_key_missing",
            correlation_id = "bootstrap",
            provider = generator.provider(),
            "no generation api key configured; chat messages will fail until one is set"
        );
    }

    let pipeline = ResponsePipeline::new(
        Arc::new(SqlCatalogStore::new(db_pool.clone())),
        generator.clone(),
        PipelineSettings::from_config(&config.llm, &config.chat),
    );
    let chat_state = ChatState {
        pipeline,
        conversations: Arc::new(SqlConversationRepository::new(db_pool.clone())),
        analytics: Arc::new(SqlAnalyticsRepository::new(db_pool.clone())),
        products: Arc::new(SqlProductRepository::new(db_pool.clone())),
        history_turns: config.chat.history_turns,
    };
    let health_state = HealthState {
        db_pool: db_pool.clone(),
        llm_provider: generator.provider(),
        llm_configured: config.has_llm_api_key(),
    };

    let router = Router::new().merge(health::router(health_state)).merge(chat::router(chat_state));

    Ok(Application { config, db_pool, router })
}
