use std::sync::Arc;

use crate::commands::CommandResult;
use shopmind_agent::{GeminiClient, PipelineSettings, ResponsePipeline};
use shopmind_core::config::{AppConfig, LoadOptions};
use shopmind_core::{
    validate_customer_message, validate_identifier, ApplicationError, ConversationRecord,
    DomainError, InterfaceError, StoreId,
};
use shopmind_db::repositories::{
    ConversationRepository, SqlCatalogStore, SqlConversationRepository,
};
use shopmind_db::{connect_with_config, migrations};

#[derive(Clone, Debug)]
pub struct AskArgs {
    pub store: String,
    pub customer: Option<String>,
    pub record: bool,
    pub message: String,
}

type Failure = (&'static str, String, u8);

pub fn run(args: AskArgs) -> CommandResult {
    if let Err(error) = validate_args(&args) {
        let (error_class, message, exit_code) = interface_failure(error.into_interface("cli-ask"));
        return CommandResult::failure("ask", error_class, message, exit_code);
    }

    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "ask",
                "config_validation",
                format!("configuration issue: {error}"),
                2,
            );
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                "ask",
                "runtime_init",
                format!("failed to initialize async runtime: {error}"),
                3,
            );
        }
    };

    let result = runtime.block_on(async {
        let pool = connect_with_config(&config.database)
            .await
            .map_err(|error| ("db_connectivity", error.to_string(), 4u8))?;
        migrations::run_pending(&pool)
            .await
            .map_err(|error| ("migration", error.to_string(), 5u8))?;

        let outcome = answer(&config, pool.clone(), &args).await;
        pool.close().await;
        outcome
    });

    match result {
        Ok(data) => CommandResult::success_with_data("ask", "pipeline completed", data),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("ask", error_class, message, exit_code)
        }
    }
}

fn validate_args(args: &AskArgs) -> Result<(), ApplicationError> {
    if args.store.trim().is_empty() {
        return Err(DomainError::InvalidField {
            field: "store_id",
            reason: "must not be blank".to_string(),
        }
        .into());
    }
    validate_identifier("store_id", Some(args.store.as_str()))?;
    validate_identifier("customer_identifier", args.customer.as_deref())?;
    validate_customer_message(&args.message)?;
    Ok(())
}

async fn answer(
    config: &AppConfig,
    pool: shopmind_db::DbPool,
    args: &AskArgs,
) -> Result<serde_json::Value, Failure> {
    let store_id = StoreId(args.store.trim().to_string());
    let generator = GeminiClient::from_config(&config.llm)
        .map_err(|error| ("generation_setup", error.to_string(), 9u8))?;
    let pipeline = ResponsePipeline::new(
        Arc::new(SqlCatalogStore::new(pool.clone())),
        Arc::new(generator),
        PipelineSettings::from_config(&config.llm, &config.chat),
    );
    let conversations = SqlConversationRepository::new(pool);

    let history = conversations
        .recent_turns(&store_id, config.chat.history_turns)
        .await
        .map_err(|error| ("persistence", error.to_string(), 10u8))?;

    let result = pipeline
        .run(&store_id, &args.message, &history)
        .await
        .map_err(|error| interface_failure(ApplicationError::from(error).into_interface("cli-ask")))?;

    if args.record {
        let record = ConversationRecord::from_result(
            store_id.clone(),
            args.customer.clone(),
            args.message.clone(),
            history.len(),
            &result,
        );
        conversations
            .append(record)
            .await
            .map_err(|error| ("persistence", error.to_string(), 10u8))?;
    }

    Ok(serde_json::json!({
        "store_id": store_id.0,
        "history_turns": history.len(),
        "recorded": args.record,
        "result": result,
    }))
}

fn interface_failure(error: InterfaceError) -> Failure {
    let exit_code = match &error {
        InterfaceError::BadRequest { .. } => 7,
        InterfaceError::NotFound { .. } => 8,
        InterfaceError::Upstream { .. } => 9,
        InterfaceError::ServiceUnavailable { .. } => 10,
        InterfaceError::Internal { .. } => 11,
    };
    (error.code(), error.to_string(), exit_code)
}

#[cfg(test)]
mod tests {
    use shopmind_core::{ApplicationError, DomainError, InterfaceError};

    use super::{interface_failure, validate_args, AskArgs};

    fn args(store: &str, message: &str) -> AskArgs {
        AskArgs {
            store: store.to_string(),
            customer: None,
            record: false,
            message: message.to_string(),
        }
    }

    #[test]
    fn blank_message_is_rejected_before_any_io() {
        let error = validate_args(&args("store-demo-001", "")).expect_err("empty message");

        assert!(matches!(error, ApplicationError::Domain(DomainError::InvalidCustomerMessage(_))));
    }

    #[test]
    fn blank_store_is_rejected() {
        let error = validate_args(&args("   ", "hello")).expect_err("blank store");

        assert!(matches!(
            error,
            ApplicationError::Domain(DomainError::InvalidField { field: "store_id", .. })
        ));
    }

    #[test]
    fn interface_errors_map_to_distinct_exit_codes() {
        let not_found = interface_failure(InterfaceError::NotFound {
            message: "store `x` not found".to_string(),
            correlation_id: "cli-ask".to_string(),
        });
        let upstream = interface_failure(InterfaceError::Upstream {
            message: "AI response generation failed: timeout".to_string(),
            correlation_id: "cli-ask".to_string(),
        });

        assert_eq!(not_found.0, "not_found");
        assert_eq!(not_found.2, 8);
        assert_eq!(upstream.0, "upstream_failure");
        assert_eq!(upstream.2, 9);
    }
}
