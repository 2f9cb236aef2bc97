use crate::commands::CommandResult;
use shopmind_core::config::{AppConfig, LoadOptions};
use shopmind_db::{connect_with_config, migrations, DemoStoreSeed, SeedResult};

pub fn run() -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "seed",
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
                "seed",
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

        let seeded = DemoStoreSeed::load(&pool)
            .await
            .map_err(|error| ("seed_execution", error.to_string(), 5u8))?;

        let verified = DemoStoreSeed::verify(&pool)
            .await
            .map_err(|error| ("seed_verification", error.to_string(), 6u8))?;

        pool.close().await;
        if verified {
            Ok(seeded)
        } else {
            Err(("seed_verification", verification_failure_message(&seeded), 6u8))
        }
    });

    match result {
        Ok(seeded) => CommandResult::success("seed", summary_message(&seeded)),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("seed", error_class, message, exit_code)
        }
    }
}

fn summary_message(seeded: &SeedResult) -> String {
    format!(
        "demo store `{}` loaded with {} active products",
        seeded.store_id, seeded.active_products
    )
}

fn verification_failure_message(seeded: &SeedResult) -> String {
    format!(
        "demo store `{}` is missing expected rows after load ({} active products found)",
        seeded.store_id, seeded.active_products
    )
}

#[cfg(test)]
mod tests {
    use shopmind_db::{SeedResult, DEMO_STORE_ID};

    use super::{summary_message, verification_failure_message};

    #[test]
    fn summary_names_store_and_active_product_count() {
        let seeded = SeedResult { store_id: DEMO_STORE_ID, active_products: 4 };

        assert_eq!(
            summary_message(&seeded),
            "demo store `store-demo-001` loaded with 4 active products"
        );
    }

    #[test]
    fn verification_failure_reports_observed_count() {
        let seeded = SeedResult { store_id: DEMO_STORE_ID, active_products: 2 };

        assert!(verification_failure_message(&seeded).contains("2 active products found"));
    }
}
