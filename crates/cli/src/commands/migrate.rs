use clientele_core::config::{AppConfig, LoadOptions};
use clientele_db::{connect_with_settings, migrations};

use crate::commands::CommandResult;

const COMMAND: &str = "migrate";

type Failure = (&'static str, String, u8);

pub fn run(options: LoadOptions) -> CommandResult {
    let config = match AppConfig::load(options) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                COMMAND,
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
                COMMAND,
                "runtime_init",
                format!("failed to initialize async runtime: {error}"),
                3,
            );
        }
    };

    match runtime.block_on(apply(&config)) {
        Ok(applied) => CommandResult::success(COMMAND, describe(&applied)),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure(COMMAND, error_class, message, exit_code)
        }
    }
}

async fn apply(config: &AppConfig) -> Result<Vec<i64>, Failure> {
    let pool = connect_with_settings(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .await
    .map_err(|error| ("db_connectivity", error.to_string(), 4))?;

    let pending = migrations::pending_versions(&pool)
        .await
        .map_err(|error| ("db_connectivity", error.to_string(), 4))?;
    migrations::run_pending(&pool).await.map_err(|error| ("migration", error.to_string(), 5))?;

    pool.close().await;
    Ok(pending)
}

fn describe(applied: &[i64]) -> String {
    if applied.is_empty() {
        return "schema already up to date".to_string();
    }

    let versions = applied.iter().map(i64::to_string).collect::<Vec<_>>().join(", ");
    format!("applied {} pending migration(s): {versions}", applied.len())
}
