use emporium_app::{config::AppConfig, database};
use tracing::info;

use crate::cli::CliError;

pub(crate) async fn run(config: &AppConfig) -> Result<(), CliError> {
    let pool = database::connect(
        &config.database.database_url,
        config.database.database_max_connections,
    )
    .await
    .map_err(|error| format!("failed to connect to database: {error}"))?;

    database::migrate(&pool)
        .await
        .map_err(|error| format!("failed to apply migrations: {error}"))?;

    info!("ledger migrations applied");
    println!("migrations applied");

    Ok(())
}
