use clap::{Args, Subcommand};
use emporium_app::config::AppConfig;

use super::CliError;

mod migrate;

#[derive(Debug, Args)]
pub(crate) struct DbCommand {
    #[command(subcommand)]
    command: DbSubcommand,
}

#[derive(Debug, Subcommand)]
enum DbSubcommand {
    /// Apply the embedded ledger migrations
    Migrate,
}

pub(crate) async fn run(command: DbCommand, config: &AppConfig) -> Result<(), CliError> {
    match command.command {
        DbSubcommand::Migrate => migrate::run(config).await,
    }
}
