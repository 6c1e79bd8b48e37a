use std::io::Write;

use clap::{Parser, Subcommand, ValueEnum};
use emporium_app::{
    config::AppConfig,
    context::{AppContext, AppInitError},
    observability,
};
use serde::Serialize;
use thiserror::Error;

mod account;
mod catalog;
mod db;
mod orders;
mod purchase;

/// Exit status for failures that are not a purchase outcome.
const EXIT_FAILURE: u8 = 1;

#[derive(Debug, Parser)]
#[command(name = "emporium-app", about = "Emporium ledger CLI", long_about = None)]
pub(crate) struct Cli {
    #[command(flatten)]
    config: AppConfig,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    Db(db::DbCommand),
    Account(account::AccountCommand),
    Catalog(catalog::CatalogCommand),
    Orders(orders::OrdersCommand),
    Purchase(purchase::PurchaseArgs),
}

/// How command results are written to stdout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    /// `key: value` lines.
    #[default]
    Text,

    /// One JSON document.
    Json,
}

#[derive(Debug, Error)]
#[error("{message}")]
pub(crate) struct CliError {
    message: String,
    code: u8,
}

impl CliError {
    pub(crate) fn new(message: impl Into<String>, code: u8) -> Self {
        Self {
            message: message.into(),
            code,
        }
    }

    pub(crate) fn code(&self) -> u8 {
        self.code
    }

    /// Print the failure message as a single line.
    pub(crate) fn report(&self, out: &mut dyn Write) {
        let _ = writeln!(out, "{}", self.message);
    }
}

impl From<String> for CliError {
    fn from(message: String) -> Self {
        Self::new(message, EXIT_FAILURE)
    }
}

impl Cli {
    pub(crate) async fn run(self) -> Result<(), CliError> {
        observability::init(&self.config.logging)
            .map_err(|error| format!("failed to initialise logging: {error}"))?;

        let mut stdout = std::io::stdout().lock();

        match self.command {
            Commands::Db(command) => db::run(command, &self.config).await,
            Commands::Account(command) => {
                account::run(command, &connect(&self.config).await?, &mut stdout).await
            }
            Commands::Catalog(command) => {
                catalog::run(command, &connect(&self.config).await?, &mut stdout).await
            }
            Commands::Orders(command) => {
                orders::run(command, &connect(&self.config).await?, &mut stdout).await
            }
            Commands::Purchase(args) => {
                let context = connect(&self.config).await?;

                purchase::run(args, context.purchases.as_ref(), &mut stdout).await
            }
        }
    }
}

async fn connect(config: &AppConfig) -> Result<AppContext, CliError> {
    AppContext::from_config(config)
        .await
        .map_err(|error: AppInitError| match error {
            AppInitError::Database(source) => {
                format!("failed to connect to database: {source}").into()
            }
        })
}

/// Write `value` in the chosen format. `text` renders the `key: value` form.
pub(crate) fn emit<T, F>(
    out: &mut dyn Write,
    format: OutputFormat,
    value: &T,
    text: F,
) -> Result<(), CliError>
where
    T: Serialize,
    F: FnOnce(&T) -> Vec<(&'static str, String)>,
{
    let written = match format {
        OutputFormat::Json => serde_json::to_string_pretty(value)
            .map_err(|error| format!("failed to encode output: {error}"))
            .and_then(|json| {
                writeln!(out, "{json}").map_err(|error| format!("failed to write output: {error}"))
            }),
        OutputFormat::Text => text(value).into_iter().try_for_each(|(key, value)| {
            writeln!(out, "{key}: {value}").map_err(|error| format!("failed to write output: {error}"))
        }),
    };

    written.map_err(CliError::from)
}
