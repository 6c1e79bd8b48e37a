//! Application configuration module

use clap::Args;

use crate::config::{db::DatabaseConfig, logging::LoggingConfig, purchase::PurchaseConfig};

pub mod db;
pub mod logging;
pub mod purchase;

pub use logging::LogFormat;

/// Settings shared by every CLI command.
#[derive(Debug, Clone, Args)]
pub struct AppConfig {
    /// Logging output settings.
    #[command(flatten)]
    pub logging: LoggingConfig,

    /// Application database settings.
    #[command(flatten)]
    pub database: DatabaseConfig,

    /// Purchase engine settings.
    #[command(flatten)]
    pub purchase: PurchaseConfig,
}
