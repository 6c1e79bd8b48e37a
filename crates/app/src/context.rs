//! App Context

use std::{sync::Arc, time::Duration};

use thiserror::Error;

use crate::{
    config::AppConfig,
    database::{self, Db},
    domain::{
        accounts::{AccountsService, PgAccountsService},
        catalog::{CatalogService, PgCatalogService},
        orders::{OrdersService, PgOrdersService},
        purchases::{PgPurchasesService, PurchasesService},
    },
};

#[derive(Debug, Error)]
pub enum AppInitError {
    #[error("failed to connect to database")]
    Database(#[source] sqlx::Error),
}

#[derive(Clone)]
pub struct AppContext {
    pub accounts: Arc<dyn AccountsService>,
    pub catalog: Arc<dyn CatalogService>,
    pub orders: Arc<dyn OrdersService>,
    pub purchases: Arc<dyn PurchasesService>,
}

impl AppContext {
    /// Connect to the database described by `config` and wire the services.
    ///
    /// # Errors
    ///
    /// Returns an error when establishing a database connection fails.
    pub async fn from_config(config: &AppConfig) -> Result<Self, AppInitError> {
        let pool = database::connect(
            &config.database.database_url,
            config.database.database_max_connections,
        )
        .await
        .map_err(AppInitError::Database)?;

        Ok(Self::from_db(&Db::new(pool), config.purchase.deadline()))
    }

    #[must_use]
    pub fn from_db(db: &Db, purchase_deadline: Option<Duration>) -> Self {
        let mut purchases = PgPurchasesService::new(db.clone());

        if let Some(deadline) = purchase_deadline {
            purchases = purchases.with_default_deadline(deadline);
        }

        Self {
            accounts: Arc::new(PgAccountsService::new(db.clone())),
            catalog: Arc::new(PgCatalogService::new(db.clone())),
            orders: Arc::new(PgOrdersService::new(db.clone())),
            purchases: Arc::new(purchases),
        }
    }
}
