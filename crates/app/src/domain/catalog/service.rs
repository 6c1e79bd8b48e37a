//! Catalog service.

use async_trait::async_trait;
use mockall::automock;

use crate::{
    database::Db,
    domain::catalog::{
        data::NewCatalogEntry,
        errors::CatalogServiceError,
        records::{CatalogEntryId, CatalogEntryRecord},
        repository::PgCatalogRepository,
    },
};

#[derive(Debug, Clone)]
pub struct PgCatalogService {
    db: Db,
    repository: PgCatalogRepository,
}

impl PgCatalogService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            repository: PgCatalogRepository::new(),
        }
    }
}

#[async_trait]
impl CatalogService for PgCatalogService {
    #[tracing::instrument(
        name = "catalog.service.create_entry",
        skip(self, entry),
        fields(
            price = entry.price,
            stock = entry.stock,
            catalog_entry_id = tracing::field::Empty
        ),
        err
    )]
    async fn create_entry(
        &self,
        entry: NewCatalogEntry,
    ) -> Result<CatalogEntryRecord, CatalogServiceError> {
        if entry.name.trim().is_empty() {
            return Err(CatalogServiceError::MissingRequiredData);
        }

        let created = self
            .repository
            .create_entry(self.db.pool(), entry)
            .await?;

        tracing::Span::current().record(
            "catalog_entry_id",
            tracing::field::display(created.id),
        );

        Ok(created)
    }

    async fn get_entry(
        &self,
        entry: CatalogEntryId,
    ) -> Result<CatalogEntryRecord, CatalogServiceError> {
        self.repository
            .get_entry(self.db.pool(), entry)
            .await
            .map_err(Into::into)
    }

    async fn list_entries(&self) -> Result<Vec<CatalogEntryRecord>, CatalogServiceError> {
        self.repository
            .list_entries(self.db.pool())
            .await
            .map_err(Into::into)
    }
}

#[automock]
#[async_trait]
pub trait CatalogService: Send + Sync {
    /// Creates a catalog entry with a unit price in minor units and an initial stock.
    async fn create_entry(
        &self,
        entry: NewCatalogEntry,
    ) -> Result<CatalogEntryRecord, CatalogServiceError>;

    /// Retrieve a single catalog entry.
    async fn get_entry(
        &self,
        entry: CatalogEntryId,
    ) -> Result<CatalogEntryRecord, CatalogServiceError>;

    /// Retrieves all catalog entries, ordered by id.
    async fn list_entries(&self) -> Result<Vec<CatalogEntryRecord>, CatalogServiceError>;
}
