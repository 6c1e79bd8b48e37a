//! Catalog Repository

use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, PgExecutor, Postgres, Row, Transaction, postgres::PgRow, query, query_as};

use crate::domain::{
    catalog::{
        data::NewCatalogEntry,
        records::{CatalogEntryId, CatalogEntryRecord, LockedEntry},
    },
    columns::{amount_param, count_param, try_get_amount, try_get_count},
};

const GET_ENTRY_SQL: &str = include_str!("sql/get_entry.sql");
const LIST_ENTRIES_SQL: &str = include_str!("sql/list_entries.sql");
const CREATE_ENTRY_SQL: &str = include_str!("sql/create_entry.sql");
const LOCK_ENTRY_SQL: &str = include_str!("sql/lock_entry.sql");
const DECREMENT_STOCK_SQL: &str = include_str!("sql/decrement_stock.sql");

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct PgCatalogRepository;

impl PgCatalogRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn get_entry<'e, E>(
        &self,
        executor: E,
        entry: CatalogEntryId,
    ) -> Result<CatalogEntryRecord, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        query_as::<Postgres, CatalogEntryRecord>(GET_ENTRY_SQL)
            .bind(entry.into_i64())
            .fetch_one(executor)
            .await
    }

    pub(crate) async fn list_entries<'e, E>(
        &self,
        executor: E,
    ) -> Result<Vec<CatalogEntryRecord>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        query_as::<Postgres, CatalogEntryRecord>(LIST_ENTRIES_SQL)
            .fetch_all(executor)
            .await
    }

    pub(crate) async fn create_entry<'e, E>(
        &self,
        executor: E,
        entry: NewCatalogEntry,
    ) -> Result<CatalogEntryRecord, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        query_as::<Postgres, CatalogEntryRecord>(CREATE_ENTRY_SQL)
            .bind(entry.name)
            .bind(amount_param("price", entry.price)?)
            .bind(count_param("stock", entry.stock)?)
            .fetch_one(executor)
            .await
    }

    /// Lock the catalog row until `tx` ends and return its price and stock.
    ///
    /// Returns `None` when the entry does not exist.
    pub(crate) async fn lock_entry(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        entry: CatalogEntryId,
    ) -> Result<Option<LockedEntry>, sqlx::Error> {
        let Some(row) = query(LOCK_ENTRY_SQL)
            .bind(entry.into_i64())
            .fetch_optional(&mut **tx)
            .await?
        else {
            return Ok(None);
        };

        Ok(Some(LockedEntry {
            price: try_get_amount(&row, "price")?,
            stock: try_get_count(&row, "stock")?,
        }))
    }

    /// Subtract `quantity` from the stock. The caller must hold the row lock
    /// from [`Self::lock_entry`] and have checked the stock covers it.
    pub(crate) async fn decrement_stock(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        entry: CatalogEntryId,
        quantity: u32,
    ) -> Result<(), sqlx::Error> {
        query(DECREMENT_STOCK_SQL)
            .bind(entry.into_i64())
            .bind(count_param("quantity", quantity)?)
            .execute(&mut **tx)
            .await?;

        Ok(())
    }
}

impl<'r> FromRow<'r, PgRow> for CatalogEntryRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            id: CatalogEntryId::from_i64(row.try_get("id")?),
            name: row.try_get("name")?,
            price: try_get_amount(row, "price")?,
            stock: try_get_count(row, "stock")?,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
        })
    }
}
