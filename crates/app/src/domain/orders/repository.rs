//! Orders Repository

use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, PgExecutor, Postgres, Row, Transaction, postgres::PgRow, query, query_as};

use crate::domain::{
    accounts::records::AccountId,
    catalog::records::CatalogEntryId,
    columns::{amount_param, count_param, try_get_amount, try_get_count},
    orders::{
        data::{NewOrder, OrderFilter},
        records::{OrderId, OrderRecord, OrderTotals},
    },
};

const APPEND_ORDER_SQL: &str = include_str!("sql/append_order.sql");
const LIST_ORDERS_SQL: &str = include_str!("sql/list_orders.sql");
const ORDER_TOTALS_SQL: &str = include_str!("sql/order_totals.sql");

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct PgOrdersRepository;

impl PgOrdersRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn append_order(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: NewOrder,
    ) -> Result<OrderRecord, sqlx::Error> {
        query_as::<Postgres, OrderRecord>(APPEND_ORDER_SQL)
            .bind(order.account_id.into_i64())
            .bind(order.catalog_entry_id.into_i64())
            .bind(amount_param("price", order.price)?)
            .bind(count_param("quantity", order.quantity)?)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn list_orders<'e, E>(
        &self,
        executor: E,
        account: AccountId,
    ) -> Result<Vec<OrderRecord>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        query_as::<Postgres, OrderRecord>(LIST_ORDERS_SQL)
            .bind(account.into_i64())
            .fetch_all(executor)
            .await
    }

    pub(crate) async fn order_totals<'e, E>(
        &self,
        executor: E,
        filter: OrderFilter,
    ) -> Result<OrderTotals, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let row = query(ORDER_TOTALS_SQL)
            .bind(filter.account_id.map(AccountId::into_i64))
            .bind(filter.catalog_entry_id.map(CatalogEntryId::into_i64))
            .fetch_one(executor)
            .await?;

        Ok(OrderTotals {
            count: try_get_amount(&row, "order_count")?,
            price: try_get_amount(&row, "total_price")?,
            quantity: try_get_amount(&row, "total_quantity")?,
        })
    }
}

impl<'r> FromRow<'r, PgRow> for OrderRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            id: OrderId::from_i64(row.try_get("id")?),
            account_id: AccountId::from_i64(row.try_get("account_id")?),
            catalog_entry_id: CatalogEntryId::from_i64(row.try_get("catalog_entry_id")?),
            price: try_get_amount(row, "price")?,
            quantity: try_get_count(row, "quantity")?,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
        })
    }
}
