//! Orders service.

use async_trait::async_trait;
use mockall::automock;

use crate::{
    database::Db,
    domain::{
        accounts::records::AccountId,
        orders::{
            data::OrderFilter,
            errors::OrdersServiceError,
            records::{OrderRecord, OrderTotals},
            repository::PgOrdersRepository,
        },
    },
};

#[derive(Debug, Clone)]
pub struct PgOrdersService {
    db: Db,
    repository: PgOrdersRepository,
}

impl PgOrdersService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            repository: PgOrdersRepository::new(),
        }
    }
}

#[async_trait]
impl OrdersService for PgOrdersService {
    async fn list_orders(&self, account: AccountId) -> Result<Vec<OrderRecord>, OrdersServiceError> {
        Ok(self
            .repository
            .list_orders(self.db.pool(), account)
            .await?)
    }

    async fn order_totals(&self, filter: OrderFilter) -> Result<OrderTotals, OrdersServiceError> {
        Ok(self
            .repository
            .order_totals(self.db.pool(), filter)
            .await?)
    }
}

#[automock]
#[async_trait]
/// Read access to the order history.
pub trait OrdersService: Send + Sync {
    /// Orders placed by `account`, oldest first.
    async fn list_orders(&self, account: AccountId) -> Result<Vec<OrderRecord>, OrdersServiceError>;

    /// Count and sums of the orders matching `filter`.
    async fn order_totals(&self, filter: OrderFilter) -> Result<OrderTotals, OrdersServiceError>;
}
