//! Purchases service.

use std::time::Duration;

use async_trait::async_trait;
use mockall::automock;
use tracing::Span;

use crate::{
    database::Db,
    domain::{
        accounts::repository::PgAccountsRepository,
        catalog::repository::PgCatalogRepository,
        orders::{data::NewOrder, records::OrderRecord, repository::PgOrdersRepository},
        purchases::{
            data::PurchaseRequest,
            errors::{PurchaseError, Resource},
        },
    },
};

#[derive(Debug, Clone)]
pub struct PgPurchasesService {
    db: Db,
    accounts: PgAccountsRepository,
    catalog: PgCatalogRepository,
    orders: PgOrdersRepository,
    default_deadline: Option<Duration>,
}

impl PgPurchasesService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            accounts: PgAccountsRepository::new(),
            catalog: PgCatalogRepository::new(),
            orders: PgOrdersRepository::new(),
            default_deadline: None,
        }
    }

    /// Apply `deadline` to every [`PurchasesService::purchase`] call.
    #[must_use]
    pub fn with_default_deadline(mut self, deadline: Duration) -> Self {
        self.default_deadline = Some(deadline);
        self
    }

    /// Lock, check and mutate inside one unit of work.
    ///
    /// The catalog entry is always locked before the account. Every purchase
    /// takes its locks in that order, so two purchases can never wait on each
    /// other in a cycle.
    #[tracing::instrument(
        name = "purchases.service.purchase",
        skip(self, request),
        fields(
            account_id = %request.account_id,
            catalog_entry_id = %request.catalog_entry_id,
            quantity = request.quantity,
            deadline_ms = deadline.map(|deadline| deadline.as_millis()),
            order_id = tracing::field::Empty
        )
    )]
    async fn execute(
        &self,
        request: PurchaseRequest,
        deadline: Option<Duration>,
    ) -> Result<OrderRecord, PurchaseError> {
        let units = request.units()?;

        let accounts = self.accounts;
        let catalog = self.catalog;
        let orders = self.orders;

        let order = self
            .db
            .run_atomic::<_, PurchaseError, _>(deadline, move |tx| {
                Box::pin(async move {
                    let entry = catalog
                        .lock_entry(tx, request.catalog_entry_id)
                        .await?
                        .ok_or(PurchaseError::NotFound(Resource::CatalogEntry))?;

                    if entry.stock < units {
                        return Err(PurchaseError::InsufficientStock {
                            requested: units,
                            available: entry.stock,
                        });
                    }

                    let balance = accounts
                        .lock_balance(tx, request.account_id)
                        .await?
                        .ok_or(PurchaseError::NotFound(Resource::Account))?;

                    let total = entry.price.checked_mul(u64::from(units)).ok_or(
                        PurchaseError::TotalOverflow {
                            price: entry.price,
                            quantity: units,
                        },
                    )?;

                    if balance < total {
                        return Err(PurchaseError::InsufficientFunds {
                            required: total,
                            available: balance,
                        });
                    }

                    accounts
                        .debit_balance(tx, request.account_id, total)
                        .await?;

                    catalog
                        .decrement_stock(tx, request.catalog_entry_id, units)
                        .await?;

                    let order = orders
                        .append_order(
                            tx,
                            NewOrder {
                                account_id: request.account_id,
                                catalog_entry_id: request.catalog_entry_id,
                                price: total,
                                quantity: units,
                            },
                        )
                        .await?;

                    Ok::<_, PurchaseError>(order)
                })
            })
            .await?;

        Span::current().record("order_id", tracing::field::display(order.id));

        Ok(order)
    }
}

#[async_trait]
impl PurchasesService for PgPurchasesService {
    async fn purchase(&self, request: PurchaseRequest) -> Result<OrderRecord, PurchaseError> {
        self.execute(request, self.default_deadline).await
    }

    async fn purchase_with_deadline(
        &self,
        request: PurchaseRequest,
        deadline: Duration,
    ) -> Result<OrderRecord, PurchaseError> {
        self.execute(request, Some(deadline)).await
    }
}

#[automock]
#[async_trait]
/// Atomic purchases against the ledger.
pub trait PurchasesService: Send + Sync {
    /// Buy `request.quantity` units of a catalog entry for an account.
    ///
    /// On success the account has been debited the order total, the entry's
    /// stock decremented and the returned order recorded, all in one commit.
    /// On failure nothing has changed, unless the error reports an unknown
    /// outcome (see [`PurchaseError::is_outcome_known`]).
    async fn purchase(&self, request: PurchaseRequest) -> Result<OrderRecord, PurchaseError>;

    /// Like [`PurchasesService::purchase`], but gives up with
    /// [`PurchaseError::DeadlineExceeded`] once `deadline` has elapsed,
    /// including while waiting for another purchase's row locks.
    async fn purchase_with_deadline(
        &self,
        request: PurchaseRequest,
        deadline: Duration,
    ) -> Result<OrderRecord, PurchaseError>;
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use jiff::Timestamp;
    use sqlx::query;
    use testresult::TestResult;
    use tokio::{task::JoinSet, time::timeout};

    use crate::{
        domain::{
            accounts::records::AccountId, catalog::records::CatalogEntryId, orders::OrdersService,
        },
        test::TestContext,
    };

    use super::*;

    /// Balance, stock and order count snapshot used to prove a failed
    /// purchase left no trace.
    async fn ledger_state(
        ctx: &TestContext,
        account: AccountId,
        entry: CatalogEntryId,
    ) -> (u64, u32, u64) {
        (
            ctx.balance_of(account).await,
            ctx.stock_of(entry).await,
            ctx.order_count().await,
        )
    }

    async fn purchase_concurrently(
        service: &PgPurchasesService,
        requests: Vec<PurchaseRequest>,
    ) -> Vec<Result<OrderRecord, PurchaseError>> {
        let mut set = JoinSet::new();

        for request in requests {
            let service = service.clone();

            set.spawn(async move { service.purchase(request).await });
        }

        let mut results = Vec::new();

        while let Some(joined) = set.join_next().await {
            results.push(joined.expect("purchase task should not panic"));
        }

        results
    }

    #[tokio::test]
    async fn purchase_debits_balance_decrements_stock_and_records_order() -> TestResult {
        let ctx = TestContext::new().await;
        let account = ctx.seed_account(100_00).await;
        let entry = ctx.seed_entry(10_00, 5).await;

        let order = ctx
            .purchases
            .purchase(PurchaseRequest::new(account, entry, 3))
            .await?;

        assert_eq!(order.account_id, account);
        assert_eq!(order.catalog_entry_id, entry);
        assert_eq!(order.price, 30_00);
        assert_eq!(order.quantity, 3);
        assert!(order.created_at > Timestamp::UNIX_EPOCH);

        assert_eq!(ctx.balance_of(account).await, 70_00);
        assert_eq!(ctx.stock_of(entry).await, 2);
        assert_eq!(ctx.order_count().await, 1);

        Ok(())
    }

    #[tokio::test]
    async fn purchase_beyond_remaining_stock_changes_nothing() -> TestResult {
        let ctx = TestContext::new().await;
        let account = ctx.seed_account(100_00).await;
        let entry = ctx.seed_entry(10_00, 5).await;

        ctx.purchases
            .purchase(PurchaseRequest::new(account, entry, 3))
            .await?;

        let before = ledger_state(&ctx, account, entry).await;

        let result = ctx
            .purchases
            .purchase(PurchaseRequest::new(account, entry, 3))
            .await;

        assert!(
            matches!(
                result,
                Err(PurchaseError::InsufficientStock {
                    requested: 3,
                    available: 2
                })
            ),
            "expected InsufficientStock, got {result:?}"
        );
        assert_eq!(ledger_state(&ctx, account, entry).await, before);
        assert_eq!(before, (70_00, 2, 1));

        Ok(())
    }

    #[tokio::test]
    async fn purchase_with_non_positive_quantity_is_rejected_before_touching_the_store() {
        let ctx = TestContext::new().await;

        // Neither id exists: a store lookup would report NotFound instead.
        let missing_account = AccountId::from_i64(1_000_001);
        let missing_entry = CatalogEntryId::from_i64(1_000_001);

        for quantity in [0, -1, i32::MIN] {
            let result = ctx
                .purchases
                .purchase(PurchaseRequest::new(missing_account, missing_entry, quantity))
                .await;

            assert!(
                matches!(result, Err(PurchaseError::InvalidQuantity(q)) if q == quantity),
                "expected InvalidQuantity({quantity}), got {result:?}"
            );
        }

        assert_eq!(ctx.order_count().await, 0);
    }

    #[tokio::test]
    async fn purchase_of_unknown_entry_returns_not_found() {
        let ctx = TestContext::new().await;
        let account = ctx.seed_account(100_00).await;

        let result = ctx
            .purchases
            .purchase(PurchaseRequest::new(
                account,
                CatalogEntryId::from_i64(424_242),
                1,
            ))
            .await;

        assert!(
            matches!(result, Err(PurchaseError::NotFound(Resource::CatalogEntry))),
            "expected NotFound(CatalogEntry), got {result:?}"
        );
        assert_eq!(ctx.balance_of(account).await, 100_00);
        assert_eq!(ctx.order_count().await, 0);
    }

    #[tokio::test]
    async fn purchase_by_unknown_account_returns_not_found_and_keeps_stock() {
        let ctx = TestContext::new().await;
        let entry = ctx.seed_entry(10_00, 5).await;

        let result = ctx
            .purchases
            .purchase(PurchaseRequest::new(AccountId::from_i64(424_242), entry, 1))
            .await;

        assert!(
            matches!(result, Err(PurchaseError::NotFound(Resource::Account))),
            "expected NotFound(Account), got {result:?}"
        );
        assert_eq!(ctx.stock_of(entry).await, 5);
        assert_eq!(ctx.order_count().await, 0);
    }

    #[tokio::test]
    async fn purchase_exceeding_balance_changes_nothing() {
        let ctx = TestContext::new().await;
        let account = ctx.seed_account(25_00).await;
        let entry = ctx.seed_entry(10_00, 5).await;

        let before = ledger_state(&ctx, account, entry).await;

        let result = ctx
            .purchases
            .purchase(PurchaseRequest::new(account, entry, 3))
            .await;

        assert!(
            matches!(
                result,
                Err(PurchaseError::InsufficientFunds {
                    required: 30_00,
                    available: 25_00
                })
            ),
            "expected InsufficientFunds, got {result:?}"
        );
        assert_eq!(ledger_state(&ctx, account, entry).await, before);
    }

    #[tokio::test]
    async fn purchase_spending_the_whole_balance_leaves_zero() -> TestResult {
        let ctx = TestContext::new().await;
        let account = ctx.seed_account(30_00).await;
        let entry = ctx.seed_entry(10_00, 3).await;

        ctx.purchases
            .purchase(PurchaseRequest::new(account, entry, 3))
            .await?;

        assert_eq!(ctx.balance_of(account).await, 0);
        assert_eq!(ctx.stock_of(entry).await, 0);

        Ok(())
    }

    #[tokio::test]
    async fn purchase_whose_total_overflows_is_rejected() {
        let ctx = TestContext::new().await;
        let account = ctx.seed_account(100_00).await;
        let price = i64::MAX.unsigned_abs();
        let entry = ctx.seed_entry(price, 5).await;

        let result = ctx
            .purchases
            .purchase(PurchaseRequest::new(account, entry, 3))
            .await;

        assert!(
            matches!(result, Err(PurchaseError::TotalOverflow { quantity: 3, .. })),
            "expected TotalOverflow, got {result:?}"
        );
        assert_eq!(ctx.stock_of(entry).await, 5);
    }

    #[tokio::test]
    async fn scarce_stock_is_sold_exactly_once_under_contention() {
        let ctx = TestContext::new().await;
        let entry = ctx.seed_entry(1_00, 5).await;

        let mut requests = Vec::new();

        for _ in 0..20 {
            let account = ctx.seed_account(10_00).await;

            requests.push(PurchaseRequest::new(account, entry, 1));
        }

        let results = purchase_concurrently(&ctx.purchases, requests).await;

        let succeeded = results.iter().filter(|result| result.is_ok()).count();
        let sold_out = results
            .iter()
            .filter(|result| matches!(result, Err(PurchaseError::InsufficientStock { .. })))
            .count();

        assert_eq!(succeeded, 5);
        assert_eq!(sold_out, 15);
        assert_eq!(ctx.stock_of(entry).await, 0);
        assert_eq!(ctx.order_count().await, 5);
    }

    #[tokio::test]
    async fn repeated_contention_never_loses_updates() {
        let ctx = TestContext::new().await;
        let account = ctx.seed_account(1_000_00).await;

        for round in 0..5 {
            let entry = ctx.seed_entry(2_00, 4).await;

            let requests = (0..12)
                .map(|_| PurchaseRequest::new(account, entry, 1))
                .collect();

            let results = purchase_concurrently(&ctx.purchases, requests).await;
            let succeeded = results.iter().filter(|result| result.is_ok()).count();

            assert_eq!(succeeded, 4, "round {round} sold the wrong number of units");
            assert_eq!(ctx.stock_of(entry).await, 0, "round {round} left stock behind");
        }

        assert_eq!(ctx.balance_of(account).await, 1_000_00 - 5 * 4 * 2_00);
        assert_eq!(ctx.order_count().await, 20);
    }

    #[tokio::test]
    async fn one_account_buying_concurrently_never_overdraws() {
        let ctx = TestContext::new().await;
        let account = ctx.seed_account(10_00).await;
        let entries = [
            ctx.seed_entry(1_00, 100).await,
            ctx.seed_entry(1_00, 100).await,
            ctx.seed_entry(1_00, 100).await,
        ];

        let requests = (0..30)
            .map(|i| PurchaseRequest::new(account, entries[i % entries.len()], 1))
            .collect();

        let results = purchase_concurrently(&ctx.purchases, requests).await;

        let succeeded = results.iter().filter(|result| result.is_ok()).count();
        let declined = results
            .iter()
            .filter(|result| matches!(result, Err(PurchaseError::InsufficientFunds { .. })))
            .count();

        assert_eq!(succeeded, 10);
        assert_eq!(declined, 20);
        assert_eq!(ctx.balance_of(account).await, 0);

        let mut remaining = 0;

        for entry in entries {
            remaining += ctx.stock_of(entry).await;
        }

        assert_eq!(remaining, 300 - 10);
    }

    #[tokio::test]
    async fn many_small_purchases_conserve_money_exactly() {
        let ctx = TestContext::new().await;
        let opening = 1_000_00;
        let account = ctx.seed_account(opening).await;
        let entry = ctx.seed_entry(7, 1_000).await;

        let requests = (0..150)
            .map(|i| PurchaseRequest::new(account, entry, i % 3 + 1))
            .collect();

        let results = purchase_concurrently(&ctx.purchases, requests).await;

        let mut charged = 0;
        let mut units = 0;

        for result in results {
            let order = result.expect("every purchase should be affordable");

            assert_eq!(order.price, 7 * u64::from(order.quantity));

            charged += order.price;
            units += order.quantity;
        }

        let orders = ctx
            .orders
            .list_orders(account)
            .await
            .expect("list_orders should succeed");

        assert_eq!(orders.iter().map(|order| order.price).sum::<u64>(), charged);
        assert_eq!(ctx.balance_of(account).await, opening - charged);
        assert_eq!(ctx.stock_of(entry).await, 1_000 - units);
    }

    #[tokio::test]
    async fn crossed_purchases_do_not_deadlock() {
        let ctx = TestContext::new().await;
        let account_1 = ctx.seed_account(100_00).await;
        let account_2 = ctx.seed_account(100_00).await;
        let item_1 = ctx.seed_entry(1_00, 50).await;
        let item_2 = ctx.seed_entry(1_00, 50).await;

        let requests = (0..20)
            .flat_map(|_| {
                [
                    PurchaseRequest::new(account_2, item_1, 1),
                    PurchaseRequest::new(account_1, item_2, 1),
                ]
            })
            .collect();

        let results = timeout(
            Duration::from_secs(30),
            purchase_concurrently(&ctx.purchases, requests),
        )
        .await
        .expect("crossed purchases should finish without deadlocking");

        assert!(
            results.iter().all(Result::is_ok),
            "every crossed purchase should succeed: {results:?}"
        );
        assert_eq!(ctx.stock_of(item_1).await, 30);
        assert_eq!(ctx.stock_of(item_2).await, 30);
        assert_eq!(ctx.balance_of(account_1).await, 80_00);
        assert_eq!(ctx.balance_of(account_2).await, 80_00);
    }

    #[tokio::test]
    async fn purchase_waits_for_the_account_lock_holder() -> TestResult {
        let ctx = TestContext::new().await;
        let account = ctx.seed_account(100_00).await;
        let entry = ctx.seed_entry(10_00, 5).await;

        let mut holder = ctx.db.pool().begin().await?;

        query("SELECT balance FROM accounts WHERE id = $1 FOR UPDATE")
            .bind(account.into_i64())
            .execute(&mut *holder)
            .await?;

        let service = ctx.purchases.clone();
        let pending = tokio::spawn(async move {
            service
                .purchase(PurchaseRequest::new(account, entry, 2))
                .await
        });

        tokio::time::sleep(Duration::from_millis(200)).await;

        assert!(!pending.is_finished(), "purchase should block on the account lock");

        // The catalog entry is locked first, so it is already held by the
        // waiting purchase.
        let entry_probe = query("SELECT stock FROM catalog_entries WHERE id = $1 FOR UPDATE NOWAIT")
            .bind(entry.into_i64())
            .execute(ctx.db.pool())
            .await;

        assert!(
            entry_probe.is_err(),
            "catalog entry should be locked before the account"
        );

        query("UPDATE accounts SET balance = 1500 WHERE id = $1")
            .bind(account.into_i64())
            .execute(&mut *holder)
            .await?;

        holder.commit().await?;

        let result = timeout(Duration::from_secs(10), pending).await??;

        assert!(
            matches!(
                result,
                Err(PurchaseError::InsufficientFunds {
                    required: 20_00,
                    available: 15_00
                })
            ),
            "purchase should see the committed balance, got {result:?}"
        );
        assert_eq!(ctx.stock_of(entry).await, 5);

        Ok(())
    }

    #[tokio::test]
    async fn purchase_blocked_past_its_deadline_is_abandoned() -> TestResult {
        let ctx = TestContext::new().await;
        let account = ctx.seed_account(100_00).await;
        let entry = ctx.seed_entry(10_00, 5).await;

        let mut holder = ctx.db.pool().begin().await?;

        query("SELECT stock FROM catalog_entries WHERE id = $1 FOR UPDATE")
            .bind(entry.into_i64())
            .execute(&mut *holder)
            .await?;

        let result = ctx
            .purchases
            .purchase_with_deadline(
                PurchaseRequest::new(account, entry, 1),
                Duration::from_millis(200),
            )
            .await;

        assert!(
            matches!(result, Err(PurchaseError::DeadlineExceeded)),
            "expected DeadlineExceeded, got {result:?}"
        );

        holder.rollback().await?;

        assert_eq!(ledger_state(&ctx, account, entry).await, (100_00, 5, 0));

        ctx.purchases
            .purchase_with_deadline(
                PurchaseRequest::new(account, entry, 1),
                Duration::from_secs(5),
            )
            .await?;

        assert_eq!(ledger_state(&ctx, account, entry).await, (90_00, 4, 1));

        Ok(())
    }

    #[tokio::test]
    async fn abandoned_purchase_releases_the_catalog_lock_immediately() -> TestResult {
        let ctx = TestContext::new().await;
        let account = ctx.seed_account(100_00).await;
        let entry = ctx.seed_entry(10_00, 5).await;

        let mut entry_holder = ctx.db.pool().begin().await?;

        query("SELECT stock FROM catalog_entries WHERE id = $1 FOR UPDATE")
            .bind(entry.into_i64())
            .execute(&mut *entry_holder)
            .await?;

        let mut account_holder = ctx.db.pool().begin().await?;

        query("SELECT balance FROM accounts WHERE id = $1 FOR UPDATE")
            .bind(account.into_i64())
            .execute(&mut *account_holder)
            .await?;

        // The entry wait uses part of the deadline; the account wait uses the rest.
        let release_entry = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(150)).await;
            entry_holder.rollback().await
        });

        let result = ctx
            .purchases
            .purchase_with_deadline(
                PurchaseRequest::new(account, entry, 1),
                Duration::from_millis(300),
            )
            .await;

        assert!(
            matches!(result, Err(PurchaseError::DeadlineExceeded)),
            "expected DeadlineExceeded, got {result:?}"
        );

        let entry_probe =
            query("SELECT stock FROM catalog_entries WHERE id = $1 FOR UPDATE NOWAIT")
                .bind(entry.into_i64())
                .execute(ctx.db.pool())
                .await;

        assert!(
            entry_probe.is_ok(),
            "catalog entry should be unlocked once the purchase gives up: {entry_probe:?}"
        );

        release_entry.await??;
        account_holder.rollback().await?;

        assert_eq!(ledger_state(&ctx, account, entry).await, (100_00, 5, 0));

        Ok(())
    }

    #[tokio::test]
    async fn default_deadline_applies_to_plain_purchases() -> TestResult {
        let ctx = TestContext::new().await;
        let account = ctx.seed_account(100_00).await;
        let entry = ctx.seed_entry(10_00, 5).await;
        let service = ctx
            .purchases
            .clone()
            .with_default_deadline(Duration::from_millis(200));

        let mut holder = ctx.db.pool().begin().await?;

        query("SELECT balance FROM accounts WHERE id = $1 FOR UPDATE")
            .bind(account.into_i64())
            .execute(&mut *holder)
            .await?;

        let result = service
            .purchase(PurchaseRequest::new(account, entry, 1))
            .await;

        assert!(
            matches!(result, Err(PurchaseError::DeadlineExceeded)),
            "expected DeadlineExceeded, got {result:?}"
        );

        holder.rollback().await?;

        // The abandoned attempt must have released its catalog lock.
        service
            .purchase(PurchaseRequest::new(account, entry, 1))
            .await?;

        assert_eq!(ctx.stock_of(entry).await, 4);

        Ok(())
    }
}
