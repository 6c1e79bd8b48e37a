//! Accounts Repository

use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, PgExecutor, Postgres, Row, Transaction, postgres::PgRow, query, query_as};

use crate::domain::{
    accounts::{
        data::NewAccount,
        records::{AccountId, AccountRecord},
    },
    columns::{amount_param, try_get_amount},
};

const GET_ACCOUNT_SQL: &str = include_str!("sql/get_account.sql");
const CREATE_ACCOUNT_SQL: &str = include_str!("sql/create_account.sql");
const LOCK_BALANCE_SQL: &str = include_str!("sql/lock_balance.sql");
const DEBIT_BALANCE_SQL: &str = include_str!("sql/debit_balance.sql");

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct PgAccountsRepository;

impl PgAccountsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn get_account<'e, E>(
        &self,
        executor: E,
        account: AccountId,
    ) -> Result<AccountRecord, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        query_as::<Postgres, AccountRecord>(GET_ACCOUNT_SQL)
            .bind(account.into_i64())
            .fetch_one(executor)
            .await
    }

    pub(crate) async fn create_account<'e, E>(
        &self,
        executor: E,
        account: NewAccount,
    ) -> Result<AccountRecord, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        query_as::<Postgres, AccountRecord>(CREATE_ACCOUNT_SQL)
            .bind(account.name)
            .bind(amount_param("balance", account.balance)?)
            .fetch_one(executor)
            .await
    }

    /// Lock the account row until `tx` ends and return its balance.
    ///
    /// Returns `None` when the account does not exist.
    pub(crate) async fn lock_balance(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        account: AccountId,
    ) -> Result<Option<u64>, sqlx::Error> {
        query(LOCK_BALANCE_SQL)
            .bind(account.into_i64())
            .fetch_optional(&mut **tx)
            .await?
            .map(|row| try_get_amount(&row, "balance"))
            .transpose()
    }

    /// Subtract `amount` from the balance. The caller must hold the row lock
    /// from [`Self::lock_balance`] and have checked the balance covers it.
    pub(crate) async fn debit_balance(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        account: AccountId,
        amount: u64,
    ) -> Result<(), sqlx::Error> {
        query(DEBIT_BALANCE_SQL)
            .bind(account.into_i64())
            .bind(amount_param("amount", amount)?)
            .execute(&mut **tx)
            .await?;

        Ok(())
    }
}

impl<'r> FromRow<'r, PgRow> for AccountRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            id: AccountId::from_i64(row.try_get("id")?),
            name: row.try_get("name")?,
            balance: try_get_amount(row, "balance")?,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
        })
    }
}
