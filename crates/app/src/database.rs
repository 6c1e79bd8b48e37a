//! Database connection management and units of work

use std::{future::Future, pin::Pin, time::Duration};

use sqlx::{
    PgPool, Postgres, Transaction, migrate::MigrateError, postgres::PgPoolOptions, query,
    query_scalar,
};
use thiserror::Error;
use tokio::time::{Instant, timeout_at};
use tracing::warn;

/// SQL used to bound lock waits and statements for the current transaction only.
pub const SET_DEADLINE_SQL: &str = "SELECT set_config('lock_timeout', $1, true), \
     set_config('statement_timeout', $1, true)";

const BACKEND_PID_SQL: &str = "SELECT pg_backend_pid()";

const CANCEL_BACKEND_SQL: &str = "SELECT pg_cancel_backend($1)";

/// SQLSTATE raised when `lock_timeout` expires.
const LOCK_NOT_AVAILABLE: &str = "55P03";

/// SQLSTATE raised when `statement_timeout` expires.
const QUERY_CANCELED: &str = "57014";

/// Future returned by a unit of work, borrowing the transaction it runs in.
pub type UnitOfWork<'c, T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + Send + 'c>>;

/// Failures raised by the unit of work boundary itself, as opposed to the work.
#[derive(Debug, Error)]
pub enum UnitOfWorkError {
    #[error("failed to begin unit of work")]
    Begin(#[source] sqlx::Error),

    #[error("failed to commit unit of work; outcome unknown")]
    Commit(#[source] sqlx::Error),

    #[error("unit of work exceeded its deadline")]
    DeadlineExceeded,
}

#[derive(Debug, Clone)]
pub struct Db {
    pool: PgPool,
}

impl Db {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Run `work` inside a single transaction.
    ///
    /// The transaction commits when `work` returns `Ok` and rolls back when it
    /// returns `Err`. If `work` panics the transaction is dropped and rolled
    /// back by the driver.
    ///
    /// With a `deadline`, beginning the transaction and running `work` must
    /// finish before it elapses. The deadline is also installed as the
    /// transaction's `lock_timeout` and `statement_timeout`. When it elapses
    /// mid-work, the statement still running on the server is cancelled and
    /// the transaction rolled back before this returns, so no row lock taken
    /// by `work` outlives the call. Commit is never cut short by the deadline.
    ///
    /// Only a failed commit has an unknown outcome; it is reported as
    /// [`UnitOfWorkError::Commit`].
    ///
    /// # Errors
    ///
    /// Returns the error produced by `work`, or a [`UnitOfWorkError`] converted
    /// into `E` when beginning or committing the transaction fails or the
    /// deadline elapses.
    pub async fn run_atomic<T, E, F>(&self, deadline: Option<Duration>, work: F) -> Result<T, E>
    where
        F: for<'c> FnOnce(&'c mut Transaction<'static, Postgres>) -> UnitOfWork<'c, T, E> + Send,
        T: Send,
        E: From<UnitOfWorkError> + Send,
    {
        let Some(deadline) = deadline else {
            let mut tx = self
                .pool
                .begin()
                .await
                .map_err(|error| E::from(UnitOfWorkError::Begin(error)))?;

            let outcome = work(&mut tx).await;

            return finish(tx, outcome).await;
        };

        let expires_at = Instant::now() + deadline;

        let (mut tx, backend) = timeout_at(expires_at, self.begin_with_deadline(deadline))
            .await
            .map_err(|_elapsed| E::from(UnitOfWorkError::DeadlineExceeded))?
            .map_err(|error| E::from(UnitOfWorkError::Begin(error)))?;

        let attempt = timeout_at(expires_at, work(&mut tx)).await;

        let Ok(outcome) = attempt else {
            self.abandon(tx, backend).await;

            return Err(E::from(UnitOfWorkError::DeadlineExceeded));
        };

        finish(tx, outcome).await
    }

    /// Begin a transaction bounded by `deadline` and return it with the
    /// server process id serving it.
    async fn begin_with_deadline(
        &self,
        deadline: Duration,
    ) -> Result<(Transaction<'static, Postgres>, i32), sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        query(SET_DEADLINE_SQL)
            .bind(deadline_setting(deadline))
            .execute(&mut *tx)
            .await?;

        let backend = query_scalar(BACKEND_PID_SQL).fetch_one(&mut *tx).await?;

        Ok((tx, backend))
    }

    /// Cancel whatever `backend` is still executing for a timed out unit of
    /// work, then roll its transaction back.
    ///
    /// The rollback waits for the cancelled statement to finish, so once this
    /// returns the transaction's row locks are released.
    async fn abandon(&self, tx: Transaction<'static, Postgres>, backend: i32) {
        if let Err(error) = query(CANCEL_BACKEND_SQL)
            .bind(backend)
            .execute(&self.pool)
            .await
        {
            warn!(%error, backend, "failed to cancel timed out unit of work");
        }

        if let Err(error) = tx.rollback().await {
            warn!(%error, backend, "failed to roll back timed out unit of work");
        }
    }
}

async fn finish<T, E>(tx: Transaction<'static, Postgres>, outcome: Result<T, E>) -> Result<T, E>
where
    E: From<UnitOfWorkError>,
{
    match outcome {
        Ok(value) => {
            tx.commit()
                .await
                .map_err(|error| E::from(UnitOfWorkError::Commit(error)))?;

            Ok(value)
        }
        Err(error) => {
            if let Err(rollback_error) = tx.rollback().await {
                warn!(error = %rollback_error, "failed to roll back unit of work");
            }

            Err(error)
        }
    }
}

/// Whether `error` is the server cancelling a statement because a deadline
/// installed by [`Db::run_atomic`] expired.
pub fn is_deadline_error(error: &sqlx::Error) -> bool {
    error
        .as_database_error()
        .and_then(|error| error.code())
        .is_some_and(|code| code == LOCK_NOT_AVAILABLE || code == QUERY_CANCELED)
}

/// `PostgreSQL` treats a zero timeout as "no timeout", so round up to 1ms.
fn deadline_setting(deadline: Duration) -> String {
    format!("{}ms", deadline.as_millis().max(1))
}

/// Connect to `PostgreSQL`.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(database_url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
}

/// Apply the embedded ledger migrations.
///
/// # Errors
///
/// Returns an error if any migration fails to apply.
pub async fn migrate(pool: &PgPool) -> Result<(), MigrateError> {
    sqlx::migrate!("../../migrations").run(pool).await
}
