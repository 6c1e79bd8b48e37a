//! Accounts service.

use async_trait::async_trait;
use mockall::automock;

use crate::{
    database::Db,
    domain::accounts::{
        data::NewAccount,
        errors::AccountsServiceError,
        records::{AccountId, AccountRecord},
        repository::PgAccountsRepository,
    },
};

#[derive(Debug, Clone)]
pub struct PgAccountsService {
    db: Db,
    repository: PgAccountsRepository,
}

impl PgAccountsService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            repository: PgAccountsRepository::new(),
        }
    }
}

#[async_trait]
impl AccountsService for PgAccountsService {
    #[tracing::instrument(
        name = "accounts.service.create_account",
        skip(self, account),
        fields(account_id = tracing::field::Empty),
        err
    )]
    async fn create_account(
        &self,
        account: NewAccount,
    ) -> Result<AccountRecord, AccountsServiceError> {
        if account.name.trim().is_empty() {
            return Err(AccountsServiceError::MissingRequiredData);
        }

        let created = self
            .repository
            .create_account(self.db.pool(), account)
            .await?;

        tracing::Span::current().record("account_id", tracing::field::display(created.id));

        Ok(created)
    }

    async fn get_account(&self, account: AccountId) -> Result<AccountRecord, AccountsServiceError> {
        self.repository
            .get_account(self.db.pool(), account)
            .await
            .map_err(Into::into)
    }
}

#[automock]
#[async_trait]
/// Account provisioning and lookup.
pub trait AccountsService: Send + Sync {
    /// Creates an account with an opening balance in minor units.
    async fn create_account(
        &self,
        account: NewAccount,
    ) -> Result<AccountRecord, AccountsServiceError>;

    /// Retrieve a single account.
    async fn get_account(&self, account: AccountId) -> Result<AccountRecord, AccountsServiceError>;
}
