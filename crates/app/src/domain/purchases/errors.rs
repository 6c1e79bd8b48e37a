//! Purchase errors.

use std::fmt::{Display, Formatter, Result as FmtResult};

use thiserror::Error;

use crate::database::{UnitOfWorkError, is_deadline_error};

/// Ledger resource a purchase refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Account,
    CatalogEntry,
}

impl Display for Resource {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Account => f.write_str("account"),
            Self::CatalogEntry => f.write_str("catalog entry"),
        }
    }
}

/// Why a purchase did not complete.
///
/// Every variant except [`PurchaseError::OutcomeUnknown`] guarantees that the
/// ledger is exactly as it was before the attempt.
#[derive(Debug, Error)]
pub enum PurchaseError {
    #[error("quantity must be greater than zero, got {0}")]
    InvalidQuantity(i32),

    #[error("{0} not found")]
    NotFound(Resource),

    #[error("insufficient stock: requested {requested}, available {available}")]
    InsufficientStock { requested: u32, available: u32 },

    #[error("insufficient funds: required {required}, available {available}")]
    InsufficientFunds { required: u64, available: u64 },

    #[error("order total overflows: unit price {price} x quantity {quantity}")]
    TotalOverflow { price: u64, quantity: u32 },

    #[error("purchase exceeded its deadline")]
    DeadlineExceeded,

    #[error("storage error; purchase was not applied")]
    Storage(#[source] sqlx::Error),

    #[error("commit failed; purchase outcome is unknown")]
    OutcomeUnknown(#[source] sqlx::Error),
}

impl PurchaseError {
    /// `false` only when the commit itself failed, in which case the purchase
    /// may or may not have been applied and must not be blindly retried.
    #[must_use]
    pub fn is_outcome_known(&self) -> bool {
        !matches!(self, Self::OutcomeUnknown(_))
    }
}

impl From<sqlx::Error> for PurchaseError {
    fn from(error: sqlx::Error) -> Self {
        if is_deadline_error(&error) {
            return Self::DeadlineExceeded;
        }

        Self::Storage(error)
    }
}

impl From<UnitOfWorkError> for PurchaseError {
    fn from(error: UnitOfWorkError) -> Self {
        match error {
            UnitOfWorkError::Begin(error) => error.into(),
            UnitOfWorkError::Commit(error) => Self::OutcomeUnknown(error),
            UnitOfWorkError::DeadlineExceeded => Self::DeadlineExceeded,
        }
    }
}
