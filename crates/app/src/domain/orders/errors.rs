//! Orders service errors.

use sqlx::Error;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OrdersServiceError {
    #[error("storage error")]
    Sql(#[from] Error),
}
