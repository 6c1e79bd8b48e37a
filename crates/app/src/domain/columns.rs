//! Column conversions shared by the ledger repositories.
//!
//! Amounts are unsigned minor units in Rust and `BIGINT` in the database;
//! stock and quantities are `u32` in Rust and `INTEGER` in the database.

use sqlx::{Row, postgres::PgRow};

pub(crate) fn try_get_amount(row: &PgRow, col: &str) -> Result<u64, sqlx::Error> {
    let amount_i64: i64 = row.try_get(col)?;

    u64::try_from(amount_i64).map_err(|e| sqlx::Error::ColumnDecode {
        index: col.to_string(),
        source: Box::new(e),
    })
}

pub(crate) fn try_get_count(row: &PgRow, col: &str) -> Result<u32, sqlx::Error> {
    let count_i32: i32 = row.try_get(col)?;

    u32::try_from(count_i32).map_err(|e| sqlx::Error::ColumnDecode {
        index: col.to_string(),
        source: Box::new(e),
    })
}

pub(crate) fn amount_param(col: &str, amount: u64) -> Result<i64, sqlx::Error> {
    i64::try_from(amount).map_err(|e| sqlx::Error::Encode(format!("{col}: {e}").into()))
}

pub(crate) fn count_param(col: &str, count: u32) -> Result<i32, sqlx::Error> {
    i32::try_from(count).map_err(|e| sqlx::Error::Encode(format!("{col}: {e}").into()))
}
