//! Ledger Domain Concerns

pub mod accounts;
pub mod catalog;
pub(crate) mod columns;
pub mod orders;
pub mod purchases;
