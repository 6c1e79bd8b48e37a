//! Purchases
//!
//! The purchase engine: debits an account, decrements a catalog entry's stock
//! and appends the order as one unit of work.

pub mod data;
pub mod errors;
pub mod service;

pub use errors::PurchaseError;
pub use service::*;
