//! Order Records

use jiff::Timestamp;
use serde::Serialize;

use crate::{
    domain::{accounts::records::AccountId, catalog::records::CatalogEntryId},
    ids::TypedId,
};

/// Order Id
pub type OrderId = TypedId<OrderRecord>;

/// Order Record
///
/// Written once by a completed purchase and never changed afterwards.
/// `price` is the total charged, i.e. unit price times `quantity`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderRecord {
    pub id: OrderId,
    pub account_id: AccountId,
    pub catalog_entry_id: CatalogEntryId,
    pub price: u64,
    pub quantity: u32,
    pub created_at: Timestamp,
}

/// Aggregate over a set of orders.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OrderTotals {
    pub count: u64,
    pub price: u64,
    pub quantity: u64,
}
