//! Order Data

use crate::domain::{accounts::records::AccountId, catalog::records::CatalogEntryId};

/// New Order Data
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrder {
    pub account_id: AccountId,
    pub catalog_entry_id: CatalogEntryId,
    pub price: u64,
    pub quantity: u32,
}

/// Optional filters for order aggregates.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct OrderFilter {
    pub account_id: Option<AccountId>,
    pub catalog_entry_id: Option<CatalogEntryId>,
}
