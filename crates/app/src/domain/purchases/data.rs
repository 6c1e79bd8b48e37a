//! Purchase Data

use crate::domain::{
    accounts::records::AccountId, catalog::records::CatalogEntryId,
    purchases::errors::PurchaseError,
};

/// Purchase Request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PurchaseRequest {
    pub account_id: AccountId,
    pub catalog_entry_id: CatalogEntryId,
    pub quantity: i32,
}

impl PurchaseRequest {
    #[must_use]
    pub fn new(account_id: AccountId, catalog_entry_id: CatalogEntryId, quantity: i32) -> Self {
        Self {
            account_id,
            catalog_entry_id,
            quantity,
        }
    }

    /// The requested quantity as a unit count.
    ///
    /// # Errors
    ///
    /// Returns [`PurchaseError::InvalidQuantity`] when the quantity is zero or negative.
    pub fn units(&self) -> Result<u32, PurchaseError> {
        u32::try_from(self.quantity)
            .ok()
            .filter(|units| *units > 0)
            .ok_or(PurchaseError::InvalidQuantity(self.quantity))
    }
}
