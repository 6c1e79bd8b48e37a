//! Catalog Records

use jiff::Timestamp;
use serde::Serialize;

use crate::ids::TypedId;

/// Catalog Entry Id
pub type CatalogEntryId = TypedId<CatalogEntryRecord>;

/// Catalog Entry Record
#[derive(Debug, Clone, Serialize)]
pub struct CatalogEntryRecord {
    pub id: CatalogEntryId,
    pub name: String,
    pub price: u64,
    pub stock: u32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Price and stock read under an exclusive row lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockedEntry {
    pub price: u64,
    pub stock: u32,
}
