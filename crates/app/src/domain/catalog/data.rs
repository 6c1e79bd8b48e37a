//! Catalog Data

/// New Catalog Entry Data
#[derive(Debug, Clone, PartialEq)]
pub struct NewCatalogEntry {
    pub name: String,
    pub price: u64,
    pub stock: u32,
}
