//! Account Records

use jiff::Timestamp;
use serde::Serialize;

use crate::ids::TypedId;

/// Account Id
pub type AccountId = TypedId<AccountRecord>;

/// Account Record
#[derive(Debug, Clone, Serialize)]
pub struct AccountRecord {
    pub id: AccountId,
    pub name: String,
    pub balance: u64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
