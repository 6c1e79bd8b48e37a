//! Account Data

/// New Account Data
#[derive(Debug, Clone, PartialEq)]
pub struct NewAccount {
    pub name: String,
    pub balance: u64,
}
