//! Ledger domain, persistence and purchase engine.

pub mod config;
pub mod context;
pub mod database;
pub mod domain;
pub mod money;
pub mod observability;

#[cfg(test)]
mod test;

mod ids;
