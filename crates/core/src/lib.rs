//! Finledger Core - ledger consistency engine for personal finance accounts.
//!
//! This crate keeps per-account ledgers ordered and balance-consistent,
//! projects bond values from their rate schedules and reconciles imported
//! entries against stored ones. It is storage-agnostic and defines the
//! repository traits a host application implements.

pub mod accounts;
pub mod bonds;
pub mod constants;
pub mod entries;
pub mod errors;
pub mod events;
pub mod ledger;
pub mod reconciliation;
pub mod utils;

// Re-export error types
pub use errors::Error;
pub use errors::Result;
