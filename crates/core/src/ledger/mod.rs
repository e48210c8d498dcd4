//! Ledger module - the ordered, balance-consistent entry store, its
//! repository contract and the service that persists mutations.

mod account_locks;
mod ledger_engine;
mod ledger_errors;
mod ledger_model;
mod ledger_service;
mod ledger_traits;
mod memory_repository;



pub use account_locks::AccountLocks;
pub use ledger_engine::Ledger;
pub use ledger_errors::LedgerError;
pub use ledger_model::{DuplicatePolicy, EntryChangeSet, LedgerMutation};
pub use ledger_service::LedgerService;
pub use ledger_traits::{EntryRepositoryTrait, LedgerServiceTrait};
pub use memory_repository::InMemoryEntryRepository;
