//! Entry repository and ledger service traits.
//!
//! These traits define the contract for ledger persistence without any
//! database-specific types, allowing for different storage implementations.

use async_trait::async_trait;
use chrono::NaiveDate;

use super::ledger_engine::Ledger;
use super::ledger_model::{DuplicatePolicy, EntryChangeSet, LedgerMutation};
use crate::accounts::AccountKind;
use crate::entries::{Entry, EntryId, EntryUpdate, NewEntry};
use crate::errors::Result;

/// Trait defining the contract for entry repository operations.
///
/// Implementations are expected to return consistent snapshots and to apply a
/// change set atomically; the engine does no retries of its own.
#[async_trait]
pub trait EntryRepositoryTrait: Send + Sync {
    /// Kind of the account, which fixes the kind of its entries.
    fn get_account_kind(&self, account_id: &str) -> Result<AccountKind>;

    /// Loads an account's entries, optionally limited to `[start, end]`.
    fn load_entries(
        &self,
        account_id: &str,
        range: Option<(NaiveDate, NaiveDate)>,
    ) -> Result<Vec<Entry>>;

    fn get_entry(&self, account_id: &str, entry_id: EntryId) -> Result<Entry>;

    /// The youngest entry posted strictly before `date`.
    fn get_next_older_by_date(&self, account_id: &str, date: NaiveDate) -> Result<Option<Entry>>;

    /// The oldest entry posted strictly after `date`.
    fn get_next_younger_by_date(
        &self,
        account_id: &str,
        date: NaiveDate,
    ) -> Result<Option<Entry>>;

    fn get_max_entry_id(&self, account_id: &str) -> Result<Option<EntryId>>;

    /// Applies deletions, then upserts, in one transaction.
    ///
    /// The implementation handles transaction management internally.
    async fn apply_changes(&self, changes: EntryChangeSet) -> Result<()>;
}

/// Trait defining the contract for ledger service operations.
#[async_trait]
pub trait LedgerServiceTrait: Send + Sync {
    /// Loads the complete ledger of an account.
    fn load_ledger(&self, account_id: &str) -> Result<Ledger>;

    fn get_entry(&self, account_id: &str, entry_id: EntryId) -> Result<Entry>;

    /// Entries within `[start, end]`, most recent first.
    fn get_entries_between(
        &self,
        account_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Entry>>;

    /// Inserts an entry, rejecting exact duplicates.
    async fn create_entry(&self, new_entry: NewEntry) -> Result<LedgerMutation>;

    async fn create_entry_with(
        &self,
        new_entry: NewEntry,
        policy: DuplicatePolicy,
    ) -> Result<LedgerMutation>;

    async fn update_entry(
        &self,
        account_id: &str,
        entry_id: EntryId,
        update: EntryUpdate,
    ) -> Result<LedgerMutation>;

    async fn delete_entry(&self, account_id: &str, entry_id: EntryId) -> Result<LedgerMutation>;

    /// Recomputes every stored balance of an account and persists the ones that changed.
    async fn repair_ledger(&self, account_id: &str) -> Result<Vec<Entry>>;
}
