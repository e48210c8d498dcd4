use async_trait::async_trait;
use chrono::NaiveDate;
use log::{debug, info};
use std::sync::Arc;

use super::account_locks::AccountLocks;
use super::ledger_engine::Ledger;
use super::ledger_model::{DuplicatePolicy, EntryChangeSet, LedgerMutation};
use super::ledger_traits::{EntryRepositoryTrait, LedgerServiceTrait};
use crate::entries::{Entry, EntryId, EntryUpdate, NewEntry};
use crate::errors::Result;
use crate::events::{DomainEvent, DomainEventSink};

/// Service for mutating account ledgers through a repository.
///
/// Each mutation loads the account's ledger, applies the change in memory,
/// persists every entry whose balance moved, then emits a domain event.
pub struct LedgerService {
    repository: Arc<dyn EntryRepositoryTrait>,
    event_sink: Arc<dyn DomainEventSink>,
    account_locks: Arc<AccountLocks>,
}

impl LedgerService {
    /// Creates a new LedgerService instance with injected dependencies
    pub fn new(
        repository: Arc<dyn EntryRepositoryTrait>,
        event_sink: Arc<dyn DomainEventSink>,
        account_locks: Arc<AccountLocks>,
    ) -> Self {
        Self {
            repository,
            event_sink,
            account_locks,
        }
    }

    async fn persist_saved(&self, account_id: &str, mutation: &LedgerMutation) -> Result<()> {
        let changes = EntryChangeSet::from_saved(account_id, mutation);
        self.repository.apply_changes(changes).await?;
        self.event_sink
            .emit(DomainEvent::entries_changed(account_id, mutation.entry_ids()));
        Ok(())
    }
}

#[async_trait]
impl LedgerServiceTrait for LedgerService {
    fn load_ledger(&self, account_id: &str) -> Result<Ledger> {
        let kind = self.repository.get_account_kind(account_id)?;
        let entries = self.repository.load_entries(account_id, None)?;
        debug!(
            "Loaded {} entries for {} account {}",
            entries.len(),
            kind,
            account_id
        );
        Ledger::from_entries(account_id, kind, entries)
    }

    fn get_entry(&self, account_id: &str, entry_id: EntryId) -> Result<Entry> {
        self.repository.get_entry(account_id, entry_id)
    }

    fn get_entries_between(
        &self,
        account_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Entry>> {
        let mut entries = self
            .repository
            .load_entries(account_id, Some((start, end)))?;
        entries.sort_by(|a, b| {
            (b.posting_date(), b.entry_id()).cmp(&(a.posting_date(), a.entry_id()))
        });
        Ok(entries)
    }

    async fn create_entry(&self, new_entry: NewEntry) -> Result<LedgerMutation> {
        self.create_entry_with(new_entry, DuplicatePolicy::Reject)
            .await
    }

    async fn create_entry_with(
        &self,
        new_entry: NewEntry,
        policy: DuplicatePolicy,
    ) -> Result<LedgerMutation> {
        let account_id = new_entry.account_id.clone();
        let _guard = self.account_locks.lock(&account_id).await;

        let mut ledger = self.load_ledger(&account_id)?;
        let mutation = ledger.insert_with(new_entry, policy)?;
        self.persist_saved(&account_id, &mutation).await?;
        Ok(mutation)
    }

    async fn update_entry(
        &self,
        account_id: &str,
        entry_id: EntryId,
        update: EntryUpdate,
    ) -> Result<LedgerMutation> {
        let _guard = self.account_locks.lock(account_id).await;

        let mut ledger = self.load_ledger(account_id)?;
        let mutation = ledger.update(entry_id, update)?;
        self.persist_saved(account_id, &mutation).await?;
        Ok(mutation)
    }

    async fn delete_entry(&self, account_id: &str, entry_id: EntryId) -> Result<LedgerMutation> {
        let _guard = self.account_locks.lock(account_id).await;

        let mut ledger = self.load_ledger(account_id)?;
        let mutation = ledger.remove(entry_id)?;
        let changes = EntryChangeSet::from_removed(account_id, &mutation);
        self.repository.apply_changes(changes).await?;

        let mut events = vec![DomainEvent::entries_removed(account_id, vec![entry_id])];
        if !mutation.recalculated.is_empty() {
            events.push(DomainEvent::entries_changed(
                account_id,
                mutation.recalculated.iter().map(Entry::entry_id).collect(),
            ));
        }
        self.event_sink.emit_batch(events);
        Ok(mutation)
    }

    async fn repair_ledger(&self, account_id: &str) -> Result<Vec<Entry>> {
        let _guard = self.account_locks.lock(account_id).await;

        let mut ledger = self.load_ledger(account_id)?;
        let repaired = ledger.recalculate_all()?;
        if repaired.is_empty() {
            return Ok(repaired);
        }

        info!(
            "Repaired {} stale balances in account {}",
            repaired.len(),
            account_id
        );
        let changes = EntryChangeSet {
            account_id: account_id.to_string(),
            upserts: repaired.clone(),
            deletions: Vec::new(),
        };
        self.repository.apply_changes(changes).await?;
        self.event_sink.emit(DomainEvent::entries_changed(
            account_id,
            repaired.iter().map(Entry::entry_id).collect(),
        ));
        Ok(repaired)
    }
}
