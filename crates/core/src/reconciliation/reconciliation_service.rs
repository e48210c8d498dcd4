use async_trait::async_trait;
use log::debug;
use std::sync::Arc;

use super::reconciliation_engine::ReconciliationEngine;
use super::reconciliation_model::{
    ApplyResolutionsResult, ImportCandidate, ReconciliationReport, ResolvedConflict,
};
use super::reconciliation_traits::ReconciliationServiceTrait;
use crate::entries::{Entry, EntryId};
use crate::errors::Result;
use crate::events::{DomainEvent, DomainEventSink};
use crate::ledger::{AccountLocks, EntryChangeSet, EntryRepositoryTrait, Ledger};

/// Runs reconciliation against stored ledgers.
///
/// Holds the account lock for the whole batch, so a ledger service sharing
/// the same [`AccountLocks`] cannot interleave with an import.
pub struct ReconciliationService {
    repository: Arc<dyn EntryRepositoryTrait>,
    event_sink: Arc<dyn DomainEventSink>,
    account_locks: Arc<AccountLocks>,
    engine: ReconciliationEngine,
}

impl ReconciliationService {
    pub fn new(
        repository: Arc<dyn EntryRepositoryTrait>,
        event_sink: Arc<dyn DomainEventSink>,
        account_locks: Arc<AccountLocks>,
        engine: ReconciliationEngine,
    ) -> Self {
        Self {
            repository,
            event_sink,
            account_locks,
            engine,
        }
    }

    fn load_ledger(&self, account_id: &str) -> Result<Ledger> {
        let kind = self.repository.get_account_kind(account_id)?;
        let entries = self.repository.load_entries(account_id, None)?;
        Ledger::from_entries(account_id, kind, entries)
    }

    async fn persist(&self, changes: EntryChangeSet) -> Result<Vec<EntryId>> {
        if changes.is_empty() {
            return Ok(Vec::new());
        }
        let entry_ids = changes.upserts.iter().map(Entry::entry_id).collect();
        self.repository.apply_changes(changes).await?;
        Ok(entry_ids)
    }
}

#[async_trait]
impl ReconciliationServiceTrait for ReconciliationService {
    async fn reconcile(
        &self,
        account_id: &str,
        candidates: Vec<ImportCandidate>,
    ) -> Result<ReconciliationReport> {
        let _guard = self.account_locks.lock(account_id).await;

        let mut ledger = self.load_ledger(account_id)?;
        let mut report = self.engine.reconcile(&mut ledger, candidates);
        let changed = self.persist(std::mem::take(&mut report.changes)).await?;

        let mut events = Vec::new();
        if !changed.is_empty() {
            events.push(DomainEvent::entries_changed(account_id, changed));
        }
        events.push(DomainEvent::import_reconciled(
            account_id,
            report.imported.len(),
            report.conflicts.len(),
        ));
        self.event_sink.emit_batch(events);
        Ok(report)
    }

    async fn apply_resolutions(
        &self,
        account_id: &str,
        resolutions: Vec<ResolvedConflict>,
    ) -> Result<ApplyResolutionsResult> {
        let _guard = self.account_locks.lock(account_id).await;

        let mut ledger = self.load_ledger(account_id)?;
        let mut result = self.engine.apply_resolutions(&mut ledger, resolutions);
        let changed = self.persist(std::mem::take(&mut result.changes)).await?;
        debug!(
            "Persisted {} entries after resolving conflicts in account {}",
            changed.len(),
            account_id
        );

        if !changed.is_empty() {
            self.event_sink
                .emit(DomainEvent::entries_changed(account_id, changed));
        }
        Ok(result)
    }
}
