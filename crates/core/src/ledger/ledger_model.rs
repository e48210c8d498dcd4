//! Ledger mutation models.

use serde::{Deserialize, Serialize};

use crate::entries::{Entry, EntryId};

/// Whether an insert may proceed when an entry with the same date and amount exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DuplicatePolicy {
    /// Report the duplicate and leave the ledger untouched
    #[default]
    Reject,
    /// Insert anyway (the caller confirmed the entry)
    Allow,
}

/// Result of a successful ledger mutation.
///
/// Holds everything a repository needs to persist: the inserted/updated entry
/// (or the removed one) and every other entry whose running balance moved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerMutation {
    pub entry: Entry,
    pub recalculated: Vec<Entry>,
}

impl LedgerMutation {
    /// Primary entry followed by every recalculated entry.
    pub fn changed_entries(&self) -> Vec<Entry> {
        let mut entries = Vec::with_capacity(self.recalculated.len() + 1);
        entries.push(self.entry.clone());
        entries.extend(self.recalculated.iter().cloned());
        entries
    }

    pub fn entry_ids(&self) -> Vec<EntryId> {
        std::iter::once(self.entry.entry_id())
            .chain(self.recalculated.iter().map(Entry::entry_id))
            .collect()
    }
}

/// Entries to write and ids to delete for one account, applied atomically by a repository.
///
/// Deletions are applied before upserts: an id freed by a removal may be
/// handed out again by a later insert in the same batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryChangeSet {
    pub account_id: String,
    pub upserts: Vec<Entry>,
    pub deletions: Vec<EntryId>,
}

impl EntryChangeSet {
    pub fn new(account_id: impl Into<String>) -> Self {
        Self {
            account_id: account_id.into(),
            ..Default::default()
        }
    }

    /// Change set persisting an insert or update.
    pub fn from_saved(account_id: impl Into<String>, mutation: &LedgerMutation) -> Self {
        let mut changes = Self::new(account_id);
        changes.record_saved(mutation);
        changes
    }

    /// Change set persisting a removal.
    pub fn from_removed(account_id: impl Into<String>, mutation: &LedgerMutation) -> Self {
        let mut changes = Self::new(account_id);
        changes.record_removed(mutation);
        changes
    }

    /// Adds an insert or update, replacing any earlier version of the same entries.
    pub fn record_saved(&mut self, mutation: &LedgerMutation) {
        for entry in mutation.changed_entries() {
            self.upsert(entry);
        }
    }

    pub fn record_removed(&mut self, mutation: &LedgerMutation) {
        let removed_id = mutation.entry.entry_id();
        self.upserts.retain(|entry| entry.entry_id() != removed_id);
        self.deletions.push(removed_id);
        for entry in &mutation.recalculated {
            self.upsert(entry.clone());
        }
    }

    pub fn is_empty(&self) -> bool {
        self.upserts.is_empty() && self.deletions.is_empty()
    }

    fn upsert(&mut self, entry: Entry) {
        match self
            .upserts
            .iter_mut()
            .find(|existing| existing.entry_id() == entry.entry_id())
        {
            Some(existing) => *existing = entry,
            None => self.upserts.push(entry),
        }
    }
}
