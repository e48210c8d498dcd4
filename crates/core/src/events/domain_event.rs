//! Domain event types.

use serde::{Deserialize, Serialize};

use crate::entries::EntryId;

/// Domain events emitted by core services after successful mutations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DomainEvent {
    /// Entries were inserted, edited, or had their running balance recalculated.
    EntriesChanged {
        account_id: String,
        entry_ids: Vec<EntryId>,
    },

    /// Entries were deleted.
    EntriesRemoved {
        account_id: String,
        entry_ids: Vec<EntryId>,
    },

    /// A batch of import candidates was reconciled against a ledger.
    ImportReconciled {
        account_id: String,
        imported: usize,
        conflicts: usize,
    },
}

impl DomainEvent {
    pub fn entries_changed(account_id: impl Into<String>, entry_ids: Vec<EntryId>) -> Self {
        Self::EntriesChanged {
            account_id: account_id.into(),
            entry_ids,
        }
    }

    pub fn entries_removed(account_id: impl Into<String>, entry_ids: Vec<EntryId>) -> Self {
        Self::EntriesRemoved {
            account_id: account_id.into(),
            entry_ids,
        }
    }

    pub fn import_reconciled(
        account_id: impl Into<String>,
        imported: usize,
        conflicts: usize,
    ) -> Self {
        Self::ImportReconciled {
            account_id: account_id.into(),
            imported,
            conflicts,
        }
    }

    pub fn account_id(&self) -> &str {
        match self {
            Self::EntriesChanged { account_id, .. }
            | Self::EntriesRemoved { account_id, .. }
            | Self::ImportReconciled { account_id, .. } => account_id,
        }
    }
}
