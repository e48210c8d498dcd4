use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::accounts::AccountKind;
use crate::entries::EntryId;

/// Errors raised by ledger mutations and consistency checks.
///
/// A ledger operation that returns one of these has not changed the ledger.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Entry {entry_id} cannot change its {field}")]
    IdentityViolation { entry_id: EntryId, field: String },

    #[error(
        "An entry dated {posting_date} with change {value_change} already exists (entry {existing_id})"
    )]
    DuplicateEntry {
        posting_date: NaiveDate,
        value_change: Decimal,
        existing_id: EntryId,
    },

    #[error("Entry {0} not found")]
    EntryNotFound(EntryId),

    #[error("Entry id {0} appears more than once")]
    DuplicateEntryId(EntryId),

    #[error("Entry belongs to account '{found}' but the ledger tracks '{expected}'")]
    AccountMismatch { expected: String, found: String },

    #[error("{found} entry cannot be stored in a {expected} ledger")]
    KindMismatch {
        expected: AccountKind,
        found: AccountKind,
    },

    #[error("Entry {entry_id} holds value {actual}, expected {expected}")]
    BalanceMismatch {
        entry_id: EntryId,
        expected: Decimal,
        actual: Decimal,
    },

    #[error("Balance overflow while recalculating entry {0}")]
    Overflow(EntryId),

    #[error("Entry id space exhausted")]
    IdExhausted,
}

impl LedgerError {
    pub fn is_duplicate(&self) -> bool {
        matches!(self, LedgerError::DuplicateEntry { .. })
    }
}
