//! Reconciliation domain models.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use super::reconciliation_errors::ReconciliationError;
use crate::constants::DEFAULT_DATE_TOLERANCE_DAYS;
use crate::entries::{Entry, EntryDetails, EntryId, NewEntry};
use crate::errors::Result;
use crate::ledger::EntryChangeSet;

/// An externally sourced posting, already parsed and type-coerced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportCandidate {
    pub posting_date: NaiveDate,
    pub value_change: Decimal,
    pub details: EntryDetails,
    #[serde(default)]
    pub labels: BTreeSet<String>,
}

impl ImportCandidate {
    pub fn new(posting_date: NaiveDate, value_change: Decimal, details: EntryDetails) -> Self {
        Self {
            posting_date,
            value_change,
            details,
            labels: BTreeSet::new(),
        }
    }

    /// A bank statement line with optional description and contractor.
    pub fn currency(
        posting_date: NaiveDate,
        value_change: Decimal,
        description: Option<&str>,
        contractor: Option<&str>,
    ) -> Self {
        Self::new(
            posting_date,
            value_change,
            EntryDetails::currency(description, contractor),
        )
    }

    pub fn with_labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.labels = labels.into_iter().map(Into::into).collect();
        self
    }

    pub fn to_new_entry(&self, account_id: &str) -> NewEntry {
        NewEntry::new(
            account_id,
            self.posting_date,
            self.value_change,
            self.details.clone(),
        )
        .with_labels(self.labels.iter().cloned())
    }
}

/// How an import candidate collides with an existing entry, strongest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConflictKind {
    /// Same posting date and amount (and ticker, for stocks)
    ExactDuplicate,
    /// Same posting date, different amount
    SameDayAmountMismatch,
    /// Same amount within the date tolerance
    NearbyDateSameAmount,
}

impl fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConflictKind::ExactDuplicate => "EXACT_DUPLICATE",
            ConflictKind::SameDayAmountMismatch => "SAME_DAY_AMOUNT_MISMATCH",
            ConflictKind::NearbyDateSameAmount => "NEARBY_DATE_SAME_AMOUNT",
        };
        f.write_str(name)
    }
}

/// A candidate that was not imported because it collides with an existing entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportConflict {
    pub account_id: String,
    pub candidate: Option<ImportCandidate>,
    pub existing: Option<Entry>,
    pub reason: String,
    pub kind: ConflictKind,
    pub is_exact_match: bool,
}

impl ImportConflict {
    pub fn new(
        account_id: impl Into<String>,
        candidate: ImportCandidate,
        existing: Entry,
        kind: ConflictKind,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            account_id: account_id.into(),
            candidate: Some(candidate),
            existing: Some(existing),
            reason: reason.into(),
            kind,
            is_exact_match: kind == ConflictKind::ExactDuplicate,
        }
    }

    /// Resolves the conflict by importing the candidate anyway.
    pub fn accept_import(&self) -> Result<ResolvedConflict> {
        ResolvedConflict::new(
            &self.account_id,
            true,
            self.candidate.clone(),
            false,
            None,
        )
    }

    /// Resolves the conflict by keeping the existing entry and dropping the candidate.
    pub fn keep_existing(&self) -> Result<ResolvedConflict> {
        ResolvedConflict::new(
            &self.account_id,
            false,
            None,
            true,
            self.existing.as_ref().map(Entry::entry_id),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Resolution {
    AddImported(ImportCandidate),
    LeaveExisting(Option<EntryId>),
}

/// A human decision on one conflict: import the candidate, or keep what exists.
///
/// Exactly one side is chosen; this is checked when the value is built or
/// deserialized, so an applied resolution is always well formed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ResolvedConflictDto", into = "ResolvedConflictDto")]
pub struct ResolvedConflict {
    account_id: String,
    resolution: Resolution,
}

impl ResolvedConflict {
    pub fn new(
        account_id: &str,
        add_imported: bool,
        import_data: Option<ImportCandidate>,
        leave_existing: bool,
        existing_id: Option<EntryId>,
    ) -> Result<Self> {
        let resolution = match (add_imported, leave_existing) {
            (true, true) => {
                return Err(ReconciliationError::InvalidResolution(
                    "cannot both add the imported entry and leave the existing one".to_string(),
                )
                .into())
            }
            (false, false) => {
                return Err(ReconciliationError::InvalidResolution(
                    "either add the imported entry or leave the existing one".to_string(),
                )
                .into())
            }
            (true, false) => match import_data {
                Some(candidate) => Resolution::AddImported(candidate),
                None => {
                    return Err(ReconciliationError::InvalidResolution(
                        "adding the imported entry requires import data".to_string(),
                    )
                    .into())
                }
            },
            (false, true) => Resolution::LeaveExisting(existing_id),
        };

        Ok(Self {
            account_id: account_id.to_string(),
            resolution,
        })
    }

    pub fn account_id(&self) -> &str {
        &self.account_id
    }

    pub fn adds_imported(&self) -> bool {
        matches!(self.resolution, Resolution::AddImported(_))
    }

    pub fn leaves_existing(&self) -> bool {
        matches!(self.resolution, Resolution::LeaveExisting(_))
    }

    pub fn import_data(&self) -> Option<&ImportCandidate> {
        match &self.resolution {
            Resolution::AddImported(candidate) => Some(candidate),
            Resolution::LeaveExisting(_) => None,
        }
    }

    pub fn existing_id(&self) -> Option<EntryId> {
        match self.resolution {
            Resolution::LeaveExisting(existing_id) => existing_id,
            Resolution::AddImported(_) => None,
        }
    }
}

/// Wire form of [`ResolvedConflict`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResolvedConflictDto {
    account_id: String,
    add_imported: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    import_data: Option<ImportCandidate>,
    leave_existing: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    existing_id: Option<EntryId>,
}

impl TryFrom<ResolvedConflictDto> for ResolvedConflict {
    type Error = crate::errors::Error;

    fn try_from(dto: ResolvedConflictDto) -> Result<Self> {
        ResolvedConflict::new(
            &dto.account_id,
            dto.add_imported,
            dto.import_data,
            dto.leave_existing,
            dto.existing_id,
        )
    }
}

impl From<ResolvedConflict> for ResolvedConflictDto {
    fn from(resolved: ResolvedConflict) -> Self {
        let (add_imported, import_data, leave_existing, existing_id) = match resolved.resolution {
            Resolution::AddImported(candidate) => (true, Some(candidate), false, None),
            Resolution::LeaveExisting(existing_id) => (false, None, true, existing_id),
        };
        Self {
            account_id: resolved.account_id,
            add_imported,
            import_data,
            leave_existing,
            existing_id,
        }
    }
}

/// Matching policy for fuzzy conflicts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ReconciliationConfig {
    /// Equal amounts at most this many days apart are flagged; 0 disables the check
    pub date_tolerance_days: u32,
    /// Flag a candidate posted on the same day as an entry with a different amount
    pub flag_same_day_amount_mismatch: bool,
}

impl Default for ReconciliationConfig {
    fn default() -> Self {
        Self {
            date_tolerance_days: DEFAULT_DATE_TOLERANCE_DAYS,
            flag_same_day_amount_mismatch: true,
        }
    }
}

/// A candidate the ledger refused, with the reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportFailure {
    pub candidate: ImportCandidate,
    pub message: String,
}

/// Outcome of reconciling one batch of candidates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationReport {
    pub account_id: String,
    /// Auto-imported entries with their final balances
    pub imported: Vec<Entry>,
    pub conflicts: Vec<ImportConflict>,
    pub failures: Vec<ImportFailure>,
    /// Everything the batch changed in the ledger, for persistence
    #[serde(skip)]
    pub changes: EntryChangeSet,
}

impl ReconciliationReport {
    pub fn exact_matches(&self) -> usize {
        self.conflicts
            .iter()
            .filter(|conflict| conflict.is_exact_match)
            .count()
    }
}

/// A resolution that could not be applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionError {
    /// Position of the resolution in the submitted list
    pub index: usize,
    pub message: String,
}

/// Outcome of applying a list of resolutions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyResolutionsResult {
    /// Imported entries with their final balances
    pub applied: Vec<Entry>,
    /// Resolutions that kept the existing entry
    pub skipped: usize,
    pub errors: Vec<ResolutionError>,
    #[serde(skip)]
    pub changes: EntryChangeSet,
}
