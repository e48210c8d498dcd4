//! Candidate classification and resolution application.
//!
//! The engine works on an in-memory [`Ledger`] and changes it only through
//! the ledger's insert path, so every balance stays consistent. Candidates
//! are processed one at a time: an entry auto-imported earlier in a batch is
//! matched against later candidates like any stored entry.

use chrono::{Days, NaiveDate};
use log::{debug, info, warn};
use rust_decimal::Decimal;

use super::fingerprint::{compute_fingerprint, normalize_ticker, FingerprintIndex};
use super::reconciliation_errors::ReconciliationError;
use super::reconciliation_model::{
    ApplyResolutionsResult, ConflictKind, ImportCandidate, ImportConflict, ImportFailure,
    ReconciliationConfig, ReconciliationReport, ResolutionError, ResolvedConflict,
};
use crate::entries::{Entry, EntryId};
use crate::errors::Result;
use crate::ledger::{DuplicatePolicy, EntryChangeSet, Ledger, LedgerMutation};
use crate::utils::time_utils::days_between;

/// The fields two postings are compared on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostingSignature<'a> {
    pub posting_date: NaiveDate,
    pub value_change: Decimal,
    pub ticker: Option<&'a str>,
}

impl<'a> From<&'a Entry> for PostingSignature<'a> {
    fn from(entry: &'a Entry) -> Self {
        Self {
            posting_date: entry.posting_date(),
            value_change: entry.value_change(),
            ticker: entry.details().ticker(),
        }
    }
}

impl<'a> From<&'a ImportCandidate> for PostingSignature<'a> {
    fn from(candidate: &'a ImportCandidate) -> Self {
        Self {
            posting_date: candidate.posting_date,
            value_change: candidate.value_change,
            ticker: candidate.details.ticker(),
        }
    }
}

/// Classifies how two postings collide, if at all.
///
/// The result does not depend on argument order. Postings of different stock
/// tickers never collide.
pub fn match_kind(
    config: &ReconciliationConfig,
    a: &PostingSignature<'_>,
    b: &PostingSignature<'_>,
) -> Option<ConflictKind> {
    if !same_ticker(a.ticker, b.ticker) {
        return None;
    }

    let distance = days_between(a.posting_date, b.posting_date).abs();
    let same_amount = a.value_change == b.value_change;
    match (distance, same_amount) {
        (0, true) => Some(ConflictKind::ExactDuplicate),
        (0, false) if config.flag_same_day_amount_mismatch => {
            Some(ConflictKind::SameDayAmountMismatch)
        }
        (d, true) if d <= i64::from(config.date_tolerance_days) => {
            Some(ConflictKind::NearbyDateSameAmount)
        }
        _ => None,
    }
}

fn same_ticker(a: Option<&str>, b: Option<&str>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => normalize_ticker(a) == normalize_ticker(b),
        (None, None) => true,
        _ => false,
    }
}

/// The strongest collision of a candidate with the ledger.
struct Collision<'a> {
    kind: ConflictKind,
    existing: &'a Entry,
}

#[derive(Debug, Clone, Default)]
pub struct ReconciliationEngine {
    config: ReconciliationConfig,
}

impl ReconciliationEngine {
    pub fn new(config: ReconciliationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ReconciliationConfig {
        &self.config
    }

    /// Classifies every candidate against `ledger` and imports the ones that
    /// collide with nothing.
    ///
    /// Conflicts are reported, never applied. A candidate the ledger refuses
    /// (wrong kind, invalid details, balance overflow) ends up in
    /// `failures` and does not stop the batch.
    pub fn reconcile(
        &self,
        ledger: &mut Ledger,
        candidates: Vec<ImportCandidate>,
    ) -> ReconciliationReport {
        let account_id = ledger.account_id().to_string();
        let mut index = FingerprintIndex::build(ledger.iter());
        let mut imported_ids: Vec<EntryId> = Vec::new();
        let mut conflicts = Vec::new();
        let mut failures = Vec::new();
        let mut changes = EntryChangeSet::new(&account_id);

        debug!(
            "Reconciling {} candidates against {} entries of account {}",
            candidates.len(),
            ledger.len(),
            account_id
        );

        for candidate in candidates {
            if let Some(collision) = self.find_collision(ledger, &index, &candidate) {
                let reason = describe(&candidate, collision.existing, collision.kind);
                debug!("Conflict in account {}: {}", account_id, reason);
                conflicts.push(ImportConflict::new(
                    &account_id,
                    candidate,
                    collision.existing.clone(),
                    collision.kind,
                    reason,
                ));
                continue;
            }

            // Entries of another ticker may share the date and amount.
            match ledger.insert_with(
                candidate.to_new_entry(&account_id),
                DuplicatePolicy::Allow,
            ) {
                Ok(mutation) => {
                    index.add(&mutation.entry);
                    imported_ids.push(mutation.entry.entry_id());
                    changes.record_saved(&mutation);
                }
                Err(err) => {
                    warn!(
                        "Import candidate dated {} rejected for account {}: {}",
                        candidate.posting_date, account_id, err
                    );
                    failures.push(ImportFailure {
                        candidate,
                        message: err.to_string(),
                    });
                }
            }
        }

        let imported: Vec<Entry> = imported_ids
            .iter()
            .filter_map(|entry_id| ledger.get(*entry_id).cloned())
            .collect();
        info!(
            "Reconciled account {}: {} imported, {} conflicts, {} failures",
            account_id,
            imported.len(),
            conflicts.len(),
            failures.len()
        );

        ReconciliationReport {
            account_id,
            imported,
            conflicts,
            failures,
            changes,
        }
    }

    /// Applies resolutions one by one.
    ///
    /// The imported side is inserted even when it duplicates an entry.
    /// Leaving the existing side changes nothing. A failing resolution is
    /// recorded in `errors`; the others still take effect.
    pub fn apply_resolutions(
        &self,
        ledger: &mut Ledger,
        resolutions: Vec<ResolvedConflict>,
    ) -> ApplyResolutionsResult {
        let account_id = ledger.account_id().to_string();
        let mut applied_ids: Vec<EntryId> = Vec::new();
        let mut result = ApplyResolutionsResult {
            changes: EntryChangeSet::new(&account_id),
            ..Default::default()
        };

        for (index, resolution) in resolutions.into_iter().enumerate() {
            match apply_resolution(ledger, &resolution) {
                Ok(Some(mutation)) => {
                    applied_ids.push(mutation.entry.entry_id());
                    result.changes.record_saved(&mutation);
                }
                Ok(None) => result.skipped += 1,
                Err(err) => {
                    warn!(
                        "Resolution {} for account {} failed: {}",
                        index, account_id, err
                    );
                    result.errors.push(ResolutionError {
                        index,
                        message: err.to_string(),
                    });
                }
            }
        }

        result.applied = applied_ids
            .iter()
            .filter_map(|entry_id| ledger.get(*entry_id).cloned())
            .collect();
        info!(
            "Applied resolutions for account {}: {} imported, {} kept, {} failed",
            account_id,
            result.applied.len(),
            result.skipped,
            result.errors.len()
        );
        result
    }

    fn find_collision<'l>(
        &self,
        ledger: &'l Ledger,
        index: &FingerprintIndex,
        candidate: &ImportCandidate,
    ) -> Option<Collision<'l>> {
        let fingerprint = compute_fingerprint(
            ledger.account_id(),
            candidate.posting_date,
            candidate.value_change,
            candidate.details.ticker(),
        );
        if let Some(existing) = index
            .get(&fingerprint)
            .iter()
            .find_map(|entry_id| ledger.get(*entry_id))
        {
            return Some(Collision {
                kind: ConflictKind::ExactDuplicate,
                existing,
            });
        }

        let signature = PostingSignature::from(candidate);
        let tolerance = Days::new(u64::from(self.config.date_tolerance_days));
        let window_start = candidate
            .posting_date
            .checked_sub_days(tolerance)
            .unwrap_or(NaiveDate::MIN);
        let window_end = candidate
            .posting_date
            .checked_add_days(tolerance)
            .unwrap_or(NaiveDate::MAX);

        ledger
            .entries_between(window_start, window_end)
            .into_iter()
            .filter_map(|existing| {
                match_kind(&self.config, &signature, &PostingSignature::from(existing))
                    .map(|kind| Collision { kind, existing })
            })
            .min_by_key(|collision| {
                (
                    collision.kind,
                    days_between(candidate.posting_date, collision.existing.posting_date()).abs(),
                    collision.existing.entry_id(),
                )
            })
    }
}

/// Applies one resolution; `None` when the existing entry is kept.
fn apply_resolution(
    ledger: &mut Ledger,
    resolution: &ResolvedConflict,
) -> Result<Option<LedgerMutation>> {
    if resolution.account_id() != ledger.account_id() {
        return Err(ReconciliationError::AccountMismatch {
            expected: ledger.account_id().to_string(),
            found: resolution.account_id().to_string(),
        }
        .into());
    }

    match resolution.import_data() {
        Some(candidate) => {
            let new_entry = candidate.to_new_entry(ledger.account_id());
            ledger.force_insert(new_entry).map(Some)
        }
        None => Ok(None),
    }
}

fn describe(candidate: &ImportCandidate, existing: &Entry, kind: ConflictKind) -> String {
    match kind {
        ConflictKind::ExactDuplicate => format!(
            "Entry {} already records a change of {} on {}",
            existing.entry_id(),
            existing.value_change(),
            existing.posting_date()
        ),
        ConflictKind::SameDayAmountMismatch => format!(
            "Entry {} on {} records a change of {} instead of {}",
            existing.entry_id(),
            existing.posting_date(),
            existing.value_change(),
            candidate.value_change
        ),
        ConflictKind::NearbyDateSameAmount => format!(
            "Entry {} records the same change of {} on {}, {} day(s) from {}",
            existing.entry_id(),
            existing.value_change(),
            existing.posting_date(),
            days_between(candidate.posting_date, existing.posting_date()).abs(),
            candidate.posting_date
        ),
    }
}
