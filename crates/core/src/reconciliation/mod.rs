//! Import reconciliation - merging externally sourced entries into a ledger
//! while surfacing duplicates and near-duplicates for a human decision.

mod fingerprint;
mod reconciliation_engine;
mod reconciliation_errors;
mod reconciliation_model;
mod reconciliation_service;
mod reconciliation_traits;

#[cfg(test)]
mod reconciliation_engine_tests;


pub use fingerprint::{compute_fingerprint, entry_fingerprint, FingerprintIndex};
pub use reconciliation_engine::{match_kind, PostingSignature, ReconciliationEngine};
pub use reconciliation_errors::ReconciliationError;
pub use reconciliation_model::{
    ApplyResolutionsResult, ConflictKind, ImportCandidate, ImportConflict, ImportFailure,
    ReconciliationConfig, ReconciliationReport, ResolutionError, ResolvedConflict,
};
pub use reconciliation_service::ReconciliationService;
pub use reconciliation_traits::ReconciliationServiceTrait;
