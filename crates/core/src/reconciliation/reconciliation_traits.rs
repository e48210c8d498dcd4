use async_trait::async_trait;

use super::reconciliation_model::{
    ApplyResolutionsResult, ImportCandidate, ReconciliationReport, ResolvedConflict,
};
use crate::errors::Result;

/// Trait defining the contract for import reconciliation over stored ledgers.
#[async_trait]
pub trait ReconciliationServiceTrait: Send + Sync {
    /// Classifies candidates against the account's ledger and persists auto-imports.
    async fn reconcile(
        &self,
        account_id: &str,
        candidates: Vec<ImportCandidate>,
    ) -> Result<ReconciliationReport>;

    /// Applies conflict resolutions and persists the imported entries.
    async fn apply_resolutions(
        &self,
        account_id: &str,
        resolutions: Vec<ResolvedConflict>,
    ) -> Result<ApplyResolutionsResult>;
}
