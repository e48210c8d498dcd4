use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::accrual_calculator::DailyValueSeries;
use super::bonds_model::BondDetails;
use crate::errors::Result;

/// Source of bond schedules referenced by BOND entries.
pub trait BondDetailsRepositoryTrait: Send + Sync {
    /// Fetches the details for `ids`. Unknown ids are skipped, not reported.
    fn get_bond_details(&self, ids: &[String]) -> Result<Vec<BondDetails>>;
}

#[async_trait]
pub trait AccrualServiceTrait: Send + Sync {
    /// Daily projected value of a bond account over `[start_date, end_date]`.
    async fn compute_daily_value(
        &self,
        account_id: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<DailyValueSeries>;

    /// Projected value on a single day, `None` before the first entry.
    async fn value_on(&self, account_id: &str, date: NaiveDate) -> Result<Option<Decimal>>;
}
