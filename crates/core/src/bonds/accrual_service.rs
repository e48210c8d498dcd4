use async_trait::async_trait;
use chrono::NaiveDate;
use log::debug;
use rust_decimal::Decimal;
use std::collections::BTreeSet;
use std::sync::Arc;

use super::accrual_calculator::{compute_daily_value, DailyValueSeries};
use super::bonds_errors::AccrualError;
use super::bonds_traits::{AccrualServiceTrait, BondDetailsRepositoryTrait};
use crate::errors::{Error, Result};
use crate::ledger::{EntryRepositoryTrait, Ledger};

/// Projects bond account values from stored entries and bond schedules.
pub struct AccrualService {
    entry_repository: Arc<dyn EntryRepositoryTrait>,
    bond_details_repository: Arc<dyn BondDetailsRepositoryTrait>,
}

impl AccrualService {
    pub fn new(
        entry_repository: Arc<dyn EntryRepositoryTrait>,
        bond_details_repository: Arc<dyn BondDetailsRepositoryTrait>,
    ) -> Self {
        Self {
            entry_repository,
            bond_details_repository,
        }
    }

    fn load_ledger(&self, account_id: &str, end_date: NaiveDate) -> Result<Ledger> {
        let kind = self.entry_repository.get_account_kind(account_id)?;
        // Entries after the range never influence it.
        let entries = self
            .entry_repository
            .load_entries(account_id, Some((NaiveDate::MIN, end_date)))?;
        Ledger::from_entries(account_id, kind, entries)
    }
}

#[async_trait]
impl AccrualServiceTrait for AccrualService {
    async fn compute_daily_value(
        &self,
        account_id: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<DailyValueSeries> {
        let ledger = self.load_ledger(account_id, end_date)?;

        let bond_ids: Vec<String> = ledger
            .iter()
            .filter_map(|entry| entry.details().bond_details_id())
            .map(str::to_string)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let bond_details = self.bond_details_repository.get_bond_details(&bond_ids)?;
        debug!(
            "Computing accrual for account {} with {} bond schedule(s)",
            account_id,
            bond_details.len()
        );

        compute_daily_value(start_date, end_date, &ledger, &bond_details)
    }

    async fn value_on(&self, account_id: &str, date: NaiveDate) -> Result<Option<Decimal>> {
        match self.compute_daily_value(account_id, date, date).await {
            Ok(series) => Ok(series.get(&date).copied()),
            Err(Error::Accrual(AccrualError::EmptyLedger(_))) => Ok(None),
            Err(e) => Err(e),
        }
    }
}
