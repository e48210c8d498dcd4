use chrono::NaiveDate;
use log::debug;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};

use super::bonds_errors::AccrualError;
use super::bonds_model::{BondDetails, CapitalizationMethod};
use crate::accounts::AccountKind;
use crate::constants::{ANNUAL_CAPITALIZATION_PERIOD_DAYS, DAYS_IN_YEAR, DECIMAL_PRECISION};
use crate::entries::Entry;
use crate::errors::Result;
use crate::ledger::Ledger;
use crate::utils::time_utils::{days_between, get_days_between};

/// Projected value of a bond account per calendar day.
pub type DailyValueSeries = BTreeMap<NaiveDate, Decimal>;

/// Simulates day-by-day interest accrual of a bond ledger.
///
/// The acting anchor is the entry in force on `start_date` (or the oldest
/// entry when `start_date` precedes all of them). From each anchor the
/// simulation runs day by day:
///
/// * `daily_change = capital * rate / 365` with the active method's rate,
/// * `current += daily_change`,
/// * every 365 elapsed days `capital = current` (annual capitalization).
///
/// Every later entry up to `end_date` closes the current segment and
/// re-anchors the simulation at its own posting date and value. Days before
/// the first anchor carry no value and are left out of the result.
///
/// # Arguments
///
/// * `start_date` / `end_date` - inclusive range of the returned series.
/// * `ledger` - a BOND ledger; it is only read.
/// * `bond_details` - schedules referenced by the ledger's entries.
pub fn compute_daily_value(
    start_date: NaiveDate,
    end_date: NaiveDate,
    ledger: &Ledger,
    bond_details: &[BondDetails],
) -> Result<DailyValueSeries> {
    if start_date > end_date {
        return Err(AccrualError::InvalidRange {
            start: start_date,
            end: end_date,
        }
        .into());
    }
    if ledger.kind() != AccountKind::Bond {
        return Err(AccrualError::NotBondLedger(ledger.kind()).into());
    }

    let first_anchor = ledger
        .anchor_at(start_date)
        .or_else(|| ledger.get_oldest())
        .ok_or_else(|| AccrualError::EmptyLedger(ledger.account_id().to_string()))?;

    let anchors: Vec<&Entry> = ledger
        .iter()
        .rev()
        .skip_while(|entry| entry.entry_id() != first_anchor.entry_id())
        .take_while(|entry| entry.posting_date() <= end_date)
        .collect();

    let details_by_id: HashMap<&str, &BondDetails> = bond_details
        .iter()
        .map(|details| (details.id.as_str(), details))
        .collect();

    let mut series = DailyValueSeries::new();
    for (index, anchor) in anchors.iter().enumerate() {
        let segment_end = match anchors.get(index + 1) {
            Some(next) => match next.posting_date().pred_opt() {
                Some(day_before) => day_before,
                None => continue,
            },
            None => end_date,
        };
        if segment_end < anchor.posting_date() {
            // A younger entry on the same day takes over.
            continue;
        }

        let details = resolve_details(anchor, &details_by_id)?;
        accrue_segment(anchor, details, segment_end, start_date, &mut series)?;
    }

    debug!(
        "Projected {} daily values for account {} over {} segment(s)",
        series.len(),
        ledger.account_id(),
        anchors.len()
    );
    Ok(series)
}

fn resolve_details<'a>(
    anchor: &Entry,
    details_by_id: &HashMap<&str, &'a BondDetails>,
) -> Result<&'a BondDetails> {
    let bond_details_id = anchor.details().bond_details_id().unwrap_or_default();
    let details = details_by_id
        .get(bond_details_id)
        .copied()
        .ok_or_else(|| AccrualError::MissingBondDetails(bond_details_id.to_string()))?;

    match details.capitalization {
        CapitalizationMethod::Annual => Ok(details),
        other => Err(AccrualError::NotImplemented(other).into()),
    }
}

/// Accrues from `anchor` through `segment_end`, recording days on or after `record_from`.
fn accrue_segment(
    anchor: &Entry,
    details: &BondDetails,
    segment_end: NaiveDate,
    record_from: NaiveDate,
    series: &mut DailyValueSeries,
) -> Result<()> {
    let anchor_date = anchor.posting_date();
    let day_count = Decimal::from(DAYS_IN_YEAR);

    let mut capital = anchor.value();
    let mut current = capital;
    if anchor_date >= record_from {
        series.insert(anchor_date, current.round_dp(DECIMAL_PRECISION));
    }

    let Some(first_day) = anchor_date.succ_opt() else {
        return Ok(());
    };
    for day in get_days_between(first_day, segment_end) {
        let elapsed = days_between(anchor_date, day);
        let method = details.active_method(elapsed).ok_or_else(|| {
            AccrualError::UnresolvedCalculationMethod {
                bond_details_id: details.id.clone(),
                date: day,
                elapsed_days: elapsed,
            }
        })?;

        let daily_change = capital
            .checked_mul(method.rate)
            .and_then(|interest| interest.checked_div(day_count))
            .ok_or(AccrualError::Overflow(day))?;
        current = current
            .checked_add(daily_change)
            .ok_or(AccrualError::Overflow(day))?;

        if elapsed % ANNUAL_CAPITALIZATION_PERIOD_DAYS == 0 {
            capital = current;
        }
        if day >= record_from {
            series.insert(day, current.round_dp(DECIMAL_PRECISION));
        }
    }
    Ok(())
}
