use chrono::NaiveDate;
use thiserror::Error;

use super::bonds_model::CapitalizationMethod;
use crate::accounts::AccountKind;

/// Errors that occur while projecting bond values.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AccrualError {
    #[error(
        "No calculation method of bond {bond_details_id} covers {date} ({elapsed_days} days after the anchor)"
    )]
    UnresolvedCalculationMethod {
        bond_details_id: String,
        date: NaiveDate,
        elapsed_days: i64,
    },

    #[error("Capitalization method {0} is not implemented")]
    NotImplemented(CapitalizationMethod),

    #[error("Bond details {0} not found")]
    MissingBondDetails(String),

    #[error("Start date {start} is after end date {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    #[error("Account {0} has no entries to anchor the calculation")]
    EmptyLedger(String),

    #[error("Accrual requires a BOND ledger, got {0}")]
    NotBondLedger(AccountKind),

    #[error("Value overflow while accruing interest on {0}")]
    Overflow(NaiveDate),
}
