//! Entry domain models.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::accounts::AccountKind;
use crate::errors::{Error, Result, ValidationError};

/// Identifier of an entry within its account.
pub type EntryId = u64;

/// Free-text metadata of a bank/cash transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrencyDetails {
    pub description: Option<String>,
    pub contractor: Option<String>,
}

/// Instrument held by a stock entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockDetails {
    pub ticker: String,
    /// Instrument type tag, e.g. "EQUITY" or "ETF"
    pub instrument_type: String,
}

/// Reference to the bond-details record driving capitalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BondHolding {
    pub bond_details_id: String,
}

/// Kind-specific part of an entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntryDetails {
    Currency(CurrencyDetails),
    Stock(StockDetails),
    Bond(BondHolding),
}

impl EntryDetails {
    pub fn currency(description: Option<&str>, contractor: Option<&str>) -> Self {
        EntryDetails::Currency(CurrencyDetails {
            description: description.map(str::to_string),
            contractor: contractor.map(str::to_string),
        })
    }

    pub fn stock(ticker: &str, instrument_type: &str) -> Self {
        EntryDetails::Stock(StockDetails {
            ticker: ticker.to_string(),
            instrument_type: instrument_type.to_string(),
        })
    }

    pub fn bond(bond_details_id: &str) -> Self {
        EntryDetails::Bond(BondHolding {
            bond_details_id: bond_details_id.to_string(),
        })
    }

    pub fn kind(&self) -> AccountKind {
        match self {
            EntryDetails::Currency(_) => AccountKind::Currency,
            EntryDetails::Stock(_) => AccountKind::Stock,
            EntryDetails::Bond(_) => AccountKind::Bond,
        }
    }

    /// Ticker of a stock entry; `None` for every other kind.
    pub fn ticker(&self) -> Option<&str> {
        match self {
            EntryDetails::Stock(stock) => Some(stock.ticker.as_str()),
            EntryDetails::Currency(_) | EntryDetails::Bond(_) => None,
        }
    }

    pub fn bond_details_id(&self) -> Option<&str> {
        match self {
            EntryDetails::Bond(bond) => Some(bond.bond_details_id.as_str()),
            EntryDetails::Currency(_) | EntryDetails::Stock(_) => None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            EntryDetails::Currency(_) => Ok(()),
            EntryDetails::Stock(stock) => {
                if stock.ticker.trim().is_empty() {
                    return Err(Error::Validation(ValidationError::MissingField(
                        "ticker".to_string(),
                    )));
                }
                Ok(())
            }
            EntryDetails::Bond(bond) => {
                if bond.bond_details_id.trim().is_empty() {
                    return Err(Error::Validation(ValidationError::MissingField(
                        "bondDetailsId".to_string(),
                    )));
                }
                Ok(())
            }
        }
    }
}

/// One posted transaction on one account.
///
/// `account_id` and `entry_id` never change once assigned. `value` and
/// `sequence` are derived by the owning ledger and only the ledger writes them.
/// `sequence` orders entries sharing a posting date: the higher one is younger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    account_id: String,
    entry_id: EntryId,
    posting_date: NaiveDate,
    value: Decimal,
    value_change: Decimal,
    #[serde(default)]
    sequence: u64,
    #[serde(default)]
    labels: BTreeSet<String>,
    details: EntryDetails,
}

impl Entry {
    /// Rehydrates an entry, e.g. from a repository row.
    pub fn new(
        account_id: impl Into<String>,
        entry_id: EntryId,
        posting_date: NaiveDate,
        value: Decimal,
        value_change: Decimal,
        details: EntryDetails,
    ) -> Self {
        Self {
            account_id: account_id.into(),
            entry_id,
            posting_date,
            value,
            value_change,
            sequence: 0,
            labels: BTreeSet::new(),
            details,
        }
    }

    /// Sets the stored same-date tie-break, e.g. from a repository row.
    pub fn with_sequence(mut self, sequence: u64) -> Self {
        self.sequence = sequence;
        self
    }

    pub fn with_labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.labels = labels.into_iter().map(Into::into).collect();
        self
    }

    pub fn account_id(&self) -> &str {
        &self.account_id
    }

    pub fn entry_id(&self) -> EntryId {
        self.entry_id
    }

    pub fn posting_date(&self) -> NaiveDate {
        self.posting_date
    }

    pub fn value(&self) -> Decimal {
        self.value
    }

    pub fn value_change(&self) -> Decimal {
        self.value_change
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn labels(&self) -> &BTreeSet<String> {
        &self.labels
    }

    pub fn details(&self) -> &EntryDetails {
        &self.details
    }

    pub fn kind(&self) -> AccountKind {
        self.details.kind()
    }

    pub(crate) fn set_value(&mut self, value: Decimal) {
        self.value = value;
    }

    pub(crate) fn set_posting_date(&mut self, posting_date: NaiveDate) {
        self.posting_date = posting_date;
    }

    pub(crate) fn set_sequence(&mut self, sequence: u64) {
        self.sequence = sequence;
    }

    pub(crate) fn set_value_change(&mut self, value_change: Decimal) {
        self.value_change = value_change;
    }

    pub(crate) fn set_labels(&mut self, labels: BTreeSet<String>) {
        self.labels = labels;
    }

    pub(crate) fn set_details(&mut self, details: EntryDetails) {
        self.details = details;
    }
}

/// Input model for inserting a new entry into a ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEntry {
    pub account_id: String,
    pub posting_date: NaiveDate,
    pub value_change: Decimal,
    /// Balance after this entry, only honored when it becomes the oldest one.
    /// Without it the ledger's current opening balance is kept.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Decimal>,
    #[serde(default)]
    pub labels: BTreeSet<String>,
    pub details: EntryDetails,
}

impl NewEntry {
    pub fn new(
        account_id: impl Into<String>,
        posting_date: NaiveDate,
        value_change: Decimal,
        details: EntryDetails,
    ) -> Self {
        Self {
            account_id: account_id.into(),
            posting_date,
            value_change,
            value: None,
            labels: BTreeSet::new(),
            details,
        }
    }

    pub fn with_value(mut self, value: Decimal) -> Self {
        self.value = Some(value);
        self
    }

    pub fn with_labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.labels = labels.into_iter().map(Into::into).collect();
        self
    }

    /// Validates the new entry data.
    pub fn validate(&self) -> Result<()> {
        if self.account_id.trim().is_empty() {
            return Err(Error::Validation(ValidationError::InvalidInput(
                "Account ID cannot be empty".to_string(),
            )));
        }
        self.details.validate()
    }
}

/// Input model for editing an existing entry.
///
/// `entry_id` and `account_id` are carried only so that an attempt to change
/// them can be rejected; they are never applied.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry_id: Option<EntryId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    pub posting_date: NaiveDate,
    pub value_change: Decimal,
    /// Replaces the label set when present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<BTreeSet<String>>,
    /// Replaces the kind-specific metadata when present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<EntryDetails>,
}

impl EntryUpdate {
    pub fn new(posting_date: NaiveDate, value_change: Decimal) -> Self {
        Self {
            entry_id: None,
            account_id: None,
            posting_date,
            value_change,
            labels: None,
            details: None,
        }
    }

    /// Builds an update that keeps every field of `entry` as it is.
    pub fn from_entry(entry: &Entry) -> Self {
        Self {
            entry_id: Some(entry.entry_id()),
            account_id: Some(entry.account_id().to_string()),
            posting_date: entry.posting_date(),
            value_change: entry.value_change(),
            labels: Some(entry.labels().clone()),
            details: Some(entry.details().clone()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(details) = &self.details {
            details.validate()?;
        }
        Ok(())
    }
}
