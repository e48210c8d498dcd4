//! Account domain models.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::{Error, Result, ValidationError};

/// Kind of account a ledger tracks.
///
/// Every entry in a ledger carries details of the same kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountKind {
    /// Bank or cash account
    Currency,
    /// Brokerage account holding tickers
    Stock,
    /// Bond account with interest capitalization
    Bond,
}

impl AccountKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountKind::Currency => "CURRENCY",
            AccountKind::Stock => "STOCK",
            AccountKind::Bond => "BOND",
        }
    }
}

impl fmt::Display for AccountKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccountKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_uppercase().as_str() {
            "CURRENCY" | "CASH" => Ok(AccountKind::Currency),
            "STOCK" | "SECURITY" => Ok(AccountKind::Stock),
            "BOND" => Ok(AccountKind::Bond),
            other => Err(Error::Validation(ValidationError::InvalidInput(format!(
                "Unknown account kind '{}'",
                other
            )))),
        }
    }
}
