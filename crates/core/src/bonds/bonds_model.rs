//! Bond domain models.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::{Error, Result, ValidationError};

/// How often accrued interest is folded into principal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CapitalizationMethod {
    Annual,
    Quarterly,
    Monthly,
    AtMaturity,
}

impl fmt::Display for CapitalizationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CapitalizationMethod::Annual => "ANNUAL",
            CapitalizationMethod::Quarterly => "QUARTERLY",
            CapitalizationMethod::Monthly => "MONTHLY",
            CapitalizationMethod::AtMaturity => "AT_MATURITY",
        };
        f.write_str(name)
    }
}

/// Comparison between the days elapsed since the anchor and a boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DateOperator {
    #[serde(rename = "<")]
    LessThan,
    #[serde(rename = "<=")]
    LessOrEqual,
    #[serde(rename = "==")]
    Equal,
    #[serde(rename = ">=")]
    GreaterOrEqual,
    #[serde(rename = ">")]
    GreaterThan,
}

impl DateOperator {
    pub fn matches(&self, elapsed_days: i64, boundary: i64) -> bool {
        match self {
            DateOperator::LessThan => elapsed_days < boundary,
            DateOperator::LessOrEqual => elapsed_days <= boundary,
            DateOperator::Equal => elapsed_days == boundary,
            DateOperator::GreaterOrEqual => elapsed_days >= boundary,
            DateOperator::GreaterThan => elapsed_days > boundary,
        }
    }
}

/// One piece of a bond's rate schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculationMethod {
    pub date_operator: DateOperator,
    /// Boundary in days elapsed since the acting anchor entry
    pub date_value: i64,
    /// Annualized rate as a fraction (0.0365 is 3.65%)
    pub rate: Decimal,
}

impl CalculationMethod {
    pub fn new(date_operator: DateOperator, date_value: i64, rate: Decimal) -> Self {
        Self {
            date_operator,
            date_value,
            rate,
        }
    }

    pub fn is_active(&self, elapsed_days: i64) -> bool {
        self.date_operator.matches(elapsed_days, self.date_value)
    }
}

/// Capitalization schedule of a bond.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BondDetails {
    pub id: String,
    pub name: String,
    pub capitalization: CapitalizationMethod,
    /// Ordered; the first active method wins
    pub calculation_methods: Vec<CalculationMethod>,
}

impl BondDetails {
    /// The method in force `elapsed_days` after the anchor.
    pub fn active_method(&self, elapsed_days: i64) -> Option<&CalculationMethod> {
        self.calculation_methods
            .iter()
            .find(|method| method.is_active(elapsed_days))
    }

    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(Error::Validation(ValidationError::MissingField(
                "id".to_string(),
            )));
        }
        if self.calculation_methods.is_empty() {
            return Err(Error::Validation(ValidationError::InvalidInput(format!(
                "Bond {} has no calculation methods",
                self.id
            ))));
        }
        if let Some(method) = self
            .calculation_methods
            .iter()
            .find(|method| method.rate.is_sign_negative())
        {
            return Err(Error::Validation(ValidationError::InvalidInput(format!(
                "Bond {} has a negative rate {}",
                self.id, method.rate
            ))));
        }
        Ok(())
    }
}
