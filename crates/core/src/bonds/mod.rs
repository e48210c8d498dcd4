//! Bond value projection.
//!
//! BOND ledgers store purchase and redemption entries; the value between
//! entries is derived by simulating daily interest accrual from the bond's
//! rate schedule.

mod accrual_calculator;
mod accrual_service;
mod bonds_errors;
mod bonds_model;
mod bonds_traits;

#[cfg(test)]
mod accrual_calculator_tests;

pub use accrual_calculator::{compute_daily_value, DailyValueSeries};
pub use accrual_service::AccrualService;
pub use bonds_errors::AccrualError;
pub use bonds_model::{BondDetails, CalculationMethod, CapitalizationMethod, DateOperator};
pub use bonds_traits::{AccrualServiceTrait, BondDetailsRepositoryTrait};
