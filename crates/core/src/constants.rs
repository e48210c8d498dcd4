/// Decimal precision for accrual results
pub const DECIMAL_PRECISION: u32 = 6;

/// Decimal precision for display
pub const DISPLAY_DECIMAL_PRECISION: u32 = 2;

/// Day-count basis used to turn an annualized rate into a daily one
pub const DAYS_IN_YEAR: i64 = 365;

/// Days between two capitalization events for annual capitalization
pub const ANNUAL_CAPITALIZATION_PERIOD_DAYS: i64 = 365;

/// Default window (in days) within which equal amounts are flagged as a possible duplicate
pub const DEFAULT_DATE_TOLERANCE_DAYS: u32 = 3;
