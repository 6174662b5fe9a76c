//! Money helpers
//!
//! All amounts are integer minor units (pence for GBP). Major-unit rendering
//! only ever happens for log output and goes through `rust_decimal` so no
//! float rounding sneaks in.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Decimal places between minor and major units.
pub const MINOR_UNIT_SCALE: u32 = 2;

/// Minor units in one major unit.
pub const MINOR_PER_MAJOR: i64 = 100;

/// Currency amount as exchanged with the bank API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Amount {
    pub currency: String,
    pub minor_units: i64,
}

impl Amount {
    pub fn new(currency: impl Into<String>, minor_units: i64) -> Self {
        Self {
            currency: currency.into(),
            minor_units,
        }
    }

    /// Major-unit rendering, e.g. `25.12 GBP`.
    pub fn display(&self) -> String {
        format!("{} {}", format_minor(self.minor_units), self.currency)
    }
}

/// Distance from `minor_units` up to the next whole major unit.
///
/// Exact multiples of a major unit round up by zero, so the result is always
/// in `0..=99`.
pub fn round_up(minor_units: i64) -> i64 {
    // Remainder form; never overflows, even at i64::MAX
    (MINOR_PER_MAJOR - minor_units.rem_euclid(MINOR_PER_MAJOR)) % MINOR_PER_MAJOR
}

/// Render minor units as a major-unit decimal string (`275412` -> `2754.12`).
pub fn format_minor(minor_units: i64) -> String {
    Decimal::new(minor_units, MINOR_UNIT_SCALE).to_string()
}
