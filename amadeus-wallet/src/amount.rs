//! Decimal-to-atomic amount conversion for the AMA token.
//!
//! One whole AMA is `10^9` atomic units. Conversion truncates toward zero:
//! fractional atomic units beyond the ninth decimal are discarded, never
//! rounded up. The conversion deliberately goes through `f64` so that the
//! accepted inputs and truncation results match the reference front-end,
//! which parses amounts as IEEE-754 doubles.

use crate::error::{Error, Result};

/// Number of decimal places in one whole AMA token.
pub const AMA_DECIMALS: u32 = 9;

const ATOMIC_PER_AMA: f64 = 1_000_000_000.0;

/// Convert a user-facing decimal amount to integer atomic units.
///
/// Example: `"1.5"` → `1_500_000_000`.
///
/// # Errors
///
/// Returns [`Error::InvalidAmount`] when the input does not parse as a
/// finite number or is not strictly positive.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn to_atomic_units(amount: &str) -> Result<u64> {
    let numeric: f64 = amount
        .trim()
        .parse()
        .map_err(|_| Error::invalid_amount(amount))?;
    if !numeric.is_finite() || numeric <= 0.0 {
        return Err(Error::invalid_amount(amount));
    }
    Ok((numeric * ATOMIC_PER_AMA).floor() as u64)
}

/// Convert integer atomic units back to a decimal token amount.
///
/// Exact inverse of [`to_atomic_units`] for values where no truncation
/// occurred.
#[must_use]
pub fn from_atomic_units(units: u64) -> f64 {
    units as f64 / ATOMIC_PER_AMA
}
