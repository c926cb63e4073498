//! Token amounts and basis points.
//!
//! Every amount the contracts see is an integer in the token's smallest
//! unit. MockUSDT uses 6 decimals, so `"500"` becomes `500_000_000`.

use alloy_primitives::utils::{format_units, parse_units};
use alloy_primitives::U256;

use crate::errors::{ValidationError, ValidationResult};

/// Decimals of the MockUSDT token.
pub const TOKEN_DECIMALS: u8 = 6;

/// Basis points denominator (100%).
pub const BASIS_POINTS: u64 = 10_000;

/// Convert a human decimal string (e.g. `"12.5"`) into base units.
pub fn to_base_units(amount: &str, decimals: u8) -> ValidationResult<U256> {
    let parsed = parse_units(amount, decimals)
        .map_err(|e| ValidationError::InvalidAmount(format!("{amount}: {e}")))?;
    if parsed.is_negative() {
        return Err(ValidationError::InvalidAmount(format!(
            "{amount}: negative amounts are not allowed"
        )));
    }
    Ok(parsed.get_absolute())
}

/// Render base units as a human decimal string.
pub fn from_base_units(amount: U256, decimals: u8) -> ValidationResult<String> {
    format_units(amount, decimals).map_err(|e| ValidationError::InvalidAmount(e.to_string()))
}

/// `amount * bps / 10_000`, rounded down.
pub fn apply_bps(amount: U256, bps: u64) -> U256 {
    amount.saturating_mul(U256::from(bps)) / U256::from(BASIS_POINTS)
}
