//! # Fixed-Point Arithmetic
//!
//! Every financial computation in the engine goes through this module.
//! Operands and results are `u128`; products are formed in a 256-bit
//! intermediate so the full product exists before anything is divided.
//!
//! ```text
//!   scaled_mul(a, b, base) = floor(a * b / base)
//!   scaled_div(a, b, base) = floor(a * base / b)
//!   mul_div(a, b, c)       = floor(a * b / c)
//! ```

use crate::error::{Result, RewardError};
use primitive_types::U256;

/// Base for scores, the pledge multiplier and reward fractions (1.0 == 10^24)
pub const SCORE_BASE: u128 = 1_000_000_000_000_000_000_000_000;

/// Base for commission (1.0 == 10^6, so 100_000 is 10%)
pub const COMMISSION_BASE: u128 = 1_000_000;

/// Precision kept for each fractional operand in [`fraction_mul`] (sqrt of `SCORE_BASE`)
pub const FRACTION_MUL_PRECISION: u128 = 1_000_000_000_000;

/// `floor(a * b / c)` with a single widened multiply.
pub fn mul_div(a: u128, b: u128, c: u128) -> Result<u128> {
    if c == 0 {
        return Err(RewardError::DivideByZero);
    }
    let product = U256::from(a)
        .checked_mul(U256::from(b))
        .ok_or(RewardError::ArithmeticOverflow)?;
    narrow(product / U256::from(c))
}

/// `floor(a * b / base)`
pub fn scaled_mul(a: u128, b: u128, base: u128) -> Result<u128> {
    mul_div(a, b, base)
}

/// `floor(a * base / b)`
pub fn scaled_div(a: u128, b: u128, base: u128) -> Result<u128> {
    if b == 0 {
        return Err(RewardError::DivideByZero);
    }
    mul_div(a, base, b)
}

/// Multiply two `SCORE_BASE` fractions, Fixidity style.
///
/// Each operand is split into its integer and fractional parts. The
/// integer cross terms are exact; the two fractional parts are each
/// truncated to `FRACTION_MUL_PRECISION` before being multiplied, so the
/// fractional product keeps 12 significant decimals.
pub fn fraction_mul(x: u128, y: u128) -> Result<u128> {
    let base = U256::from(SCORE_BASE);
    let precision = U256::from(FRACTION_MUL_PRECISION);

    let (x1, x2) = (U256::from(x / SCORE_BASE), U256::from(x % SCORE_BASE));
    let (y1, y2) = (U256::from(y / SCORE_BASE), U256::from(y % SCORE_BASE));

    let x1y1 = x1
        .checked_mul(y1)
        .and_then(|v| v.checked_mul(base))
        .ok_or(RewardError::ArithmeticOverflow)?;
    let x1y2 = x1.checked_mul(y2).ok_or(RewardError::ArithmeticOverflow)?;
    let x2y1 = x2.checked_mul(y1).ok_or(RewardError::ArithmeticOverflow)?;
    let x2y2 = (x2 / precision)
        .checked_mul(y2 / precision)
        .ok_or(RewardError::ArithmeticOverflow)?;

    let sum = x1y1
        .checked_add(x1y2)
        .and_then(|v| v.checked_add(x2y1))
        .and_then(|v| v.checked_add(x2y2))
        .ok_or(RewardError::ArithmeticOverflow)?;
    narrow(sum)
}

/// Overflow-checked addition for amounts.
pub fn checked_add(a: u128, b: u128) -> Result<u128> {
    a.checked_add(b).ok_or(RewardError::ArithmeticOverflow)
}

fn narrow(value: U256) -> Result<u128> {
    if value > U256::from(u128::MAX) {
        return Err(RewardError::ArithmeticOverflow);
    }
    Ok(value.as_u128())
}
