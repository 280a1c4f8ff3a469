//! # Pledge Core
//!
//! Shared building blocks for the Pledge epoch reward engine.
//!
//! This crate provides:
//! - `fixed` - scaled-integer multiply/divide with widened intermediates
//! - `Address` / `EpochId` - validator identity and epoch numbering
//! - `RewardError` - the error taxonomy every engine call reports through
//!
//! ## Fixed-Point Bases
//!
//! | Quantity | Constant | 100% |
//! |----------|----------|------|
//! | score, pledge multiplier | `SCORE_BASE` | 10^24 |
//! | commission | `COMMISSION_BASE` | 10^6 |

pub mod error;
pub mod fixed;
pub mod types;

pub use error::*;
pub use fixed::{
    checked_add, fraction_mul, mul_div, scaled_div, scaled_mul, COMMISSION_BASE,
    FRACTION_MUL_PRECISION, SCORE_BASE,
};
pub use types::*;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::{ErrorKind, Result, RewardError};
    pub use crate::fixed::{COMMISSION_BASE, SCORE_BASE};
    pub use crate::types::{Address, EpochId};
}
