//! Error types for Pledge reward engine operations

use crate::types::{Address, EpochId};
use thiserror::Error;

/// Result type alias for Pledge operations
pub type Result<T> = std::result::Result<T, RewardError>;

/// Broad class of a failure
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad input: key material, out-of-range values, insufficient stake, wrong caller
    Validation,
    /// Call is not allowed in the current lifecycle or ledger state
    State,
    /// Zero divisor or a value that does not fit after widening
    Arithmetic,
}

/// Errors that can occur in Pledge operations.
///
/// Every error aborts the whole call; none of them leaves partial state behind.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RewardError {
    // === Validation ===
    /// Key material has the wrong shape or does not resolve to the validator
    #[error("Invalid key material: {0}")]
    InvalidKeyMaterial(String),

    /// Locked stake below the registration requirement
    #[error("Insufficient stake: need {required} locked for {required_secs}s, have {locked} locked for {held_secs}s")]
    InsufficientStake {
        required: u128,
        locked: u128,
        required_secs: u64,
        held_secs: u64,
    },

    /// Score outside `[0, SCORE_BASE]`
    #[error("Score {score} outside [0, {max}]")]
    ScoreOutOfRange { score: u128, max: u128 },

    /// Commission outside `[0, COMMISSION_BASE]`
    #[error("Commission {commission} outside [0, {max}]")]
    CommissionOutOfRange { commission: u128, max: u128 },

    /// Pledge multiplier above its configured maximum
    #[error("Pledge multiplier {value} exceeds maximum {max}")]
    PledgeMultiplierOutOfRange { value: u128, max: u128 },

    /// Caller does not hold the role required by the call
    #[error("{caller} is not authorized as {role}")]
    Unauthorized { caller: Address, role: &'static str },

    // === State ===
    /// Validator is unknown to the registry
    #[error("Validator not found: {0}")]
    ValidatorNotFound(Address),

    /// Validator already has a registry entry
    #[error("Validator already registered: {0}")]
    AlreadyRegistered(Address),

    /// Validator cannot receive a distribution
    #[error("Validator {validator} not eligible: {reason}")]
    ValidatorNotEligible { validator: Address, reason: String },

    /// Validator was already paid in this epoch
    #[error("Validator {validator} already distributed for epoch {epoch}")]
    AlreadyDistributed { validator: Address, epoch: EpochId },

    /// Validator still sits in the elected set
    #[error("Validator {0} is still elected")]
    StillElected(Address),

    /// No epoch snapshot is open
    #[error("No epoch is open")]
    EpochNotOpen,

    /// An epoch snapshot is already open
    #[error("Epoch {0} is already open")]
    EpochAlreadyOpen(EpochId),

    // === Arithmetic ===
    /// Denominator is zero or inconsistent with the snapshot
    #[error("Invalid denominator: {0}")]
    InvalidDenominator(u128),

    /// Division by zero
    #[error("Division by zero")]
    DivideByZero,

    /// Result does not fit even with widened intermediates
    #[error("Arithmetic overflow")]
    ArithmeticOverflow,
}

impl RewardError {
    /// Classify the error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidKeyMaterial(_)
            | Self::InsufficientStake { .. }
            | Self::ScoreOutOfRange { .. }
            | Self::CommissionOutOfRange { .. }
            | Self::PledgeMultiplierOutOfRange { .. }
            | Self::Unauthorized { .. } => ErrorKind::Validation,
            Self::ValidatorNotFound(_)
            | Self::AlreadyRegistered(_)
            | Self::ValidatorNotEligible { .. }
            | Self::AlreadyDistributed { .. }
            | Self::StillElected(_)
            | Self::EpochNotOpen
            | Self::EpochAlreadyOpen(_) => ErrorKind::State,
            Self::InvalidDenominator(_) | Self::DivideByZero | Self::ArithmeticOverflow => {
                ErrorKind::Arithmetic
            }
        }
    }

    /// Get the error code for API responses
    pub fn code(&self) -> u32 {
        match self {
            Self::InvalidKeyMaterial(_) => 1001,
            Self::InsufficientStake { .. } => 1002,
            Self::ScoreOutOfRange { .. } => 1003,
            Self::CommissionOutOfRange { .. } => 1004,
            Self::PledgeMultiplierOutOfRange { .. } => 1005,
            Self::Unauthorized { .. } => 1006,
            Self::ValidatorNotFound(_) => 2001,
            Self::AlreadyRegistered(_) => 2002,
            Self::ValidatorNotEligible { .. } => 2003,
            Self::AlreadyDistributed { .. } => 2004,
            Self::StillElected(_) => 2005,
            Self::EpochNotOpen | Self::EpochAlreadyOpen(_) => 2006,
            Self::InvalidDenominator(_) => 3001,
            Self::DivideByZero => 3002,
            Self::ArithmeticOverflow => 3003,
        }
    }

    /// Whether the same call may succeed later once external state catches up
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::InsufficientStake { .. }
                | Self::ValidatorNotFound(_)
                | Self::StillElected(_)
                | Self::EpochNotOpen
        )
    }
}
