//! # Stake Proofs
//!
//! Evidence from the external stake ledger that an account has collateral
//! locked. Registration needs both enough value and enough time locked.

use pledge_core::{Result, RewardError};
use serde::{Deserialize, Serialize};

use crate::config::RegistrationConfig;

/// Locked stake as reported by the stake ledger
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakeProof {
    /// Amount currently locked
    pub locked_amount: u128,

    /// Unix seconds since which at least `locked_amount` has been locked
    pub locked_since: u64,
}

impl StakeProof {
    pub fn new(locked_amount: u128, locked_since: u64) -> Self {
        Self {
            locked_amount,
            locked_since,
        }
    }

    /// Seconds the stake has been held at `now`
    pub fn held_secs(&self, now: u64) -> u64 {
        now.saturating_sub(self.locked_since)
    }

    /// Check value and duration against the registration requirements
    pub fn meets(&self, requirements: &RegistrationConfig, now: u64) -> Result<()> {
        let held_secs = self.held_secs(now);
        if self.locked_amount < requirements.min_locked_value
            || held_secs < requirements.min_lock_duration_secs
        {
            return Err(RewardError::InsufficientStake {
                required: requirements.min_locked_value,
                locked: self.locked_amount,
                required_secs: requirements.min_lock_duration_secs,
                held_secs,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn requirements() -> RegistrationConfig {
        RegistrationConfig {
            min_locked_value: 1_000,
            min_lock_duration_secs: 100,
            ..RegistrationConfig::default()
        }
    }

    #[test]
    fn test_sufficient_stake() {
        let proof = StakeProof::new(1_000, 0);
        assert!(proof.meets(&requirements(), 100).is_ok());
    }

    #[test]
    fn test_below_minimum_value() {
        let proof = StakeProof::new(999, 0);
        assert!(matches!(
            proof.meets(&requirements(), 1_000),
            Err(RewardError::InsufficientStake { locked: 999, .. })
        ));
    }

    #[test]
    fn test_locked_too_recently() {
        let proof = StakeProof::new(5_000, 50);
        assert!(matches!(
            proof.meets(&requirements(), 100),
            Err(RewardError::InsufficientStake { held_secs: 50, .. })
        ));
    }

    #[test]
    fn test_clock_before_lock_counts_as_zero() {
        let proof = StakeProof::new(5_000, 500);
        assert_eq!(proof.held_secs(100), 0);
    }
}
