//! Pledge multiplier parameter
//!
//! A single governance-controlled value (base `SCORE_BASE`) added to every
//! validator's weight. It sets the floor share a zero-score validator still
//! earns; a higher value flattens payouts toward equal shares.

use pledge_core::{Address, Result, RewardError};
use serde::{Deserialize, Serialize};

use crate::config::PledgeConfig;

/// Governance-tunable smoothing term
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PledgeMultiplier {
    value: u128,
    maximum: u128,
    governance: Address,
}

impl PledgeMultiplier {
    pub fn new(config: &PledgeConfig, governance: Address) -> Self {
        Self {
            value: config.initial.min(config.maximum),
            maximum: config.maximum,
            governance,
        }
    }

    pub fn get(&self) -> u128 {
        self.value
    }

    pub fn maximum(&self) -> u128 {
        self.maximum
    }

    /// Change the multiplier (governance role only)
    pub fn set(&mut self, caller: &Address, value: u128) -> Result<()> {
        if *caller != self.governance {
            return Err(RewardError::Unauthorized {
                caller: *caller,
                role: "governance",
            });
        }
        if value > self.maximum {
            return Err(RewardError::PledgeMultiplierOutOfRange {
                value,
                max: self.maximum,
            });
        }

        tracing::info!(old = self.value, new = value, "Pledge multiplier changed");
        self.value = value;
        Ok(())
    }
}
