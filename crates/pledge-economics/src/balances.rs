//! Reward crediting
//!
//! The stake ledger that receives payments lives outside the engine; it is
//! reached through [`RewardSink`]. [`RewardBalances`] is the in-memory sink.

use pledge_core::{checked_add, Address, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Receives the two halves of a validator's share
pub trait RewardSink {
    /// Credit both amounts or neither
    fn credit(&mut self, validator: &Address, validator_payment: u128, voters_payment: u128)
        -> Result<()>;
}

/// In-memory reward balances
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RewardBalances {
    validator_rewards: BTreeMap<Address, u128>,
    voter_pools: BTreeMap<Address, u128>,
}

impl RewardBalances {
    pub fn new() -> Self {
        Self::default()
    }

    /// Operator reward balance
    pub fn validator_reward(&self, validator: &Address) -> u128 {
        self.validator_rewards.get(validator).copied().unwrap_or(0)
    }

    /// Pool owed to the validator's voters
    pub fn voter_pool(&self, validator: &Address) -> u128 {
        self.voter_pools.get(validator).copied().unwrap_or(0)
    }

    /// Everything credited so far
    pub fn total(&self) -> Result<u128> {
        self.validator_rewards
            .values()
            .chain(self.voter_pools.values())
            .try_fold(0u128, |acc, v| checked_add(acc, *v))
    }
}

impl RewardSink for RewardBalances {
    fn credit(
        &mut self,
        validator: &Address,
        validator_payment: u128,
        voters_payment: u128,
    ) -> Result<()> {
        let reward = checked_add(self.validator_reward(validator), validator_payment)?;
        let pool = checked_add(self.voter_pool(validator), voters_payment)?;

        self.validator_rewards.insert(*validator, reward);
        self.voter_pools.insert(*validator, pool);
        Ok(())
    }
}
