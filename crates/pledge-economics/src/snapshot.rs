//! # Epoch Snapshot
//!
//! Frozen view of everything a distribution reads, taken when an epoch
//! opens. Score, commission and pledge multiplier writes made after the
//! snapshot only reach the next epoch.
//!
//! ```text
//!   denominator = Σ (score_i + pledge_multiplier)   over the eligible set
//! ```

use pledge_core::{checked_add, Address, EpochId, Result, RewardError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::distributor::EligibilityPolicy;
use crate::registry::{ValidatorRegistry, ValidatorStatus};

/// One validator's frozen inputs
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotEntry {
    pub status: ValidatorStatus,
    pub score: u128,

    /// Commission in force for this epoch
    pub commission: u128,

    /// Votes backing the validator in the election
    pub votes: u128,
}

/// Per-epoch frozen distribution inputs
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpochSnapshot {
    epoch: EpochId,
    pledge_multiplier: u128,
    entries: BTreeMap<Address, SnapshotEntry>,
    total_votes: u128,
    denominator: u128,
}

impl EpochSnapshot {
    /// Capture every validator the policy admits.
    ///
    /// `votes` lists election votes per validator; a validator without an
    /// entry has zero votes. Votes for a validator outside the eligible set
    /// are rejected.
    pub fn capture(
        epoch: EpochId,
        registry: &ValidatorRegistry,
        pledge_multiplier: u128,
        policy: EligibilityPolicy,
        votes: &[(Address, u128)],
    ) -> Result<Self> {
        let mut entries = BTreeMap::new();
        let mut denominator = 0u128;

        for validator in registry.iter().filter(|v| policy.admits(v.status)) {
            denominator = checked_add(denominator, checked_add(validator.score, pledge_multiplier)?)?;
            entries.insert(
                validator.address,
                SnapshotEntry {
                    status: validator.status,
                    score: validator.score,
                    commission: validator.commission_at(epoch),
                    votes: 0,
                },
            );
        }

        let mut total_votes = 0u128;
        for (address, amount) in votes {
            let entry = entries
                .get_mut(address)
                .ok_or_else(|| RewardError::ValidatorNotEligible {
                    validator: *address,
                    reason: format!("votes given for a {} validator", registry.status(address)),
                })?;
            entry.votes = checked_add(entry.votes, *amount)?;
            total_votes = checked_add(total_votes, *amount)?;
        }

        tracing::debug!(
            epoch = %epoch,
            validators = entries.len(),
            denominator,
            "Captured epoch snapshot"
        );

        Ok(Self {
            epoch,
            pledge_multiplier,
            entries,
            total_votes,
            denominator,
        })
    }

    pub fn epoch(&self) -> EpochId {
        self.epoch
    }

    pub fn pledge_multiplier(&self) -> u128 {
        self.pledge_multiplier
    }

    /// `Σ(score_i + pledge_multiplier)` over the captured set
    pub fn denominator(&self) -> u128 {
        self.denominator
    }

    pub fn total_votes(&self) -> u128 {
        self.total_votes
    }

    pub fn get(&self, validator: &Address) -> Option<&SnapshotEntry> {
        self.entries.get(validator)
    }

    pub fn contains(&self, validator: &Address) -> bool {
        self.entries.contains_key(validator)
    }

    /// Captured validators in address order
    pub fn members(&self) -> impl Iterator<Item = &Address> {
        self.entries.keys()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
