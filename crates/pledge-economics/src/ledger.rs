//! # Distribution Ledger
//!
//! Append-only record of every payment, keyed by `(validator, epoch)`.
//! A record's presence is what makes a second payment for the same key
//! fail with `AlreadyDistributed`.

use pledge_core::{checked_add, Address, EpochId, Result, RewardError};
use serde::{Deserialize, Serialize};
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

/// One committed distribution
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributionRecord {
    pub validator: Address,
    pub epoch: EpochId,

    /// Credited to the operator
    pub validator_payment: u128,

    /// Credited to the validator's voter pool
    pub voters_payment: u128,
}

impl DistributionRecord {
    /// Full share paid for the validator
    pub fn total(&self) -> Result<u128> {
        checked_add(self.validator_payment, self.voters_payment)
    }
}

/// Insert-only `(validator, epoch)` store
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct DistributionLedger {
    records: BTreeMap<(Address, EpochId), DistributionRecord>,
}

impl DistributionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a record; an existing key is never overwritten
    pub fn append(&mut self, record: DistributionRecord) -> Result<()> {
        match self.records.entry((record.validator, record.epoch)) {
            Entry::Occupied(_) => Err(RewardError::AlreadyDistributed {
                validator: record.validator,
                epoch: record.epoch,
            }),
            Entry::Vacant(slot) => {
                slot.insert(record);
                Ok(())
            }
        }
    }

    pub fn get(&self, validator: &Address, epoch: EpochId) -> Option<&DistributionRecord> {
        self.records.get(&(*validator, epoch))
    }

    pub fn contains(&self, validator: &Address, epoch: EpochId) -> bool {
        self.records.contains_key(&(*validator, epoch))
    }

    /// All records of one epoch
    pub fn records_for_epoch(&self, epoch: EpochId) -> Vec<&DistributionRecord> {
        self.records
            .values()
            .filter(|record| record.epoch == epoch)
            .collect()
    }

    /// Sum of shares paid in one epoch
    pub fn epoch_total(&self, epoch: EpochId) -> Result<u128> {
        self.records
            .values()
            .filter(|record| record.epoch == epoch)
            .try_fold(0u128, |acc, record| checked_add(acc, record.total()?))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
