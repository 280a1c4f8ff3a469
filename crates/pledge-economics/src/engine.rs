//! # Reward Engine
//!
//! Single-writer facade over the registry, pledge multiplier, distributor
//! and reward balances. An epoch runs as:
//!
//! ```text
//!   open_epoch(votes) ─► distribute(v, pool, denominator) × n ─► close_epoch()
//!        │                                                           │
//!   snapshot frozen                                     summary, epoch + 1,
//!                                                       due commissions applied
//! ```
//!
//! Every method takes `&mut self` and either commits fully or returns an
//! error with nothing changed. [`SharedRewardEngine`] serialises access for
//! hosts that call in from several threads.

use parking_lot::Mutex;
use pledge_core::{Address, EpochId, Result, RewardError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::balances::RewardBalances;
use crate::config::{ConfigError, EngineConfig};
use crate::distributor::{DistributionEvent, EpochRewardDistributor};
use crate::keys::{FormatKeyVerifier, KeyMaterial, KeyVerifier};
use crate::ledger::{DistributionLedger, DistributionRecord};
use crate::pledge::PledgeMultiplier;
use crate::registry::{ValidatorRegistry, ValidatorStatus, ValidatorView};
use crate::snapshot::EpochSnapshot;
use crate::stake::StakeProof;

/// Result of closing an epoch
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpochSummary {
    pub epoch: EpochId,

    /// Sum of every share paid in the epoch
    pub pool_distributed: u128,

    pub validators_paid: usize,

    /// Largest pool passed to `distribute` minus what was paid
    pub dust: u128,
}

/// Epoch reward engine
pub struct RewardEngine {
    config: EngineConfig,
    registry: ValidatorRegistry,
    pledge: PledgeMultiplier,
    distributor: EpochRewardDistributor,
    balances: RewardBalances,
    verifier: Box<dyn KeyVerifier>,
    epoch: EpochId,
    snapshot: Option<EpochSnapshot>,
    max_pool: u128,
}

impl RewardEngine {
    /// Create an engine at the genesis epoch
    pub fn new(config: EngineConfig) -> std::result::Result<Self, ConfigError> {
        config.validate()?;

        let registry =
            ValidatorRegistry::new(config.registration.clone(), config.roles.updater);
        let pledge = PledgeMultiplier::new(&config.pledge, config.roles.governance);
        let distributor = EpochRewardDistributor::new(
            config.distribution.curve,
            config.distribution.eligibility,
        );

        tracing::info!(
            curve = ?config.distribution.curve,
            eligibility = ?config.distribution.eligibility,
            pledge_multiplier = pledge.get(),
            "Reward engine initialized"
        );

        Ok(Self {
            config,
            registry,
            pledge,
            distributor,
            balances: RewardBalances::new(),
            verifier: Box::new(FormatKeyVerifier),
            epoch: EpochId::GENESIS,
            snapshot: None,
            max_pool: 0,
        })
    }

    /// Replace the identity-registry key check
    pub fn with_key_verifier(mut self, verifier: impl KeyVerifier + 'static) -> Self {
        self.verifier = Box::new(verifier);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn current_epoch(&self) -> EpochId {
        self.epoch
    }

    // === Registry ===

    pub fn register(
        &mut self,
        validator: Address,
        commission: u128,
        keys: KeyMaterial,
        stake: StakeProof,
        now: u64,
    ) -> Result<ValidatorStatus> {
        let entry = self.registry.register(
            validator,
            commission,
            keys,
            self.verifier.as_ref(),
            stake,
            now,
        )?;
        Ok(entry.status)
    }

    pub fn set_score(&mut self, caller: &Address, validator: &Address, score: u128) -> Result<()> {
        self.registry.set_score(caller, validator, score)
    }

    /// Queue a commission change; returns the epoch it takes effect
    pub fn set_commission(&mut self, validator: &Address, commission: u128) -> Result<EpochId> {
        self.registry.set_commission(validator, commission, self.epoch)
    }

    pub fn update_elected_set(&mut self, members: &[Address], now: u64) -> Result<()> {
        self.registry.update_elected_set(members, now)
    }

    pub fn deregister(&mut self, validator: &Address, now: u64) -> Result<ValidatorStatus> {
        self.registry.deregister(validator, now)
    }

    pub fn process_exits(&mut self, now: u64) -> Vec<Address> {
        self.registry.process_exits(now)
    }

    pub fn get_validator(&self, validator: &Address) -> Result<ValidatorView> {
        self.registry.view(validator)
    }

    pub fn registry(&self) -> &ValidatorRegistry {
        &self.registry
    }

    // === Pledge multiplier ===

    pub fn get_pledge_multiplier(&self) -> u128 {
        self.pledge.get()
    }

    pub fn set_pledge_multiplier(&mut self, caller: &Address, value: u128) -> Result<()> {
        self.pledge.set(caller, value)
    }

    // === Epoch lifecycle ===

    /// Freeze scores, commissions, votes and the pledge multiplier for the
    /// current epoch
    pub fn open_epoch(&mut self, votes: &[(Address, u128)]) -> Result<&EpochSnapshot> {
        if self.snapshot.is_some() {
            return Err(RewardError::EpochAlreadyOpen(self.epoch));
        }
        let snapshot = EpochSnapshot::capture(
            self.epoch,
            &self.registry,
            self.pledge.get(),
            self.distributor.policy(),
            votes,
        )?;

        tracing::info!(
            epoch = %self.epoch,
            validators = snapshot.len(),
            denominator = snapshot.denominator(),
            "Epoch opened"
        );
        self.max_pool = 0;
        Ok(&*self.snapshot.insert(snapshot))
    }

    pub fn snapshot(&self) -> Option<&EpochSnapshot> {
        self.snapshot.as_ref()
    }

    /// Pay one validator from the open epoch's snapshot. The validator must
    /// still be eligible in the registry at call time.
    pub fn distribute(
        &mut self,
        validator: &Address,
        pool: u128,
        denominator: u128,
    ) -> Result<DistributionRecord> {
        let snapshot = self.snapshot.as_ref().ok_or(RewardError::EpochNotOpen)?;
        let record = self.distributor.distribute(
            snapshot,
            &self.registry,
            validator,
            pool,
            denominator,
            &mut self.balances,
        )?;
        self.max_pool = self.max_pool.max(pool);
        Ok(record)
    }

    /// Pay every snapshot member using the snapshot's denominator.
    ///
    /// Failures are collected per validator and never stop the others.
    pub fn distribute_all(
        &mut self,
        pool: u128,
    ) -> Result<Vec<(Address, Result<DistributionRecord>)>> {
        let (members, denominator) = {
            let snapshot = self.snapshot.as_ref().ok_or(RewardError::EpochNotOpen)?;
            let members: Vec<Address> = snapshot.members().copied().collect();
            (members, snapshot.denominator())
        };

        Ok(members
            .into_iter()
            .map(|validator| {
                let result = self.distribute(&validator, pool, denominator);
                (validator, result)
            })
            .collect())
    }

    /// Close the open epoch, advance to the next one and apply due
    /// commission changes
    pub fn close_epoch(&mut self) -> Result<EpochSummary> {
        let epoch = self
            .snapshot
            .as_ref()
            .map(EpochSnapshot::epoch)
            .ok_or(RewardError::EpochNotOpen)?;

        let ledger = self.distributor.ledger();
        let pool_distributed = ledger.epoch_total(epoch)?;
        let summary = EpochSummary {
            epoch,
            pool_distributed,
            validators_paid: ledger.records_for_epoch(epoch).len(),
            dust: self.max_pool.saturating_sub(pool_distributed),
        };

        self.snapshot = None;
        self.epoch = epoch.next();
        self.registry.advance_epoch(self.epoch);
        self.max_pool = 0;

        tracing::info!(
            epoch = %summary.epoch,
            paid = summary.validators_paid,
            distributed = summary.pool_distributed,
            dust = summary.dust,
            "Epoch closed"
        );
        Ok(summary)
    }

    // === Read side ===

    pub fn ledger(&self) -> &DistributionLedger {
        self.distributor.ledger()
    }

    pub fn balances(&self) -> &RewardBalances {
        &self.balances
    }

    pub fn events(&self) -> &[DistributionEvent] {
        self.distributor.events()
    }

    pub fn drain_events(&mut self) -> Vec<DistributionEvent> {
        self.distributor.drain_events()
    }
}

/// Thread-safe handle; every call holds the lock for its whole duration
#[derive(Clone)]
pub struct SharedRewardEngine {
    engine: Arc<Mutex<RewardEngine>>,
}

impl SharedRewardEngine {
    pub fn new(engine: RewardEngine) -> Self {
        Self {
            engine: Arc::new(Mutex::new(engine)),
        }
    }

    /// Run `f` with exclusive access
    pub fn with<R>(&self, f: impl FnOnce(&mut RewardEngine) -> R) -> R {
        let mut engine = self.engine.lock();
        f(&mut engine)
    }

    pub fn distribute(
        &self,
        validator: &Address,
        pool: u128,
        denominator: u128,
    ) -> Result<DistributionRecord> {
        self.engine.lock().distribute(validator, pool, denominator)
    }

    /// Denominator of the open epoch, if any
    pub fn denominator(&self) -> Option<u128> {
        self.engine.lock().snapshot().map(EpochSnapshot::denominator)
    }
}
