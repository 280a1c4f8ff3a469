//! # Epoch Reward Distributor
//!
//! Computes one validator's share of the epoch pool, splits it between the
//! operator and the voters, credits both and records the payment.
//!
//! ## Reward Curves
//!
//! | Curve | Share of `pool` | Operator cut |
//! |-------|-----------------|--------------|
//! | `ScoreWeighted` | `(score + pledge) / denominator` | `commission` |
//! | `StakeBlended` | `pledge * votes/V + (1 - pledge) * score/S` | `commission * score` |
//!
//! For `StakeBlended`, `S = denominator - n * pledge` is the score sum over
//! the `n` snapshot members and `V` is their total votes.
//!
//! Every check runs before anything is written, so a rejected call leaves
//! balances, ledger and audit log untouched.

use pledge_core::{
    checked_add, fraction_mul, mul_div, scaled_div, Address, EpochId, Result, RewardError,
    COMMISSION_BASE, SCORE_BASE,
};
use serde::{Deserialize, Serialize};

use crate::balances::RewardSink;
use crate::ledger::{DistributionLedger, DistributionRecord};
use crate::registry::{ValidatorRegistry, ValidatorStatus};
use crate::snapshot::{EpochSnapshot, SnapshotEntry};

/// Tracing target for payment audit events
pub const DISTRIBUTION_TARGET: &str = "pledge::distribution";

/// How a validator's share of the pool is computed
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RewardCurve {
    /// `floor(pool * (score + pledge) / denominator)`, split by commission
    #[default]
    ScoreWeighted,
    /// Pledge-weighted blend of vote share and score share
    StakeBlended,
}

/// Which lifecycle states may be paid
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EligibilityPolicy {
    #[default]
    RegisteredOrElected,
    ElectedOnly,
}

impl EligibilityPolicy {
    pub fn admits(&self, status: ValidatorStatus) -> bool {
        match self {
            Self::RegisteredOrElected => status.is_active(),
            Self::ElectedOnly => status == ValidatorStatus::Elected,
        }
    }
}

/// A computed split, not yet committed
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payout {
    pub share: u128,
    pub validator_payment: u128,
    pub voters_payment: u128,
}

impl Payout {
    fn split(share: u128, validator_payment: u128) -> Self {
        Self {
            share,
            validator_payment,
            voters_payment: share - validator_payment,
        }
    }
}

impl RewardCurve {
    /// Compute a member's payout from the snapshot
    pub fn payout(
        &self,
        snapshot: &EpochSnapshot,
        entry: &SnapshotEntry,
        pool: u128,
        denominator: u128,
    ) -> Result<Payout> {
        if denominator == 0 {
            return Err(RewardError::InvalidDenominator(denominator));
        }
        match self {
            Self::ScoreWeighted => score_weighted(snapshot, entry, pool, denominator),
            Self::StakeBlended => stake_blended(snapshot, entry, pool, denominator),
        }
    }
}

fn score_weighted(
    snapshot: &EpochSnapshot,
    entry: &SnapshotEntry,
    pool: u128,
    denominator: u128,
) -> Result<Payout> {
    let weight = checked_add(entry.score, snapshot.pledge_multiplier())?;
    let share = mul_div(pool, weight, denominator)?;
    // commission <= COMMISSION_BASE, so validator_payment <= share
    let validator_payment = mul_div(share, entry.commission, COMMISSION_BASE)?;
    Ok(Payout::split(share, validator_payment))
}

fn stake_blended(
    snapshot: &EpochSnapshot,
    entry: &SnapshotEntry,
    pool: u128,
    denominator: u128,
) -> Result<Payout> {
    let pledge = snapshot.pledge_multiplier();
    let score_weight = SCORE_BASE
        .checked_sub(pledge)
        .ok_or(RewardError::PledgeMultiplierOutOfRange {
            value: pledge,
            max: SCORE_BASE,
        })?;

    let pledge_total = (snapshot.len() as u128)
        .checked_mul(pledge)
        .ok_or(RewardError::ArithmeticOverflow)?;
    let score_total = match denominator.checked_sub(pledge_total) {
        Some(total) if total > 0 => total,
        _ => return Err(RewardError::InvalidDenominator(denominator)),
    };

    let vote_fraction = scaled_div(entry.votes, snapshot.total_votes(), SCORE_BASE)?;
    let score_fraction = scaled_div(entry.score, score_total, SCORE_BASE)?;
    let fraction = checked_add(
        fraction_mul(pledge, vote_fraction)?,
        fraction_mul(score_weight, score_fraction)?,
    )?;
    let share = mul_div(pool, fraction, SCORE_BASE)?;

    // Operator keeps commission scaled by its score
    let cut = entry
        .commission
        .checked_mul(entry.score)
        .ok_or(RewardError::ArithmeticOverflow)?;
    let validator_payment = mul_div(share, cut, COMMISSION_BASE * SCORE_BASE)?;
    Ok(Payout::split(share, validator_payment))
}

/// Audit event emitted for every committed payment
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributionEvent {
    pub validator: Address,
    pub epoch: EpochId,
    pub validator_payment: u128,
    pub voters_payment: u128,
}

impl From<&DistributionRecord> for DistributionEvent {
    fn from(record: &DistributionRecord) -> Self {
        Self {
            validator: record.validator,
            epoch: record.epoch,
            validator_payment: record.validator_payment,
            voters_payment: record.voters_payment,
        }
    }
}

/// Distributor state: curve, policy, ledger and audit log
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct EpochRewardDistributor {
    curve: RewardCurve,
    policy: EligibilityPolicy,
    ledger: DistributionLedger,
    events: Vec<DistributionEvent>,
}

impl EpochRewardDistributor {
    pub fn new(curve: RewardCurve, policy: EligibilityPolicy) -> Self {
        Self {
            curve,
            policy,
            ledger: DistributionLedger::new(),
            events: Vec::new(),
        }
    }

    pub fn curve(&self) -> RewardCurve {
        self.curve
    }

    pub fn policy(&self) -> EligibilityPolicy {
        self.policy
    }

    /// Pay `validator` its share of `pool` for the snapshot's epoch.
    ///
    /// Score, commission and the pledge multiplier come from the snapshot.
    /// Eligibility is checked against the live registry status.
    ///
    /// `denominator` must be the same for every call in the epoch; the
    /// distributor does not compare it across calls.
    pub fn distribute(
        &mut self,
        snapshot: &EpochSnapshot,
        registry: &ValidatorRegistry,
        validator: &Address,
        pool: u128,
        denominator: u128,
        sink: &mut dyn RewardSink,
    ) -> Result<DistributionRecord> {
        let result = self.try_distribute(snapshot, registry, validator, pool, denominator, sink);
        if let Err(e) = &result {
            tracing::warn!(
                validator = %validator,
                epoch = %snapshot.epoch(),
                code = e.code(),
                error = %e,
                "Distribution rejected"
            );
        }
        result
    }

    fn try_distribute(
        &mut self,
        snapshot: &EpochSnapshot,
        registry: &ValidatorRegistry,
        validator: &Address,
        pool: u128,
        denominator: u128,
        sink: &mut dyn RewardSink,
    ) -> Result<DistributionRecord> {
        let epoch = snapshot.epoch();

        let entry = snapshot
            .get(validator)
            .ok_or_else(|| RewardError::ValidatorNotEligible {
                validator: *validator,
                reason: format!("not in the snapshot for epoch {}", epoch),
            })?;
        // Membership is frozen at open; lifecycle status is read live
        let status = registry.status(validator);
        if !self.policy.admits(status) {
            return Err(RewardError::ValidatorNotEligible {
                validator: *validator,
                reason: format!("{} validators are not paid", status),
            });
        }
        if denominator == 0 {
            return Err(RewardError::InvalidDenominator(denominator));
        }
        if self.ledger.contains(validator, epoch) {
            return Err(RewardError::AlreadyDistributed {
                validator: *validator,
                epoch,
            });
        }

        let payout = self.curve.payout(snapshot, entry, pool, denominator)?;
        sink.credit(validator, payout.validator_payment, payout.voters_payment)?;

        let record = DistributionRecord {
            validator: *validator,
            epoch,
            validator_payment: payout.validator_payment,
            voters_payment: payout.voters_payment,
        };
        self.ledger.append(record)?;

        let event = DistributionEvent::from(&record);
        tracing::info!(
            target: DISTRIBUTION_TARGET,
            validator = %event.validator,
            epoch = %event.epoch,
            validator_payment = event.validator_payment,
            voters_payment = event.voters_payment,
            "ValidatorAndVotersEpochPaymentDistributed"
        );
        self.events.push(event);

        Ok(record)
    }

    pub fn ledger(&self) -> &DistributionLedger {
        &self.ledger
    }

    /// Audit events in commit order
    pub fn events(&self) -> &[DistributionEvent] {
        &self.events
    }

    /// Take the audit events, leaving the log empty
    pub fn drain_events(&mut self) -> Vec<DistributionEvent> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::balances::RewardBalances;
    use crate::config::RegistrationConfig;
    use crate::keys::{FormatKeyVerifier, KeyMaterial};
    use crate::registry::ValidatorRegistry;
    use crate::stake::StakeProof;

    const UPDATER: Address = Address::new([0xaa; 20]);
    const POOL: u128 = 1_666_666_666_666_666_666_675_000;

    fn setup(scores: &[u128]) -> (ValidatorRegistry, Vec<Address>) {
        let requirements = RegistrationConfig {
            min_locked_value: 1,
            min_lock_duration_secs: 0,
            ..RegistrationConfig::default()
        };
        let mut registry = ValidatorRegistry::new(requirements, UPDATER);
        let mut addrs = Vec::new();
        for (i, score) in scores.iter().enumerate() {
            let seed = i as u8 + 1;
            let keys = KeyMaterial {
                bls_public_key: vec![seed; 128],
                bls_g1_public_key: vec![seed; 64],
                bls_proof_of_possession: vec![seed; 64],
                ecdsa_public_key: vec![seed; 64],
            };
            let addr = keys.derive_address();
            registry
                .register(addr, 100_000, keys, &FormatKeyVerifier, StakeProof::new(1, 0), 0)
                .unwrap();
            registry.set_score(&UPDATER, &addr, *score).unwrap();
            addrs.push(addr);
        }
        (registry, addrs)
    }

    fn snapshot(registry: &ValidatorRegistry, pledge: u128) -> EpochSnapshot {
        EpochSnapshot::capture(
            EpochId(1),
            registry,
            pledge,
            EligibilityPolicy::RegisteredOrElected,
            &[],
        )
        .unwrap()
    }

    #[test]
    fn test_equal_validators() {
        let (registry, addrs) = setup(&[SCORE_BASE; 4]);
        let snapshot = snapshot(&registry, SCORE_BASE);
        let mut distributor = EpochRewardDistributor::default();
        let mut balances = RewardBalances::new();

        let record = distributor
            .distribute(&snapshot, &registry, &addrs[0], POOL, snapshot.denominator(), &mut balances)
            .unwrap();

        assert_eq!(record.validator_payment, 41_666_666_666_666_666_666_875);
        assert_eq!(record.voters_payment, 375_000_000_000_000_000_001_875);
        assert_eq!(balances.validator_reward(&addrs[0]), record.validator_payment);
        assert_eq!(balances.voter_pool(&addrs[0]), record.voters_payment);
        assert_eq!(distributor.events().len(), 1);
    }

    #[test]
    fn test_zero_denominator_rejected() {
        let (registry, addrs) = setup(&[SCORE_BASE]);
        let snapshot = snapshot(&registry, SCORE_BASE);
        let mut distributor = EpochRewardDistributor::default();
        let mut balances = RewardBalances::new();

        let result = distributor.distribute(&snapshot, &registry, &addrs[0], POOL, 0, &mut balances);
        assert_eq!(result, Err(RewardError::InvalidDenominator(0)));
        assert!(distributor.ledger().is_empty());
        assert_eq!(balances.total().unwrap(), 0);
    }

    #[test]
    fn test_second_payment_rejected() {
        let (registry, addrs) = setup(&[SCORE_BASE]);
        let snapshot = snapshot(&registry, SCORE_BASE);
        let mut distributor = EpochRewardDistributor::default();
        let mut balances = RewardBalances::new();

        distributor
            .distribute(&snapshot, &registry, &addrs[0], POOL, snapshot.denominator(), &mut balances)
            .unwrap();
        let before = balances.total().unwrap();

        let result =
            distributor.distribute(&snapshot, &registry, &addrs[0], POOL, snapshot.denominator(), &mut balances);
        assert!(matches!(result, Err(RewardError::AlreadyDistributed { .. })));
        assert_eq!(balances.total().unwrap(), before);
        assert_eq!(distributor.ledger().len(), 1);
        assert_eq!(distributor.events().len(), 1);
    }

    #[test]
    fn test_outsider_not_eligible() {
        let (registry, _) = setup(&[SCORE_BASE]);
        let snapshot = snapshot(&registry, SCORE_BASE);
        let mut distributor = EpochRewardDistributor::default();
        let mut balances = RewardBalances::new();

        let result = distributor.distribute(
            &snapshot,
            &registry,
            &Address::new([9; 20]),
            POOL,
            snapshot.denominator(),
            &mut balances,
        );
        assert!(matches!(result, Err(RewardError::ValidatorNotEligible { .. })));
    }

    #[test]
    fn test_zero_score_gets_floor_share() {
        let (registry, addrs) = setup(&[0, SCORE_BASE]);
        let snapshot = snapshot(&registry, SCORE_BASE);
        let mut distributor = EpochRewardDistributor::default();
        let mut balances = RewardBalances::new();

        let record = distributor
            .distribute(&snapshot, &registry, &addrs[0], 3_000, snapshot.denominator(), &mut balances)
            .unwrap();
        assert_eq!(record.total().unwrap(), 1_000);
    }

    #[test]
    fn test_stake_blended_needs_score_sum() {
        let (registry, addrs) = setup(&[0, 0]);
        let snapshot = snapshot(&registry, SCORE_BASE / 2);
        let mut distributor =
            EpochRewardDistributor::new(RewardCurve::StakeBlended, EligibilityPolicy::default());
        let mut balances = RewardBalances::new();

        let result = distributor.distribute(
            &snapshot,
            &registry,
            &addrs[0],
            POOL,
            snapshot.denominator(),
            &mut balances,
        );
        assert!(matches!(result, Err(RewardError::InvalidDenominator(_))));
        assert_eq!(balances.total().unwrap(), 0);
    }

    #[test]
    fn test_drain_events() {
        let (registry, addrs) = setup(&[SCORE_BASE, SCORE_BASE]);
        let snapshot = snapshot(&registry, SCORE_BASE);
        let mut distributor = EpochRewardDistributor::default();
        let mut balances = RewardBalances::new();

        for addr in &addrs {
            distributor
                .distribute(&snapshot, &registry, addr, POOL, snapshot.denominator(), &mut balances)
                .unwrap();
        }

        let events = distributor.drain_events();
        assert_eq!(events.len(), 2);
        assert!(distributor.events().is_empty());
        assert_eq!(distributor.ledger().len(), 2);
    }

    #[test]
    fn test_removed_after_snapshot_not_paid() {
        let (mut registry, addrs) = setup(&[SCORE_BASE, SCORE_BASE]);
        let snapshot = snapshot(&registry, SCORE_BASE);
        assert_eq!(registry.deregister(&addrs[0], 0).unwrap(), ValidatorStatus::Removed);

        let mut distributor = EpochRewardDistributor::default();
        let mut balances = RewardBalances::new();
        let result = distributor.distribute(
            &snapshot,
            &registry,
            &addrs[0],
            POOL,
            snapshot.denominator(),
            &mut balances,
        );

        assert!(matches!(result, Err(RewardError::ValidatorNotEligible { .. })));
        assert!(distributor.ledger().is_empty());
        assert!(distributor.events().is_empty());
        assert_eq!(balances.total().unwrap(), 0);
    }

    #[test]
    fn test_policy_admits() {
        assert!(EligibilityPolicy::RegisteredOrElected.admits(ValidatorStatus::Registered));
        assert!(!EligibilityPolicy::ElectedOnly.admits(ValidatorStatus::Registered));
        assert!(EligibilityPolicy::ElectedOnly.admits(ValidatorStatus::Elected));
        assert!(!EligibilityPolicy::RegisteredOrElected.admits(ValidatorStatus::Deregistering));
    }
}
