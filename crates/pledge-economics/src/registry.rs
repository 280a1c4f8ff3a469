//! # Validator Registry
//!
//! Per-validator state: identity, commission, score and lifecycle status.
//!
//! ## Lifecycle
//!
//! ```text
//!   Unregistered ──register──► Registered ◄──────► Elected
//!                                  │   update_elected_set
//!                             deregister
//!                                  │
//!                   cool-down? ────┴──── elapsed ───► Removed
//!                       │                               ▲
//!                       ▼                               │
//!                 Deregistering ──── process_exits ─────┘
//! ```
//!
//! Scores are written only by the updater role. Commission changes are
//! queued and take effect `commission_update_delay_epochs` later.

use pledge_core::{Address, EpochId, Result, RewardError, COMMISSION_BASE, SCORE_BASE};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::config::RegistrationConfig;
use crate::keys::{KeyMaterial, KeyVerifier};
use crate::stake::StakeProof;

/// Validator lifecycle status
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValidatorStatus {
    /// No registry entry
    Unregistered,
    /// Registered, not in the elected set
    Registered,
    /// Member of the current elected set
    Elected,
    /// Exit requested, waiting out the cool-down
    Deregistering,
    /// Exited; identity kept for audit
    Removed,
}

impl ValidatorStatus {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Unregistered => "unregistered",
            Self::Registered => "registered",
            Self::Elected => "elected",
            Self::Deregistering => "deregistering",
            Self::Removed => "removed",
        }
    }

    /// Still takes part in scoring and election
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Registered | Self::Elected)
    }
}

impl fmt::Display for ValidatorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A queued commission change
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingCommission {
    pub commission: u128,
    pub effective_at: EpochId,
}

/// Registry entry for one validator
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Validator {
    pub address: Address,
    pub keys: KeyMaterial,

    /// Current commission (base `COMMISSION_BASE`)
    pub commission: u128,

    /// Performance score (base `SCORE_BASE`)
    pub score: u128,

    pub status: ValidatorStatus,
    pub pending_commission: Option<PendingCommission>,

    /// Unix seconds
    pub registered_at: u64,
    pub left_elected_at: Option<u64>,
    pub exit_requested_at: Option<u64>,
}

impl Validator {
    /// Commission in force during `epoch`
    pub fn commission_at(&self, epoch: EpochId) -> u128 {
        match self.pending_commission {
            Some(pending) if pending.effective_at <= epoch => pending.commission,
            _ => self.commission,
        }
    }

    fn purge(&mut self) {
        self.score = 0;
        self.commission = 0;
        self.pending_commission = None;
        self.status = ValidatorStatus::Removed;
    }
}

/// Read-only view returned by [`ValidatorRegistry::view`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorView {
    pub status: ValidatorStatus,
    pub commission: u128,
    pub score: u128,
    pub pending_commission: Option<PendingCommission>,
}

/// Validator registry
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ValidatorRegistry {
    validators: BTreeMap<Address, Validator>,
    requirements: RegistrationConfig,
    updater: Address,
}

impl ValidatorRegistry {
    pub fn new(requirements: RegistrationConfig, updater: Address) -> Self {
        Self {
            validators: BTreeMap::new(),
            requirements,
            updater,
        }
    }

    /// Register a validator backed by a verified stake proof
    pub fn register(
        &mut self,
        validator: Address,
        commission: u128,
        keys: KeyMaterial,
        verifier: &dyn KeyVerifier,
        stake: StakeProof,
        now: u64,
    ) -> Result<&Validator> {
        if self.validators.contains_key(&validator) {
            return Err(RewardError::AlreadyRegistered(validator));
        }
        check_commission(commission)?;
        verifier.verify(&validator, &keys)?;
        stake.meets(&self.requirements, now)?;

        tracing::info!(
            validator = %validator,
            commission,
            locked = stake.locked_amount,
            "Registered validator"
        );

        let entry = Validator {
            address: validator,
            keys,
            commission,
            score: 0,
            status: ValidatorStatus::Registered,
            pending_commission: None,
            registered_at: now,
            left_elected_at: None,
            exit_requested_at: None,
        };
        Ok(self.validators.entry(validator).or_insert(entry))
    }

    /// Write a validator's score (updater role only)
    pub fn set_score(&mut self, caller: &Address, validator: &Address, score: u128) -> Result<()> {
        if *caller != self.updater {
            return Err(RewardError::Unauthorized {
                caller: *caller,
                role: "updater",
            });
        }
        if score > SCORE_BASE {
            return Err(RewardError::ScoreOutOfRange {
                score,
                max: SCORE_BASE,
            });
        }
        let entry = self.live_mut(validator)?;
        entry.score = score;

        tracing::debug!(validator = %validator, score, "Updated validator score");
        Ok(())
    }

    /// Queue a commission change for a registered or elected validator;
    /// returns the epoch it takes effect
    pub fn set_commission(
        &mut self,
        validator: &Address,
        commission: u128,
        current_epoch: EpochId,
    ) -> Result<EpochId> {
        check_commission(commission)?;
        let effective_at = current_epoch.after(self.requirements.commission_update_delay_epochs);
        let entry = self.live_mut(validator)?;
        if !entry.status.is_active() {
            return Err(RewardError::ValidatorNotEligible {
                validator: *validator,
                reason: format!("cannot change commission of a {} validator", entry.status),
            });
        }
        entry.pending_commission = Some(PendingCommission {
            commission,
            effective_at,
        });

        tracing::debug!(
            validator = %validator,
            commission,
            effective_at = %effective_at,
            "Queued commission change"
        );
        Ok(effective_at)
    }

    /// Replace the elected set. Every member must be registered; former
    /// members not in `members` drop back to `Registered`.
    pub fn update_elected_set(&mut self, members: &[Address], now: u64) -> Result<()> {
        for member in members {
            let entry = self
                .validators
                .get(member)
                .ok_or(RewardError::ValidatorNotFound(*member))?;
            if !entry.status.is_active() {
                return Err(RewardError::ValidatorNotEligible {
                    validator: *member,
                    reason: format!("cannot elect a {} validator", entry.status),
                });
            }
        }

        for (address, entry) in self.validators.iter_mut() {
            let elected = members.contains(address);
            match (entry.status, elected) {
                (ValidatorStatus::Registered, true) => entry.status = ValidatorStatus::Elected,
                (ValidatorStatus::Elected, false) => {
                    entry.status = ValidatorStatus::Registered;
                    entry.left_elected_at = Some(now);
                }
                _ => {}
            }
        }

        tracing::info!(size = members.len(), "Updated elected set");
        Ok(())
    }

    /// Start or finish an exit. Returns `Deregistering` while the cool-down
    /// since leaving the elected set is still running, `Removed` once done.
    pub fn deregister(&mut self, validator: &Address, now: u64) -> Result<ValidatorStatus> {
        let cooldown = self.requirements.slashing_multiplier_reset_period_secs;
        let entry = self
            .validators
            .get_mut(validator)
            .ok_or(RewardError::ValidatorNotFound(*validator))?;

        match entry.status {
            ValidatorStatus::Elected => Err(RewardError::StillElected(*validator)),
            ValidatorStatus::Removed | ValidatorStatus::Unregistered => {
                Err(RewardError::ValidatorNotFound(*validator))
            }
            ValidatorStatus::Registered | ValidatorStatus::Deregistering => {
                if cooldown_elapsed(entry, cooldown, now) {
                    entry.purge();
                    tracing::info!(validator = %validator, "Removed validator");
                } else {
                    entry.status = ValidatorStatus::Deregistering;
                    entry.exit_requested_at.get_or_insert(now);
                    tracing::info!(validator = %validator, "Validator exit waiting on cool-down");
                }
                Ok(entry.status)
            }
        }
    }

    /// Finish every exit whose cool-down has elapsed
    pub fn process_exits(&mut self, now: u64) -> Vec<Address> {
        let cooldown = self.requirements.slashing_multiplier_reset_period_secs;
        let mut removed = Vec::new();
        for (address, entry) in self.validators.iter_mut() {
            if entry.status == ValidatorStatus::Deregistering
                && cooldown_elapsed(entry, cooldown, now)
            {
                entry.purge();
                removed.push(*address);
            }
        }
        if !removed.is_empty() {
            tracing::info!(count = removed.len(), "Completed validator exits");
        }
        removed
    }

    /// Promote commission changes due at `epoch`
    pub fn advance_epoch(&mut self, epoch: EpochId) {
        for entry in self.validators.values_mut() {
            if let Some(pending) = entry.pending_commission {
                if pending.effective_at <= epoch {
                    entry.commission = pending.commission;
                    entry.pending_commission = None;
                }
            }
        }
    }

    pub fn get(&self, validator: &Address) -> Option<&Validator> {
        self.validators.get(validator)
    }

    /// Lifecycle status; `Unregistered` when unknown
    pub fn status(&self, validator: &Address) -> ValidatorStatus {
        self.validators
            .get(validator)
            .map(|v| v.status)
            .unwrap_or(ValidatorStatus::Unregistered)
    }

    /// Status, commission and score of a validator
    pub fn view(&self, validator: &Address) -> Result<ValidatorView> {
        let entry = self
            .validators
            .get(validator)
            .ok_or(RewardError::ValidatorNotFound(*validator))?;
        Ok(ValidatorView {
            status: entry.status,
            commission: entry.commission,
            score: entry.score,
            pending_commission: entry.pending_commission,
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &Validator> {
        self.validators.values()
    }

    pub fn len(&self) -> usize {
        self.validators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }

    fn live_mut(&mut self, validator: &Address) -> Result<&mut Validator> {
        match self.validators.get_mut(validator) {
            Some(entry) if entry.status != ValidatorStatus::Removed => Ok(entry),
            _ => Err(RewardError::ValidatorNotFound(*validator)),
        }
    }
}

fn check_commission(commission: u128) -> Result<()> {
    if commission > COMMISSION_BASE {
        return Err(RewardError::CommissionOutOfRange {
            commission,
            max: COMMISSION_BASE,
        });
    }
    Ok(())
}

fn cooldown_elapsed(entry: &Validator, cooldown: u64, now: u64) -> bool {
    entry
        .left_elected_at
        .map_or(true, |left| now >= left.saturating_add(cooldown))
}
