//! # Pledge Economics - Epoch Reward Distribution
//!
//! Apportions each epoch's validator reward pool across the eligible
//! validator set and splits every validator's share between its operator
//! (commission) and its voters.
//!
//! ## Key Features
//!
//! - **Score-weighted shares**: `floor(pool * (score + pledge) / denominator)`
//! - **Pledge multiplier**: governance floor term paid even at zero score
//! - **Frozen epochs**: scores, commissions and the multiplier are snapshotted at open
//! - **At-most-once payment**: one ledger record per `(validator, epoch)`
//!
//! ## Epoch Flow
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌───────────────┐   ┌──────────────┐
//! │   Registry   │──►│   Snapshot   │──►│  Distributor  │──►│    Ledger    │
//! │ scores, comm │   │  denominator │   │ share, split  │   │ + balances   │
//! └──────────────┘   └──────────────┘   └───────────────┘   └──────────────┘
//!         ▲                  ▲
//!   updater role      pledge multiplier (governance)
//! ```
//!
//! ## Defaults
//!
//! | Setting | Value |
//! |---------|-------|
//! | Minimum locked stake | 1,000,000 tokens |
//! | Minimum lock duration | 60 days |
//! | Exit cool-down | 30 days |
//! | Commission update delay | 1 epoch |
//! | Pledge multiplier | 1.0 |

pub mod balances;
pub mod config;
pub mod distributor;
pub mod engine;
pub mod keys;
pub mod ledger;
pub mod pledge;
pub mod registry;
pub mod snapshot;
pub mod stake;

// Re-exports
pub use balances::{RewardBalances, RewardSink};
pub use config::{ConfigError, EngineConfig, PledgeConfig, RegistrationConfig, RoleConfig};
pub use distributor::{
    DistributionEvent, EligibilityPolicy, EpochRewardDistributor, Payout, RewardCurve,
    DISTRIBUTION_TARGET,
};
pub use engine::{EpochSummary, RewardEngine, SharedRewardEngine};
pub use keys::{FormatKeyVerifier, KeyMaterial, KeyVerifier};
pub use ledger::{DistributionLedger, DistributionRecord};
pub use pledge::PledgeMultiplier;
pub use registry::{ValidatorRegistry, ValidatorStatus, ValidatorView};
pub use snapshot::{EpochSnapshot, SnapshotEntry};
pub use stake::StakeProof;
