//! Engine configuration types
//!
//! Loaded from TOML. Amounts are `u128` and are written as strings because
//! TOML integers stop at `i64`:
//!
//! ```toml
//! [roles]
//! updater = "0x00000000000000000000000000000000000000aa"
//! governance = "0x00000000000000000000000000000000000000bb"
//!
//! [registration]
//! min_locked_value = "1000000000000000000000000"
//! min_lock_duration_secs = 5184000
//!
//! [pledge]
//! initial = "1000000000000000000000000"
//!
//! [distribution]
//! curve = "score_weighted"
//! eligibility = "registered_or_elected"
//! ```

use pledge_core::{Address, SCORE_BASE};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::distributor::{EligibilityPolicy, RewardCurve};

/// Serde adapter for u128 <-> TOML: serialize as string, accept string or integer.
mod u128_toml {
    use serde::de::{self, Visitor};
    use serde::{Deserializer, Serializer};
    use std::fmt;

    pub fn serialize<S: Serializer>(val: &u128, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&val.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<u128, D::Error> {
        struct U128Visitor;

        impl<'de> Visitor<'de> for U128Visitor {
            type Value = u128;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a u128 as a string or integer")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<u128, E> {
                v.replace('_', "").parse().map_err(E::custom)
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<u128, E> {
                Ok(v as u128)
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<u128, E> {
                u128::try_from(v).map_err(|_| E::custom("negative value for u128"))
            }
        }

        d.deserialize_any(U128Visitor)
    }
}

/// Serde adapter for addresses as `0x` hex strings.
mod address_hex {
    use pledge_core::Address;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(addr: &Address, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&addr.to_hex())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Address, D::Error> {
        let raw = String::deserialize(d)?;
        Address::from_hex(&raw).map_err(de::Error::custom)
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Complete engine configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Privileged role holders
    #[serde(default)]
    pub roles: RoleConfig,

    /// Registration and lifecycle requirements
    #[serde(default)]
    pub registration: RegistrationConfig,

    /// Pledge multiplier bounds
    #[serde(default)]
    pub pledge: PledgeConfig,

    /// Distribution policy
    #[serde(default)]
    pub distribution: DistributorConfig,
}

impl EngineConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Reject settings the engine cannot honour
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pledge.initial > self.pledge.maximum {
            return Err(ConfigError::Invalid(format!(
                "pledge.initial {} exceeds pledge.maximum {}",
                self.pledge.initial, self.pledge.maximum
            )));
        }
        if self.roles.updater == Address::ZERO || self.roles.governance == Address::ZERO {
            tracing::warn!("updater or governance role is the zero address");
        }
        Ok(())
    }
}

/// Role holders
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RoleConfig {
    /// May write validator scores
    #[serde(with = "address_hex", default)]
    pub updater: Address,

    /// May change the pledge multiplier
    #[serde(with = "address_hex", default)]
    pub governance: Address,
}

/// Registration and lifecycle requirements
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RegistrationConfig {
    /// Minimum locked stake to register
    #[serde(with = "u128_toml", default = "default_min_locked_value")]
    pub min_locked_value: u128,

    /// How long the stake must have been locked, in seconds
    #[serde(default = "default_min_lock_duration")]
    pub min_lock_duration_secs: u64,

    /// Cool-down after leaving the elected set before deregistration completes
    #[serde(default = "default_slashing_reset_period")]
    pub slashing_multiplier_reset_period_secs: u64,

    /// Epochs before a commission change takes effect
    #[serde(default = "default_commission_update_delay")]
    pub commission_update_delay_epochs: u64,
}

fn default_min_locked_value() -> u128 {
    1_000_000 * 1_000_000_000_000_000_000 // 1M tokens, 18 decimals
}

fn default_min_lock_duration() -> u64 {
    60 * 24 * 3600 // 60 days
}

fn default_slashing_reset_period() -> u64 {
    30 * 24 * 3600 // 30 days
}

fn default_commission_update_delay() -> u64 {
    1
}

impl Default for RegistrationConfig {
    fn default() -> Self {
        Self {
            min_locked_value: default_min_locked_value(),
            min_lock_duration_secs: default_min_lock_duration(),
            slashing_multiplier_reset_period_secs: default_slashing_reset_period(),
            commission_update_delay_epochs: default_commission_update_delay(),
        }
    }
}

/// Pledge multiplier bounds
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PledgeConfig {
    /// Value at genesis
    #[serde(with = "u128_toml", default = "default_pledge_initial")]
    pub initial: u128,

    /// Upper bound governance may set
    #[serde(with = "u128_toml", default = "default_pledge_maximum")]
    pub maximum: u128,
}

fn default_pledge_initial() -> u128 {
    SCORE_BASE
}

fn default_pledge_maximum() -> u128 {
    SCORE_BASE
}

impl Default for PledgeConfig {
    fn default() -> Self {
        Self {
            initial: default_pledge_initial(),
            maximum: default_pledge_maximum(),
        }
    }
}

/// Distribution policy
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct DistributorConfig {
    /// How a validator's share of the pool is computed
    #[serde(default)]
    pub curve: RewardCurve,

    /// Which lifecycle states may be paid
    #[serde(default)]
    pub eligibility: EligibilityPolicy,
}
