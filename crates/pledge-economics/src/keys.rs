//! # Validator Key Material
//!
//! Keys a validator presents at registration. Cryptographic verification of
//! the BLS proof of possession belongs to the identity registry; this module
//! checks shape and resolves the account address from the ECDSA key.
//!
//! | Field | Length | Description |
//! |-------|--------|-------------|
//! | `bls_public_key` | 128 | BLS12-381 G2 public key |
//! | `bls_g1_public_key` | 64 | BLS G1 public key |
//! | `bls_proof_of_possession` | 64 | Signature over the account address |
//! | `ecdsa_public_key` | 64 | Uncompressed secp256k1 key without the `0x04` prefix |

use pledge_core::{Address, Result, RewardError};
use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};

pub const BLS_PUBLIC_KEY_LEN: usize = 128;
pub const BLS_G1_PUBLIC_KEY_LEN: usize = 64;
pub const BLS_PROOF_LEN: usize = 64;
pub const ECDSA_PUBLIC_KEY_LEN: usize = 64;

/// Key material submitted with a registration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyMaterial {
    pub bls_public_key: Vec<u8>,
    pub bls_g1_public_key: Vec<u8>,
    pub bls_proof_of_possession: Vec<u8>,
    pub ecdsa_public_key: Vec<u8>,
}

impl KeyMaterial {
    /// Account address controlled by the ECDSA key: last 20 bytes of Keccak-256
    pub fn derive_address(&self) -> Address {
        let mut digest = [0u8; 32];
        digest.copy_from_slice(&Keccak256::digest(&self.ecdsa_public_key));
        Address::from_digest(&digest)
    }

    /// Check every field has its exact length and is not all zero
    pub fn check_format(&self) -> Result<()> {
        check_field("bls_public_key", &self.bls_public_key, BLS_PUBLIC_KEY_LEN)?;
        check_field("bls_g1_public_key", &self.bls_g1_public_key, BLS_G1_PUBLIC_KEY_LEN)?;
        check_field(
            "bls_proof_of_possession",
            &self.bls_proof_of_possession,
            BLS_PROOF_LEN,
        )?;
        check_field("ecdsa_public_key", &self.ecdsa_public_key, ECDSA_PUBLIC_KEY_LEN)?;
        Ok(())
    }
}

fn check_field(name: &str, bytes: &[u8], expected: usize) -> Result<()> {
    if bytes.len() != expected {
        return Err(RewardError::InvalidKeyMaterial(format!(
            "{} must be {} bytes, got {}",
            name,
            expected,
            bytes.len()
        )));
    }
    if bytes.iter().all(|b| *b == 0) {
        return Err(RewardError::InvalidKeyMaterial(format!("{} is all zero", name)));
    }
    Ok(())
}

/// Identity-registry seam used at registration time
pub trait KeyVerifier: Send + Sync {
    fn verify(&self, validator: &Address, keys: &KeyMaterial) -> Result<()>;
}

/// Format and address-resolution checks only
#[derive(Clone, Copy, Debug, Default)]
pub struct FormatKeyVerifier;

impl KeyVerifier for FormatKeyVerifier {
    fn verify(&self, validator: &Address, keys: &KeyMaterial) -> Result<()> {
        keys.check_format()?;
        let derived = keys.derive_address();
        if derived != *validator {
            return Err(RewardError::InvalidKeyMaterial(format!(
                "ecdsa key resolves to {}, not {}",
                derived, validator
            )));
        }
        Ok(())
    }
}
