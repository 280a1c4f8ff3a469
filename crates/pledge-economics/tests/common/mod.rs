//! Shared fixtures for the pledge-economics integration tests

#![allow(dead_code)]

use pledge_core::{Address, SCORE_BASE};
use pledge_economics::{EngineConfig, KeyMaterial, RewardCurve, RewardEngine, StakeProof};

pub const UPDATER: Address = Address::new([0xaa; 20]);
pub const GOVERNANCE: Address = Address::new([0xbb; 20]);

/// Epoch validator pool: 2.5e24 less the 1/3 community cut
pub const POOL: u128 = 1_666_666_666_666_666_666_675_000;

/// 10%
pub const COMMISSION: u128 = 100_000;

/// Registration time that satisfies the default 60-day lock
pub const REGISTERED_AT: u64 = 5_184_000;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("pledge=debug")
        .with_test_writer()
        .try_init();
}

pub fn keys(seed: u8) -> KeyMaterial {
    KeyMaterial {
        bls_public_key: vec![seed; 128],
        bls_g1_public_key: vec![seed; 64],
        bls_proof_of_possession: vec![seed; 64],
        ecdsa_public_key: vec![seed; 64],
    }
}

pub fn config(curve: RewardCurve) -> EngineConfig {
    let mut config = EngineConfig::default();
    config.roles.updater = UPDATER;
    config.roles.governance = GOVERNANCE;
    config.distribution.curve = curve;
    config
}

pub fn engine(curve: RewardCurve) -> RewardEngine {
    RewardEngine::new(config(curve)).unwrap()
}

/// Register one validator per score, all at `COMMISSION`, and write the scores
pub fn register_scored(engine: &mut RewardEngine, scores: &[u128]) -> Vec<Address> {
    scores
        .iter()
        .enumerate()
        .map(|(i, score)| {
            let material = keys(i as u8 + 1);
            let addr = material.derive_address();
            engine
                .register(
                    addr,
                    COMMISSION,
                    material,
                    StakeProof::new(SCORE_BASE, 0),
                    REGISTERED_AT,
                )
                .unwrap();
            engine.set_score(&UPDATER, &addr, *score).unwrap();
            addr
        })
        .collect()
}

/// `x / 10` of `SCORE_BASE`
pub fn tenths(x: u128) -> u128 {
    x * SCORE_BASE / 10
}
