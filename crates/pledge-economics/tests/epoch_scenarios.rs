//! Integration tests for epoch reward distribution
//!
//! Four validators with equal stake and 10% commission share one epoch pool
//! under different pledge multipliers and scores.

mod common;

use common::*;
use pledge_core::{Address, SCORE_BASE};
use pledge_economics::{DistributionRecord, RewardCurve, RewardEngine};

fn run_epoch(
    curve: RewardCurve,
    pledge: u128,
    scores: &[u128],
) -> (RewardEngine, Vec<DistributionRecord>) {
    init_tracing();
    let mut engine = engine(curve);
    let addrs = register_scored(&mut engine, scores);
    engine.update_elected_set(&addrs, REGISTERED_AT).unwrap();
    engine.set_pledge_multiplier(&GOVERNANCE, pledge).unwrap();

    let votes: Vec<(Address, u128)> = addrs.iter().map(|a| (*a, SCORE_BASE)).collect();
    engine.open_epoch(&votes).unwrap();
    let denominator = engine.snapshot().unwrap().denominator();

    let records = addrs
        .iter()
        .map(|addr| engine.distribute(addr, POOL, denominator).unwrap())
        .collect();
    (engine, records)
}

fn pairs(records: &[DistributionRecord]) -> Vec<(u128, u128)> {
    records
        .iter()
        .map(|r| (r.validator_payment, r.voters_payment))
        .collect()
}

fn descending_scores() -> Vec<u128> {
    vec![tenths(9), tenths(8), tenths(7), tenths(6)]
}

mod score_weighted {
    use super::*;

    #[test]
    fn test_equal_validators_split_pool_exactly() {
        let (mut engine, records) =
            run_epoch(RewardCurve::ScoreWeighted, SCORE_BASE, &[SCORE_BASE; 4]);

        for record in &records {
            assert_eq!(record.validator_payment, 41_666_666_666_666_666_666_875);
            assert_eq!(record.voters_payment, 375_000_000_000_000_000_001_875);
            assert_eq!(record.total().unwrap(), 416_666_666_666_666_666_668_750);
        }

        let summary = engine.close_epoch().unwrap();
        assert_eq!(summary.pool_distributed, POOL);
        assert_eq!(summary.dust, 0);
        assert_eq!(summary.validators_paid, 4);
    }

    #[test]
    fn test_higher_score_pays_more() {
        let (_, records) = run_epoch(RewardCurve::ScoreWeighted, tenths(7), &descending_scores());
        for pair in records.windows(2) {
            assert!(pair[0].total().unwrap() > pair[1].total().unwrap());
            assert!(pair[0].validator_payment > pair[1].validator_payment);
        }
    }

    #[test]
    fn test_lower_multiplier_widens_spread() {
        let spread = |pledge: u128| {
            let (_, records) = run_epoch(RewardCurve::ScoreWeighted, pledge, &descending_scores());
            records[0].total().unwrap() - records[3].total().unwrap()
        };

        let b = spread(tenths(7));
        let c = spread(tenths(6));
        assert!(c > b);
        assert_eq!(b, 86_206_896_551_724_137_931_465);
        assert_eq!(c, 92_592_592_592_592_592_593_055);
    }

    #[test]
    fn test_dust_bounded_by_validator_count() {
        let (mut engine, _) = run_epoch(RewardCurve::ScoreWeighted, tenths(7), &descending_scores());
        let summary = engine.close_epoch().unwrap();
        assert!(summary.pool_distributed <= POOL);
        assert!(summary.dust <= 4);
        assert_eq!(summary.pool_distributed + summary.dust, POOL);
    }
}

mod stake_blended {
    use super::*;

    #[test]
    fn test_equal_validators() {
        let (_, records) = run_epoch(RewardCurve::StakeBlended, SCORE_BASE, &[SCORE_BASE; 4]);
        for pair in pairs(&records) {
            assert_eq!(
                pair,
                (41_666_666_666_666_666_666_875, 375_000_000_000_000_000_001_875)
            );
        }
    }

    #[test]
    fn test_multiplier_seven_tenths() {
        let (_, records) = run_epoch(RewardCurve::StakeBlended, tenths(7), &descending_scores());
        assert_eq!(
            pairs(&records),
            vec![
                (39_750_000_000_000_000_000_198, 401_916_666_666_666_666_668_677),
                (33_999_999_999_973_333_333_503, 390_999_999_999_693_333_335_288),
                (28_583_333_333_321_666_666_809, 379_749_999_999_845_000_001_899),
                (23_500_000_000_000_000_000_117, 368_166_666_666_666_666_668_508),
            ]
        );
    }

    #[test]
    fn test_multiplier_six_tenths() {
        let (_, records) = run_epoch(RewardCurve::StakeBlended, tenths(6), &descending_scores());
        assert_eq!(
            pairs(&records),
            vec![
                (40_500_000_000_000_000_000_202, 409_500_000_000_000_000_002_048),
                (34_222_222_222_186_666_666_837, 393_555_555_555_146_666_668_635),
                (28_388_888_888_873_333_333_475, 377_166_666_666_460_000_001_886),
                (23_000_000_000_000_000_000_115, 360_333_333_333_333_333_335_135),
            ]
        );
    }

    #[test]
    fn test_pool_never_exceeded() {
        let (mut engine, _) = run_epoch(RewardCurve::StakeBlended, tenths(6), &descending_scores());
        let summary = engine.close_epoch().unwrap();
        assert!(summary.pool_distributed <= POOL);
        assert_eq!(engine.balances().total().unwrap(), summary.pool_distributed);
    }
}
