use proptest::prelude::*;

use agora_governance::{TallyCalculator, TallyParams, ThresholdTally, WeightedVote};
use agora_types::VoteOption;

fn params() -> impl Strategy<Value = TallyParams> {
    (0u32..=10_000, 0u32..=10_000, 0u32..=10_000).prop_map(|(q, t, v)| TallyParams {
        quorum_bps: q,
        threshold_bps: t,
        veto_threshold_bps: v,
    })
}

fn weighted(yes: u64, abstain: u64, no: u64, veto: u64) -> Vec<WeightedVote> {
    vec![
        WeightedVote { option: VoteOption::Yes, power: yes as u128 },
        WeightedVote { option: VoteOption::Abstain, power: abstain as u128 },
        WeightedVote { option: VoteOption::No, power: no as u128 },
        WeightedVote { option: VoteOption::NoWithVeto, power: veto as u128 },
    ]
}

proptest! {
    /// A pass always satisfies every rule checked with exact rational arithmetic.
    #[test]
    fn pass_implies_every_rule(
        yes in 0u64..1_000_000, abstain in 0u64..1_000_000,
        no in 0u64..1_000_000, veto in 0u64..1_000_000,
        extra in 0u64..1_000_000, p in params(),
    ) {
        let participating = (yes + abstain + no + veto) as u128;
        let total = participating + extra as u128;
        let (passed, result) = ThresholdTally.compute(&weighted(yes, abstain, no, veto), total, &p);
        prop_assert_eq!(result.total(), participating);
        if passed {
            prop_assert!(participating > 0);
            prop_assert!(participating * 10_000 >= p.quorum_bps as u128 * total);
            prop_assert!((veto as u128) * 10_000 < p.veto_threshold_bps as u128 * participating);
            prop_assert!((yes as u128) * 10_000 > p.threshold_bps as u128 * (yes + no) as u128);
        }
    }

    /// Nobody voting never passes, whatever the parameters.
    #[test]
    fn no_participation_never_passes(total in any::<u64>(), p in params()) {
        let (passed, _) = ThresholdTally.compute(&[], total as u128, &p);
        prop_assert!(!passed);
    }

    /// Converting a no vote into a yes vote never turns a pass into a fail.
    #[test]
    fn more_yes_never_hurts(
        yes in 0u64..1_000_000, abstain in 0u64..1_000_000,
        no in 1u64..1_000_000, veto in 0u64..1_000_000,
        extra in 0u64..1_000_000, p in params(),
    ) {
        let total = (yes + abstain + no + veto + extra) as u128;
        let (before, _) = ThresholdTally.compute(&weighted(yes, abstain, no, veto), total, &p);
        let (after, _) = ThresholdTally.compute(&weighted(yes + 1, abstain, no - 1, veto), total, &p);
        prop_assert!(!before || after);
    }

    /// The result does not depend on the order votes are listed in.
    #[test]
    fn order_independent(
        yes in 0u64..1_000_000, abstain in 0u64..1_000_000,
        no in 0u64..1_000_000, veto in 0u64..1_000_000, p in params(),
    ) {
        let votes = weighted(yes, abstain, no, veto);
        let mut reversed = votes.clone();
        reversed.reverse();
        let total = (yes + abstain + no + veto) as u128;
        prop_assert_eq!(
            ThresholdTally.compute(&votes, total, &p),
            ThresholdTally.compute(&reversed, total, &p)
        );
    }
}
