use proptest::prelude::*;

use agora_types::{Coins, ProposalId, TallyResult, Timestamp, VoteOption};

fn vote_option() -> impl Strategy<Value = VoteOption> {
    prop_oneof![
        Just(VoteOption::Yes),
        Just(VoteOption::Abstain),
        Just(VoteOption::No),
        Just(VoteOption::NoWithVeto),
    ]
}

proptest! {
    /// Queue keys are `deadline_be ++ id_be`; byte order must equal tuple order.
    #[test]
    fn queue_key_bytes_sort_like_tuples(
        t1 in any::<u64>(), id1 in any::<u64>(),
        t2 in any::<u64>(), id2 in any::<u64>(),
    ) {
        let key = |t: u64, id: u64| {
            let mut k = Timestamp::new(t).to_be_bytes().to_vec();
            k.extend_from_slice(&ProposalId::new(id).to_be_bytes());
            k
        };
        prop_assert_eq!(key(t1, id1).cmp(&key(t2, id2)), (t1, id1).cmp(&(t2, id2)));
    }

    /// Timestamp ordering: new(a) <= new(b) iff a <= b.
    #[test]
    fn timestamp_ordering(a in any::<u64>(), b in any::<u64>()) {
        prop_assert_eq!(Timestamp::new(a) <= Timestamp::new(b), a <= b);
        prop_assert_eq!(Timestamp::new(a).has_passed(Timestamp::new(b)), a <= b);
    }

    /// checked_add agrees with u128 checked arithmetic.
    #[test]
    fn coins_checked_add(a in any::<u128>(), b in any::<u128>()) {
        let sum = Coins::new(a).checked_add(Coins::new(b)).map(|c| c.raw());
        prop_assert_eq!(sum, a.checked_add(b));
    }

    /// The tally total equals the sum of every vote's power.
    #[test]
    fn tally_total_is_sum_of_votes(votes in prop::collection::vec((vote_option(), 0u64..1_000_000), 0..64)) {
        let mut tally = TallyResult::empty();
        let mut expected: u128 = 0;
        for (option, power) in &votes {
            tally.add(*option, *power as u128);
            expected += *power as u128;
        }
        prop_assert_eq!(tally.total(), expected);
    }
}
