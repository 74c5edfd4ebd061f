//! Vote tallying.
//!
//! The tally is a pure function of the weighted votes, the total eligible
//! power and the [`TallyParams`]. All comparisons are cross-multiplied integer
//! comparisons against basis points, so there is no division and no rounding.

use crate::params::{TallyParams, BPS_DENOMINATOR};
use agora_store::VotingPowerSource;
use agora_types::{TallyResult, Vote, VoteOption};

/// A vote paired with the voter's power at tally time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WeightedVote {
    pub option: VoteOption,
    pub power: u128,
}

/// Attach current voting power to each vote, preserving vote order.
pub fn weigh_votes(votes: &[Vote], power: &dyn VotingPowerSource) -> Vec<WeightedVote> {
    votes
        .iter()
        .map(|vote| WeightedVote {
            option: vote.option,
            power: power.power_of(&vote.voter),
        })
        .collect()
}

/// Pluggable pass/fail policy.
pub trait TallyCalculator {
    /// Decide whether a proposal passes. Must be deterministic and side-effect free.
    fn compute(
        &self,
        votes: &[WeightedVote],
        total_power: u128,
        params: &TallyParams,
    ) -> (bool, TallyResult);
}

/// Quorum / veto / threshold policy.
///
/// A proposal passes iff all of:
/// - some power participated and `participating >= quorum * total_power`
/// - `no_with_veto < veto_threshold * participating`
/// - `yes > threshold * (yes + no)`, with `yes + no > 0`
///
/// Ties fail.
#[derive(Clone, Copy, Debug, Default)]
pub struct ThresholdTally;

impl TallyCalculator for ThresholdTally {
    fn compute(
        &self,
        votes: &[WeightedVote],
        total_power: u128,
        params: &TallyParams,
    ) -> (bool, TallyResult) {
        let mut result = TallyResult::empty();
        for vote in votes {
            result.add(vote.option, vote.power);
        }
        (passes(&result, total_power, params), result)
    }
}

fn scaled(power: u128) -> Option<u128> {
    power.checked_mul(BPS_DENOMINATOR)
}

fn fraction_of(bps: u32, power: u128) -> Option<u128> {
    u128::from(bps).checked_mul(power)
}

/// Apply the pass rules to an accumulated tally.
///
/// A tally whose cross-multiplied terms do not fit in `u128` fails.
pub fn passes(result: &TallyResult, total_power: u128, params: &TallyParams) -> bool {
    check_rules(result, total_power, params).unwrap_or_else(|| {
        tracing::warn!(?result, total_power, "tally arithmetic overflowed; proposal fails");
        false
    })
}

/// `None` on overflow.
fn check_rules(result: &TallyResult, total_power: u128, params: &TallyParams) -> Option<bool> {
    let participating = result
        .yes
        .checked_add(result.abstain)?
        .checked_add(result.no)?
        .checked_add(result.no_with_veto)?;
    if total_power == 0 || participating == 0 {
        return Some(false);
    }
    if scaled(participating)? < fraction_of(params.quorum_bps, total_power)? {
        return Some(false);
    }
    if scaled(result.no_with_veto)? >= fraction_of(params.veto_threshold_bps, participating)? {
        return Some(false);
    }
    let decisive = result.yes.checked_add(result.no)?;
    if decisive == 0 {
        return Some(false);
    }
    Some(scaled(result.yes)? > fraction_of(params.threshold_bps, decisive)?)
}
