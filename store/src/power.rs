//! Voting power snapshot consumed by the tally.

use agora_types::AccountAddress;

/// Source of voting power at the time a proposal is tallied.
///
/// Implementations must answer from the current block's state only, so every
/// node sees the same numbers.
pub trait VotingPowerSource {
    /// Power currently held by `voter`; zero if it holds none.
    fn power_of(&self, voter: &AccountAddress) -> u128;

    /// Total eligible voting power.
    fn total_power(&self) -> u128;
}
