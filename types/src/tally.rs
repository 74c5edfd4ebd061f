//! Vote records and tally snapshots.

use crate::address::AccountAddress;
use crate::amount::Coins;
use crate::error::AgoraError;
use crate::proposal::ProposalId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A voter's choice on a proposal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VoteOption {
    Yes,
    Abstain,
    No,
    NoWithVeto,
}

impl VoteOption {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Yes => "Yes",
            Self::Abstain => "Abstain",
            Self::No => "No",
            Self::NoWithVeto => "NoWithVeto",
        }
    }
}

impl fmt::Display for VoteOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VoteOption {
    type Err = AgoraError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "yes" => Ok(Self::Yes),
            "abstain" => Ok(Self::Abstain),
            "no" => Ok(Self::No),
            "no_with_veto" | "nowithveto" | "veto" => Ok(Self::NoWithVeto),
            _ => Err(AgoraError::InvalidVoteOption(s.to_string())),
        }
    }
}

/// A vote cast on an active proposal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    pub proposal_id: ProposalId,
    pub voter: AccountAddress,
    pub option: VoteOption,
}

/// An escrowed deposit, keyed by `(proposal_id, depositor)`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deposit {
    pub proposal_id: ProposalId,
    pub depositor: AccountAddress,
    pub amount: Coins,
}

/// Voting power per option at resolution time. Immutable once attached to a proposal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TallyResult {
    pub yes: u128,
    pub abstain: u128,
    pub no: u128,
    pub no_with_veto: u128,
}

impl TallyResult {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Add `power` to the bucket for `option`.
    pub fn add(&mut self, option: VoteOption, power: u128) {
        let bucket = match option {
            VoteOption::Yes => &mut self.yes,
            VoteOption::Abstain => &mut self.abstain,
            VoteOption::No => &mut self.no,
            VoteOption::NoWithVeto => &mut self.no_with_veto,
        };
        *bucket = bucket.saturating_add(power);
    }

    /// All participating power, abstain included.
    pub fn total(&self) -> u128 {
        self.yes
            .saturating_add(self.abstain)
            .saturating_add(self.no)
            .saturating_add(self.no_with_veto)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_accumulates_per_option() {
        let mut tally = TallyResult::empty();
        tally.add(VoteOption::Yes, 10);
        tally.add(VoteOption::Yes, 5);
        tally.add(VoteOption::NoWithVeto, 3);
        tally.add(VoteOption::Abstain, 2);
        assert_eq!(tally.yes, 15);
        assert_eq!(tally.no, 0);
        assert_eq!(tally.total(), 20);
    }

    #[test]
    fn vote_option_parses_case_insensitively() {
        assert_eq!("YES".parse::<VoteOption>().unwrap(), VoteOption::Yes);
        assert_eq!("no_with_veto".parse::<VoteOption>().unwrap(), VoteOption::NoWithVeto);
        assert!("maybe".parse::<VoteOption>().is_err());
    }
}
