//! Governance parameters: deposit, voting and tally policy.
//!
//! Fractions are integer basis points (10_000 = 100%) so every node computes
//! identical results without floating point.

use agora_types::Coins;
use serde::{Deserialize, Serialize};

/// Denominator for basis-point fractions.
pub const BPS_DENOMINATOR: u128 = 10_000;

const DAY_SECS: u64 = 24 * 3600;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositParams {
    /// Total deposit required to enter the voting period, in raw units.
    #[serde(default = "default_min_deposit")]
    pub min_deposit: u64,
    /// How long a proposal may collect deposits before it is dropped.
    #[serde(default = "default_period_secs")]
    pub max_deposit_period_secs: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VotingParams {
    #[serde(default = "default_period_secs")]
    pub voting_period_secs: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TallyParams {
    /// Minimum share of total power that must participate.
    #[serde(default = "default_quorum_bps")]
    pub quorum_bps: u32,
    /// Share of yes over yes+no that must be strictly exceeded.
    #[serde(default = "default_threshold_bps")]
    pub threshold_bps: u32,
    /// Share of participating power voting veto at or above which the proposal fails.
    #[serde(default = "default_veto_threshold_bps")]
    pub veto_threshold_bps: u32,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GovernanceParams {
    #[serde(default)]
    pub deposit: DepositParams,
    #[serde(default)]
    pub voting: VotingParams,
    #[serde(default)]
    pub tally: TallyParams,
}

fn default_min_deposit() -> u64 {
    10
}

fn default_period_secs() -> u64 {
    2 * DAY_SECS
}

fn default_quorum_bps() -> u32 {
    3340
}

fn default_threshold_bps() -> u32 {
    5000
}

fn default_veto_threshold_bps() -> u32 {
    3340
}

impl Default for DepositParams {
    fn default() -> Self {
        Self {
            min_deposit: default_min_deposit(),
            max_deposit_period_secs: default_period_secs(),
        }
    }
}

impl Default for VotingParams {
    fn default() -> Self {
        Self {
            voting_period_secs: default_period_secs(),
        }
    }
}

impl Default for TallyParams {
    fn default() -> Self {
        Self {
            quorum_bps: default_quorum_bps(),
            threshold_bps: default_threshold_bps(),
            veto_threshold_bps: default_veto_threshold_bps(),
        }
    }
}

impl DepositParams {
    pub fn min_deposit(&self) -> Coins {
        Coins::new(self.min_deposit as u128)
    }
}

impl TallyParams {
    /// Fractions above 100% can never be met and indicate a misconfiguration.
    pub fn validate(&self) -> Result<(), String> {
        for (name, bps) in [
            ("quorum_bps", self.quorum_bps),
            ("threshold_bps", self.threshold_bps),
            ("veto_threshold_bps", self.veto_threshold_bps),
        ] {
            if bps as u128 > BPS_DENOMINATOR {
                return Err(format!("{name} = {bps} exceeds {BPS_DENOMINATOR}"));
            }
        }
        Ok(())
    }
}

impl GovernanceParams {
    pub fn validate(&self) -> Result<(), String> {
        if self.deposit.max_deposit_period_secs == 0 {
            return Err("max_deposit_period_secs must be non-zero".into());
        }
        if self.voting.voting_period_secs == 0 {
            return Err("voting_period_secs must be non-zero".into());
        }
        self.tally.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(GovernanceParams::default().validate().is_ok());
    }

    #[test]
    fn fraction_over_one_is_invalid() {
        let mut params = GovernanceParams::default();
        params.tally.veto_threshold_bps = 10_001;
        assert!(params.validate().is_err());
    }
}
