//! Scenario files: a validator set plus a list of blocks, each carrying the
//! transactions to apply before the block's end-block step.
//!
//! ```toml
//! [[validators]]
//! address = "agr_val1"
//! power = 40
//!
//! [[governable]]
//! subspace = "staking"
//! keys = ["MaxValidators"]
//!
//! [[blocks]]
//! time = 1000
//!
//! [[blocks.submit]]
//! proposer = "agr_alice"
//! kind = "param_change"
//! title = "Raise validator cap"
//! deposit = 60
//! changes = [{ subspace = "staking", key = "MaxValidators", value = "150" }]
//!
//! [[blocks.vote]]
//! proposal = 1
//! voter = "agr_val1"
//! option = "yes"
//! ```

use std::path::Path;

use anyhow::{bail, Context};
use serde::Deserialize;

use agora_types::{
    AccountAddress, Coins, ParamChange, ProposalContent, ProposalId, Timestamp, VoteOption,
};

#[derive(Debug, Deserialize)]
struct RawScenario {
    #[serde(default)]
    validators: Vec<RawValidator>,
    #[serde(default)]
    total_power: Option<u64>,
    #[serde(default)]
    governable: Vec<Governable>,
    #[serde(default)]
    blocks: Vec<RawBlock>,
}

#[derive(Debug, Deserialize)]
struct RawValidator {
    address: String,
    power: u64,
}

/// Parameter keys the params handler may change.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct Governable {
    pub subspace: String,
    pub keys: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawBlock {
    time: u64,
    #[serde(default)]
    submit: Vec<RawSubmission>,
    #[serde(default)]
    deposit: Vec<RawDeposit>,
    #[serde(default)]
    vote: Vec<RawVote>,
}

#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
enum ContentKind {
    #[default]
    Text,
    ParamChange,
}

#[derive(Debug, Deserialize)]
struct RawSubmission {
    proposer: String,
    #[serde(default)]
    kind: ContentKind,
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    changes: Vec<ParamChange>,
    #[serde(default)]
    deposit: u64,
}

#[derive(Debug, Deserialize)]
struct RawDeposit {
    proposal: u64,
    depositor: String,
    amount: u64,
}

#[derive(Debug, Deserialize)]
struct RawVote {
    proposal: u64,
    voter: String,
    option: String,
}

/// A transaction included in a scenario block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Tx {
    Submit {
        proposer: AccountAddress,
        content: ProposalContent,
        deposit: Coins,
    },
    Deposit {
        proposal: ProposalId,
        depositor: AccountAddress,
        amount: Coins,
    },
    Vote {
        proposal: ProposalId,
        voter: AccountAddress,
        option: VoteOption,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Block {
    pub time: Timestamp,
    /// Submissions first, then deposits, then votes.
    pub txs: Vec<Tx>,
}

/// A parsed and validated scenario.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Scenario {
    pub validators: Vec<(AccountAddress, u128)>,
    pub total_power: Option<u128>,
    pub governable: Vec<Governable>,
    pub blocks: Vec<Block>,
}

impl Scenario {
    pub fn from_toml_file(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading scenario {}", path.display()))?;
        Self::from_toml_str(&contents).with_context(|| format!("in scenario {}", path.display()))
    }

    /// Parse a scenario, rejecting malformed addresses, unknown vote options
    /// and block times that go backwards.
    pub fn from_toml_str(s: &str) -> anyhow::Result<Self> {
        let raw: RawScenario = toml::from_str(s).context("parsing scenario TOML")?;

        let validators = raw
            .validators
            .into_iter()
            .map(|v| Ok((AccountAddress::parse(v.address)?, u128::from(v.power))))
            .collect::<anyhow::Result<Vec<_>>>()?;

        let mut blocks = Vec::with_capacity(raw.blocks.len());
        let mut last_time = Timestamp::EPOCH;
        for (height, block) in raw.blocks.into_iter().enumerate() {
            let time = Timestamp::new(block.time);
            if time < last_time {
                bail!("block {height} at {time} is earlier than the block before it ({last_time})");
            }
            last_time = time;
            blocks.push(Block {
                time,
                txs: block_txs(block).with_context(|| format!("in block {height}"))?,
            });
        }

        Ok(Self {
            validators,
            total_power: raw.total_power.map(u128::from),
            governable: raw.governable,
            blocks,
        })
    }
}

fn block_txs(block: RawBlock) -> anyhow::Result<Vec<Tx>> {
    let mut txs = Vec::new();
    for s in block.submit {
        let content = match s.kind {
            ContentKind::Text => ProposalContent::Text {
                title: s.title,
                description: s.description,
            },
            ContentKind::ParamChange => ProposalContent::ParameterChange {
                title: s.title,
                description: s.description,
                changes: s.changes,
            },
        };
        txs.push(Tx::Submit {
            proposer: AccountAddress::parse(s.proposer)?,
            content,
            deposit: Coins::new(u128::from(s.deposit)),
        });
    }
    for d in block.deposit {
        txs.push(Tx::Deposit {
            proposal: ProposalId::new(d.proposal),
            depositor: AccountAddress::parse(d.depositor)?,
            amount: Coins::new(u128::from(d.amount)),
        });
    }
    for v in block.vote {
        txs.push(Tx::Vote {
            proposal: ProposalId::new(v.proposal),
            voter: AccountAddress::parse(v.voter)?,
            option: v.option.parse()?,
        });
    }
    Ok(txs)
}
