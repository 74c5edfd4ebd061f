//! Governance proposals and their lifecycle.

use crate::address::AccountAddress;
use crate::amount::Coins;
use crate::error::AgoraError;
use crate::tally::TallyResult;
use crate::time::Timestamp;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum length of a proposal title, in characters.
pub const MAX_TITLE_LENGTH: usize = 140;
/// Maximum length of a proposal description, in characters.
pub const MAX_DESCRIPTION_LENGTH: usize = 5000;

/// Route handled by the text (signal-only) proposal handler.
pub const TEXT_ROUTE: &str = "gov";
/// Route handled by the parameter change handler.
pub const PARAMS_ROUTE: &str = "params";

/// Monotonically assigned proposal identifier.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ProposalId(u64);

impl ProposalId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }

    /// The id following this one, or `None` on overflow.
    pub fn next(&self) -> Option<Self> {
        self.0.checked_add(1).map(Self)
    }

    /// Big-endian encoding; byte order equals numeric order.
    pub fn to_be_bytes(&self) -> [u8; 8] {
        self.0.to_be_bytes()
    }

    pub fn from_be_bytes(bytes: [u8; 8]) -> Self {
        Self(u64::from_be_bytes(bytes))
    }
}

impl fmt::Display for ProposalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle status of a proposal.
///
/// `Passed`, `Rejected` and `Failed` are terminal. Only the resolution engine
/// moves a proposal out of `Active`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProposalStatus {
    /// Collecting deposits until the minimum is reached.
    DepositPeriod,
    /// Minimum deposit reached; votes are accepted until `voting_end_time`.
    Active,
    Passed,
    Rejected,
    Failed,
}

impl ProposalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DepositPeriod => "DepositPeriod",
            Self::Active => "Active",
            Self::Passed => "Passed",
            Self::Rejected => "Rejected",
            Self::Failed => "Failed",
        }
    }
}

impl fmt::Display for ProposalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single parameter assignment requested by a parameter change proposal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamChange {
    pub subspace: String,
    pub key: String,
    pub value: String,
}

/// What a proposal does if it passes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProposalContent {
    /// Signal-only proposal with no on-chain effect.
    Text { title: String, description: String },
    /// Assign new values to governable parameters.
    ParameterChange {
        title: String,
        description: String,
        changes: Vec<ParamChange>,
    },
}

impl ProposalContent {
    pub fn title(&self) -> &str {
        match self {
            Self::Text { title, .. } | Self::ParameterChange { title, .. } => title,
        }
    }

    pub fn description(&self) -> &str {
        match self {
            Self::Text { description, .. } | Self::ParameterChange { description, .. } => {
                description
            }
        }
    }

    /// Route key used to find the handler that applies this content.
    pub fn route(&self) -> &'static str {
        match self {
            Self::Text { .. } => TEXT_ROUTE,
            Self::ParameterChange { .. } => PARAMS_ROUTE,
        }
    }

    /// Stateless well-formedness checks, run at submission.
    pub fn validate_basic(&self) -> Result<(), AgoraError> {
        let title = self.title();
        if title.trim().is_empty() {
            return Err(AgoraError::InvalidContent("title cannot be blank".into()));
        }
        if title.chars().count() > MAX_TITLE_LENGTH {
            return Err(AgoraError::InvalidContent(format!(
                "title longer than {MAX_TITLE_LENGTH} characters"
            )));
        }
        if self.description().chars().count() > MAX_DESCRIPTION_LENGTH {
            return Err(AgoraError::InvalidContent(format!(
                "description longer than {MAX_DESCRIPTION_LENGTH} characters"
            )));
        }
        if let Self::ParameterChange { changes, .. } = self {
            if changes.is_empty() {
                return Err(AgoraError::InvalidContent(
                    "parameter change proposal has no changes".into(),
                ));
            }
            if changes
                .iter()
                .any(|c| c.subspace.is_empty() || c.key.is_empty())
            {
                return Err(AgoraError::InvalidContent(
                    "parameter change with empty subspace or key".into(),
                ));
            }
        }
        Ok(())
    }
}

/// A governance proposal as persisted by the proposal store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    pub id: ProposalId,
    pub content: ProposalContent,
    pub proposer: AccountAddress,
    pub status: ProposalStatus,
    /// Set exactly once, when the proposal is resolved.
    pub final_tally_result: Option<TallyResult>,
    pub submit_time: Timestamp,
    /// Deadline for reaching the minimum deposit.
    pub deposit_end_time: Timestamp,
    pub total_deposit: Coins,
    pub voting_start_time: Option<Timestamp>,
    /// Meaningful only once `status` has left `DepositPeriod`.
    pub voting_end_time: Timestamp,
}

impl Proposal {
    pub fn title(&self) -> &str {
        self.content.title()
    }

    pub fn route(&self) -> &'static str {
        self.content.route()
    }
}
