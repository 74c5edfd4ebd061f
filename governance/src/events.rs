//! Resolution events emitted by the end-block step.
//!
//! One event per resolved proposal, in resolution order. Events are not
//! persisted; downstream indexers consume them as emitted.

use agora_types::ProposalId;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const TAG_PROPOSAL_ID: &str = "proposal-id";
pub const TAG_PROPOSAL_RESULT: &str = "proposal-result";
pub const TAG_PROPOSAL_ERROR: &str = "proposal-error";

/// Outcome reported for a resolved proposal.
///
/// `Passed`/`Failed` describe the execution of a proposal whose vote passed;
/// the stored status of such a proposal is `Passed` in both cases.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProposalResult {
    /// Deposit deadline reached without the minimum deposit.
    Dropped,
    Passed,
    Failed,
    Rejected,
}

impl ProposalResult {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dropped => "Dropped",
            Self::Passed => "Passed",
            Self::Failed => "Failed",
            Self::Rejected => "Rejected",
        }
    }
}

impl fmt::Display for ProposalResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionEvent {
    pub proposal_id: ProposalId,
    pub result: ProposalResult,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ResolutionEvent {
    pub fn new(proposal_id: ProposalId, result: ProposalResult) -> Self {
        Self {
            proposal_id,
            result,
            error: None,
        }
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    /// Ordered key/value tags: id, result, then the error when present.
    pub fn tags(&self) -> Vec<(&'static str, String)> {
        let mut tags = vec![
            (TAG_PROPOSAL_ID, self.proposal_id.to_string()),
            (TAG_PROPOSAL_RESULT, self.result.as_str().to_string()),
        ];
        if let Some(error) = &self.error {
            tags.push((TAG_PROPOSAL_ERROR, error.clone()));
        }
        tags
    }
}

/// Flatten a block's events into one ordered tag list.
pub fn flatten_tags(events: &[ResolutionEvent]) -> Vec<(&'static str, String)> {
    events.iter().flat_map(ResolutionEvent::tags).collect()
}
