use agora_store::StoreError;
use agora_types::{AgoraError, ProposalId, ProposalStatus};
use thiserror::Error;

/// Errors returned by the transaction-level entry points and setup code.
#[derive(Debug, Error)]
pub enum GovernanceError {
    #[error("proposal {0} not found")]
    ProposalNotFound(ProposalId),

    #[error("proposal {id} is {status}, expected {expected}")]
    WrongStatus {
        id: ProposalId,
        status: ProposalStatus,
        expected: &'static str,
    },

    #[error("no handler registered for route {0:?}")]
    UnknownRoute(String),

    #[error("route {0:?} is already registered")]
    DuplicateRoute(String),

    #[error("route {0:?} is not a valid route name")]
    InvalidRoute(String),

    #[error("deposit amount must be non-zero")]
    ZeroDeposit,

    #[error("arithmetic overflow: {0}")]
    Overflow(&'static str),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Invalid(#[from] AgoraError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// A state inconsistency that prior processing should have made impossible.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    #[error("proposal {0} is queued but does not exist")]
    MissingProposal(ProposalId),

    #[error("handler for route {route:?} of proposal {proposal} does not exist")]
    MissingHandler { proposal: ProposalId, route: String },
}

/// Failure of the end-block step.
///
/// Every variant is non-recoverable: the block processor must abort the block
/// and must not commit any state written during the failed call.
#[derive(Debug, Error)]
pub enum FinalizeError {
    #[error("governance invariant violated: {0}")]
    Invariant(#[from] InvariantViolation),

    #[error("storage failure during finalization: {0}")]
    Store(#[from] StoreError),
}

/// Failure of a passed proposal's effect. Reported in the event stream; never
/// aborts the block.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HandlerError {
    #[error("unsupported content for route {route:?}")]
    UnsupportedContent { route: &'static str },

    #[error("unknown parameter {subspace}/{key}")]
    UnknownParam { subspace: String, key: String },

    #[error("parameter store rejected the changes: {0}")]
    Store(String),

    #[error("{0}")]
    Other(String),
}
