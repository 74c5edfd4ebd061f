//! Governance proposal resolution for Agora.
//!
//! At the end of every block the [`Resolver`] drains proposals whose deposit
//! deadline passed without reaching the minimum deposit, tallies proposals
//! whose voting period ended, settles their deposits, runs the effect of
//! passed proposals through the [`Router`], and returns an ordered list of
//! [`ResolutionEvent`]s.
//!
//! Resolution is deterministic: no wall clock, no hash-map iteration, no
//! floating point. Identical store contents and block time give identical
//! results on every node.

pub mod config;
pub mod error;
pub mod events;
pub mod handlers;
pub mod keeper;
pub mod params;
pub mod resolver;
pub mod router;
pub mod tally;

pub use config::{GovernanceConfig, LogConfig};
pub use error::{FinalizeError, GovernanceError, HandlerError, InvariantViolation};
pub use events::{ProposalResult, ResolutionEvent};
pub use handlers::{ParamChangeHandler, TextProposalHandler};
pub use keeper::Keeper;
pub use params::{DepositParams, GovernanceParams, TallyParams, VotingParams};
pub use resolver::Resolver;
pub use router::{Handler, Router};
pub use tally::{TallyCalculator, ThresholdTally, WeightedVote};
