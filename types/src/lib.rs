//! Fundamental types for Agora governance.
//!
//! This crate defines the types shared across every other crate in the workspace:
//! addresses, amounts, timestamps, and the proposal/deposit/vote data model.

pub mod address;
pub mod amount;
pub mod error;
pub mod proposal;
pub mod tally;
pub mod time;

pub use address::AccountAddress;
pub use amount::Coins;
pub use error::AgoraError;
pub use proposal::{ParamChange, Proposal, ProposalContent, ProposalId, ProposalStatus};
pub use tally::{Deposit, TallyResult, Vote, VoteOption};
pub use time::Timestamp;
