//! Nullable infrastructure for deterministic testing.
//!
//! Every collaborator of the governance engine (block clock, proposal and
//! deposit storage, voting power, parameters) has an in-memory stand-in here
//! that:
//! - Returns deterministic values, iterating in key order
//! - Can be controlled programmatically
//! - Never touches the filesystem or network
//!
//! Usage: swap real implementations for nullables in tests.

pub mod clock;
pub mod power;
pub mod store;

pub use clock::{BlockHeader, NullChain};
pub use power::NullPowerSource;
pub use store::NullGovernanceStore;
