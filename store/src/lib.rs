//! Abstract storage traits for Agora governance.
//!
//! Every storage backend (LMDB, in-memory for testing) implements these
//! traits. The governance engine depends only on the traits and receives a
//! store handle explicitly on every call.

pub mod deposit;
pub mod error;
pub mod params;
pub mod power;
pub mod proposal;
pub mod vote;

pub use deposit::DepositLedger;
pub use error::StoreError;
pub use params::ParamStore;
pub use power::VotingPowerSource;
pub use proposal::ProposalStore;
pub use vote::VoteStore;

/// Everything the governance engine reads and writes for proposals.
pub trait GovernanceStore: ProposalStore + DepositLedger + VoteStore {}

impl<T: ProposalStore + DepositLedger + VoteStore> GovernanceStore for T {}

/// Everything a block touches: proposal state plus the parameters that
/// passed proposals change.
pub trait BlockStore: GovernanceStore + ParamStore {
    fn as_params(&self) -> &dyn ParamStore;
}

impl<T: GovernanceStore + ParamStore> BlockStore for T {
    fn as_params(&self) -> &dyn ParamStore {
        self
    }
}

/// A backend whose writes can be grouped into one all-or-nothing unit.
pub trait Transactional {
    /// Run `f` against a staged view of the store. Its writes become visible
    /// only if `f` returns `Ok`; on `Err` every write made through the view
    /// is discarded.
    fn atomically<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&dyn BlockStore) -> Result<T, E>,
        E: From<StoreError>;
}
