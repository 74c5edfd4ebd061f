//! LMDB storage backend for Agora governance.
//!
//! Implements the storage traits from `agora-store` using the `heed` LMDB
//! bindings. Each logical collection maps to one LMDB database within a
//! single environment; all keys are big-endian so LMDB's byte order is the
//! order the governance engine needs. A [`WriteBatch`] runs a whole block in
//! one write transaction.

pub mod environment;
pub mod error;
pub mod governance;
pub mod integrity;
pub mod keys;
pub mod params;
pub mod write_batch;

pub use environment::LmdbEnvironment;
pub use error::LmdbError;
pub use governance::LmdbGovernanceStore;
pub use integrity::{check_integrity, IntegrityReport};
pub use params::LmdbParamStore;
pub use write_batch::WriteBatch;
