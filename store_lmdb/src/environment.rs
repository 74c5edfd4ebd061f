//! LMDB environment setup.

use std::path::Path;

use heed::types::Bytes;
use heed::{Database, Env, EnvOpenOptions};

use crate::governance::LmdbGovernanceStore;
use crate::params::LmdbParamStore;
use crate::write_batch::WriteBatch;
use crate::LmdbError;

/// Names of every database in an Agora LMDB environment.
pub const DATABASES: &[&str] = &[
    "proposals",
    "inactive_queue",
    "active_queue",
    "deposits",
    "votes",
    "balances",
    "meta",
    "params",
];

/// Default map size: 1 GiB.
pub const DEFAULT_MAP_SIZE: usize = 1 << 30;

/// Handles of every database, created once when the environment opens.
#[derive(Clone, Copy)]
pub(crate) struct Databases {
    pub proposals: Database<Bytes, Bytes>,
    pub inactive_queue: Database<Bytes, Bytes>,
    pub active_queue: Database<Bytes, Bytes>,
    pub deposits: Database<Bytes, Bytes>,
    pub votes: Database<Bytes, Bytes>,
    pub balances: Database<Bytes, Bytes>,
    pub meta: Database<Bytes, Bytes>,
    pub params: Database<Bytes, Bytes>,
}

/// Wraps the LMDB environment and hands out typed stores over it.
pub struct LmdbEnvironment {
    env: Env,
    dbs: Databases,
}

impl LmdbEnvironment {
    /// Open or create an LMDB environment at the given directory.
    pub fn open(path: &Path, map_size: usize) -> Result<Self, LmdbError> {
        std::fs::create_dir_all(path).map_err(|e| LmdbError::Io(e.to_string()))?;
        // SAFETY: the environment is opened once per process for this path and
        // the memory map is never modified outside of heed.
        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(map_size)
                .max_dbs(DATABASES.len() as u32)
                .open(path)?
        };
        let mut wtxn = env.write_txn()?;
        let mut create = |name: &str| env.create_database::<Bytes, Bytes>(&mut wtxn, Some(name));
        let dbs = Databases {
            proposals: create("proposals")?,
            inactive_queue: create("inactive_queue")?,
            active_queue: create("active_queue")?,
            deposits: create("deposits")?,
            votes: create("votes")?,
            balances: create("balances")?,
            meta: create("meta")?,
            params: create("params")?,
        };
        wtxn.commit()?;
        tracing::debug!(path = %path.display(), "opened LMDB environment");
        Ok(Self { env, dbs })
    }

    pub fn env(&self) -> &Env {
        &self.env
    }

    pub(crate) fn databases(&self) -> Databases {
        self.dbs
    }

    pub fn governance_store(&self) -> LmdbGovernanceStore {
        LmdbGovernanceStore::new(self)
    }

    pub fn param_store(&self) -> LmdbParamStore {
        LmdbParamStore::new(self)
    }

    /// Begin a batch that stages writes in one transaction until committed.
    pub fn write_batch(&self) -> Result<WriteBatch<'_>, LmdbError> {
        WriteBatch::new(self)
    }
}
