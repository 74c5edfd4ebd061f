//! LMDB implementation of ParamStore.
//!
//! Key: `subspace ++ 0x00 ++ key`. Value: the raw UTF-8 parameter value.

use heed::{Env, RoTxn, RwTxn};

use agora_store::{ParamStore, StoreError};
use agora_types::ParamChange;

use crate::environment::{Databases, LmdbEnvironment};
use crate::LmdbError;

pub struct LmdbParamStore {
    env: Env,
    dbs: Databases,
}

impl LmdbParamStore {
    pub(crate) fn new(environment: &LmdbEnvironment) -> Self {
        Self {
            env: environment.env().clone(),
            dbs: environment.databases(),
        }
    }
}

fn param_key(subspace: &str, key: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(subspace.len() + 1 + key.len());
    out.extend_from_slice(subspace.as_bytes());
    out.push(0);
    out.extend_from_slice(key.as_bytes());
    out
}

impl Databases {
    pub(crate) fn param(
        &self,
        txn: &RoTxn,
        subspace: &str,
        key: &str,
    ) -> Result<Option<String>, LmdbError> {
        match self.params.get(txn, &param_key(subspace, key))? {
            Some(bytes) => {
                let value = std::str::from_utf8(bytes)
                    .map_err(|_| LmdbError::Malformed(format!("{subspace}/{key}")))?;
                Ok(Some(value.to_string()))
            }
            None => Ok(None),
        }
    }

    pub(crate) fn put_param(
        &self,
        txn: &mut RwTxn,
        subspace: &str,
        key: &str,
        value: &str,
    ) -> Result<(), LmdbError> {
        self.params.put(txn, &param_key(subspace, key), value.as_bytes())?;
        Ok(())
    }

    /// Write every change into `txn`. The caller discards `txn` on error.
    pub(crate) fn put_params(
        &self,
        txn: &mut RwTxn,
        changes: &[ParamChange],
    ) -> Result<(), LmdbError> {
        for change in changes {
            self.put_param(txn, &change.subspace, &change.key, &change.value)?;
        }
        Ok(())
    }
}

impl ParamStore for LmdbParamStore {
    fn get_param(&self, subspace: &str, key: &str) -> Result<Option<String>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        Ok(self.dbs.param(&rtxn, subspace, key)?)
    }

    fn set_param(&self, subspace: &str, key: &str, value: &str) -> Result<(), StoreError> {
        self.set_params(&[ParamChange {
            subspace: subspace.to_string(),
            key: key.to_string(),
            value: value.to_string(),
        }])
    }

    fn set_params(&self, changes: &[ParamChange]) -> Result<(), StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        self.dbs.put_params(&mut wtxn, changes)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }
}
