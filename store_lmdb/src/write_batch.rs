//! Write batching: every store operation of a block runs inside one LMDB
//! write transaction.
//!
//! ```ignore
//! let batch = env.write_batch()?;
//! resolver.end_block(&batch, &power, block_time)?;
//! batch.commit()?;
//! ```
//!
//! If the batch is dropped without calling [`WriteBatch::commit`], all
//! operations are rolled back (the underlying LMDB transaction is aborted).
//! Reads through the batch see its own uncommitted writes.

use std::cell::RefCell;

use heed::{Env, RoTxn, RwTxn};

use agora_store::{
    BlockStore, DepositLedger, ParamStore, ProposalStore, StoreError, Transactional, VoteStore,
};
use agora_types::{
    AccountAddress, Coins, Deposit, ParamChange, Proposal, ProposalId, Timestamp, Vote,
};

use crate::environment::{Databases, LmdbEnvironment};
use crate::governance::Queue;
use crate::LmdbError;

/// A block's worth of reads and writes sharing one LMDB write transaction.
///
/// The store traits take `&self`, so the transaction sits in a `RefCell`.
/// Only one write transaction can be open per environment: opening another
/// store handle's write while a batch is alive blocks.
pub struct WriteBatch<'a> {
    env: &'a Env,
    dbs: Databases,
    txn: RefCell<RwTxn<'a>>,
}

impl<'a> WriteBatch<'a> {
    pub(crate) fn new(environment: &'a LmdbEnvironment) -> Result<Self, LmdbError> {
        let env = environment.env();
        let txn = env.write_txn()?;
        Ok(Self {
            env,
            dbs: environment.databases(),
            txn: RefCell::new(txn),
        })
    }

    /// Commit every write made through this batch.
    pub fn commit(self) -> Result<(), LmdbError> {
        self.txn.into_inner().commit()?;
        Ok(())
    }

    fn read<T>(
        &self,
        f: impl FnOnce(&Databases, &RoTxn) -> Result<T, LmdbError>,
    ) -> Result<T, StoreError> {
        let txn = self.txn.try_borrow().map_err(|_| LmdbError::BatchBusy)?;
        Ok(f(&self.dbs, &**txn)?)
    }

    fn write<T>(
        &self,
        f: impl FnOnce(&Databases, &mut RwTxn) -> Result<T, LmdbError>,
    ) -> Result<T, StoreError> {
        let mut txn = self.txn.try_borrow_mut().map_err(|_| LmdbError::BatchBusy)?;
        Ok(f(&self.dbs, &mut *txn)?)
    }
}

impl Transactional for LmdbEnvironment {
    fn atomically<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&dyn BlockStore) -> Result<T, E>,
        E: From<StoreError>,
    {
        let batch = self.write_batch().map_err(StoreError::from)?;
        let out = f(&batch)?;
        batch.commit().map_err(StoreError::from)?;
        Ok(out)
    }
}

impl ProposalStore for WriteBatch<'_> {
    fn get_proposal(&self, id: ProposalId) -> Result<Option<Proposal>, StoreError> {
        self.read(|dbs, txn| dbs.proposal(txn, id))
    }

    fn set_proposal(&self, proposal: &Proposal) -> Result<(), StoreError> {
        self.write(|dbs, txn| dbs.put_proposal(txn, proposal))
    }

    fn delete_proposal(&self, id: ProposalId) -> Result<(), StoreError> {
        self.write(|dbs, txn| dbs.delete_proposal(txn, id))
    }

    fn next_proposal_id(&self) -> Result<ProposalId, StoreError> {
        self.write(|dbs, txn| dbs.next_proposal_id(txn))
    }

    fn insert_inactive_queue(
        &self,
        deadline: Timestamp,
        id: ProposalId,
    ) -> Result<(), StoreError> {
        self.write(|dbs, txn| dbs.enqueue(txn, Queue::Inactive, deadline, id))
    }

    fn remove_from_inactive_queue(
        &self,
        deadline: Timestamp,
        id: ProposalId,
    ) -> Result<(), StoreError> {
        self.write(|dbs, txn| dbs.dequeue(txn, Queue::Inactive, deadline, id))
    }

    fn inactive_queue_until(
        &self,
        until: Timestamp,
    ) -> Result<Vec<(Timestamp, ProposalId)>, StoreError> {
        self.read(|dbs, txn| dbs.queue_until(txn, Queue::Inactive, until))
    }

    fn insert_active_queue(&self, deadline: Timestamp, id: ProposalId) -> Result<(), StoreError> {
        self.write(|dbs, txn| dbs.enqueue(txn, Queue::Active, deadline, id))
    }

    fn remove_from_active_queue(
        &self,
        deadline: Timestamp,
        id: ProposalId,
    ) -> Result<(), StoreError> {
        self.write(|dbs, txn| dbs.dequeue(txn, Queue::Active, deadline, id))
    }

    fn active_queue_until(
        &self,
        until: Timestamp,
    ) -> Result<Vec<(Timestamp, ProposalId)>, StoreError> {
        self.read(|dbs, txn| dbs.queue_until(txn, Queue::Active, until))
    }
}

impl DepositLedger for WriteBatch<'_> {
    fn set_deposit(&self, deposit: &Deposit) -> Result<(), StoreError> {
        self.write(|dbs, txn| dbs.put_deposit(txn, deposit))
    }

    fn get_deposit(
        &self,
        id: ProposalId,
        depositor: &AccountAddress,
    ) -> Result<Option<Deposit>, StoreError> {
        self.read(|dbs, txn| dbs.deposit(txn, id, depositor))
    }

    fn deposits(&self, id: ProposalId) -> Result<Vec<Deposit>, StoreError> {
        self.read(|dbs, txn| dbs.deposits_of(txn, id))
    }

    fn refund_deposits(&self, id: ProposalId) -> Result<Coins, StoreError> {
        self.write(|dbs, txn| dbs.refund_deposits(txn, id))
    }

    fn burn_deposits(&self, id: ProposalId) -> Result<Coins, StoreError> {
        self.write(|dbs, txn| dbs.burn_deposits(txn, id))
    }

    fn balance_of(&self, account: &AccountAddress) -> Result<Coins, StoreError> {
        self.read(|dbs, txn| dbs.balance_of(txn, account))
    }

    fn burned_total(&self) -> Result<Coins, StoreError> {
        self.read(|dbs, txn| dbs.burned_total(txn))
    }
}

impl VoteStore for WriteBatch<'_> {
    fn set_vote(&self, vote: &Vote) -> Result<(), StoreError> {
        self.write(|dbs, txn| dbs.put_vote(txn, vote))
    }

    fn get_vote(
        &self,
        id: ProposalId,
        voter: &AccountAddress,
    ) -> Result<Option<Vote>, StoreError> {
        self.read(|dbs, txn| dbs.vote(txn, id, voter))
    }

    fn votes(&self, id: ProposalId) -> Result<Vec<Vote>, StoreError> {
        self.read(|dbs, txn| dbs.votes_of(txn, id))
    }

    fn delete_votes(&self, id: ProposalId) -> Result<(), StoreError> {
        self.write(|dbs, txn| dbs.delete_votes(txn, id))
    }
}

impl ParamStore for WriteBatch<'_> {
    fn get_param(&self, subspace: &str, key: &str) -> Result<Option<String>, StoreError> {
        self.read(|dbs, txn| dbs.param(txn, subspace, key))
    }

    fn set_param(&self, subspace: &str, key: &str, value: &str) -> Result<(), StoreError> {
        self.write(|dbs, txn| dbs.put_param(txn, subspace, key, value))
    }

    /// Runs in a nested transaction so a failing change leaves the batch as
    /// it was before the call.
    fn set_params(&self, changes: &[ParamChange]) -> Result<(), StoreError> {
        let env = self.env;
        self.write(|dbs, txn| {
            let mut nested = env.nested_write_txn(txn)?;
            dbs.put_params(&mut nested, changes)?;
            nested.commit()?;
            Ok(())
        })
    }
}
