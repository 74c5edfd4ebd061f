//! LMDB implementation of the proposal store, deposit ledger and vote store.
//!
//! Databases:
//! - `proposals`: `id_be(8)` → bincode `Proposal`
//! - `inactive_queue`, `active_queue`: `deadline_be(8) ++ id_be(8)` → empty
//! - `deposits`: `id_be(8) ++ depositor` → bincode `Deposit`
//! - `votes`: `id_be(8) ++ voter` → bincode `Vote`
//! - `balances`: `account` → `u128` big-endian (refund credits)
//! - `meta`: `last_proposal_id` → `u64` BE, `burned_total` → `u128` BE
//!
//! The record logic lives on [`Databases`] and runs inside whatever
//! transaction it is handed. [`LmdbGovernanceStore`] gives each trait call its
//! own transaction; [`crate::WriteBatch`] shares one across a whole block.

use std::ops::Bound;

use heed::types::Bytes;
use heed::{Database, Env, RoTxn, RwTxn};
use serde::de::DeserializeOwned;

use agora_store::{DepositLedger, ProposalStore, StoreError, VoteStore};
use agora_types::{AccountAddress, Coins, Deposit, Proposal, ProposalId, Timestamp, Vote};

use crate::environment::{Databases, LmdbEnvironment};
use crate::keys::{
    account_key, decode_queue_key, increment_prefix, proposal_key, queue_key, queue_upper_bound,
};
use crate::LmdbError;

const LAST_PROPOSAL_ID: &[u8] = b"last_proposal_id";
const BURNED_TOTAL: &[u8] = b"burned_total";

/// Which deadline queue an operation targets.
#[derive(Clone, Copy, Debug)]
pub(crate) enum Queue {
    Inactive,
    Active,
}

pub struct LmdbGovernanceStore {
    env: Env,
    dbs: Databases,
}

impl LmdbGovernanceStore {
    pub(crate) fn new(environment: &LmdbEnvironment) -> Self {
        Self {
            env: environment.env().clone(),
            dbs: environment.databases(),
        }
    }

    fn read<T>(
        &self,
        f: impl FnOnce(&Databases, &RoTxn) -> Result<T, LmdbError>,
    ) -> Result<T, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        Ok(f(&self.dbs, &rtxn)?)
    }

    fn write<T>(
        &self,
        f: impl FnOnce(&Databases, &mut RwTxn) -> Result<T, LmdbError>,
    ) -> Result<T, StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        let out = f(&self.dbs, &mut wtxn)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(out)
    }
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, LmdbError> {
    Ok(bincode::deserialize(bytes)?)
}

fn decode_u128(key: &[u8], bytes: &[u8]) -> Result<u128, LmdbError> {
    let arr: [u8; 16] = bytes
        .try_into()
        .map_err(|_| LmdbError::Malformed(String::from_utf8_lossy(key).into_owned()))?;
    Ok(u128::from_be_bytes(arr))
}

fn read_u128(db: Database<Bytes, Bytes>, txn: &RoTxn, key: &[u8]) -> Result<u128, LmdbError> {
    match db.get(txn, key)? {
        Some(bytes) => decode_u128(key, bytes),
        None => Ok(0),
    }
}

fn get_decoded<T: DeserializeOwned>(
    db: Database<Bytes, Bytes>,
    txn: &RoTxn,
    key: &[u8],
) -> Result<Option<T>, LmdbError> {
    match db.get(txn, key)? {
        Some(bytes) => Ok(Some(decode(bytes)?)),
        None => Ok(None),
    }
}

/// Every entry of `db` whose key starts with `prefix`, in key order.
fn prefix_values<T: DeserializeOwned>(
    db: Database<Bytes, Bytes>,
    txn: &RoTxn,
    prefix: &[u8],
) -> Result<Vec<(Vec<u8>, T)>, LmdbError> {
    let mut upper = prefix.to_vec();
    let bounds = if increment_prefix(&mut upper) {
        (Bound::Included(prefix), Bound::Excluded(upper.as_slice()))
    } else {
        (Bound::Included(prefix), Bound::Unbounded)
    };
    let mut out = Vec::new();
    for result in db.range(txn, &bounds)? {
        let (key, value) = result?;
        out.push((key.to_vec(), decode(value)?));
    }
    Ok(out)
}

impl Databases {
    fn queue(&self, queue: Queue) -> Database<Bytes, Bytes> {
        match queue {
            Queue::Inactive => self.inactive_queue,
            Queue::Active => self.active_queue,
        }
    }

    pub(crate) fn proposal(
        &self,
        txn: &RoTxn,
        id: ProposalId,
    ) -> Result<Option<Proposal>, LmdbError> {
        get_decoded(self.proposals, txn, &proposal_key(id))
    }

    pub(crate) fn put_proposal(
        &self,
        txn: &mut RwTxn,
        proposal: &Proposal,
    ) -> Result<(), LmdbError> {
        let bytes = bincode::serialize(proposal)?;
        self.proposals.put(txn, &proposal_key(proposal.id)[..], &bytes)?;
        Ok(())
    }

    pub(crate) fn delete_proposal(
        &self,
        txn: &mut RwTxn,
        id: ProposalId,
    ) -> Result<(), LmdbError> {
        self.proposals.delete(txn, &proposal_key(id)[..])?;
        Ok(())
    }

    pub(crate) fn next_proposal_id(&self, txn: &mut RwTxn) -> Result<ProposalId, LmdbError> {
        let last = match self.meta.get(txn, LAST_PROPOSAL_ID)? {
            Some(bytes) => {
                let arr: [u8; 8] = bytes
                    .try_into()
                    .map_err(|_| LmdbError::Malformed("last_proposal_id".into()))?;
                ProposalId::from_be_bytes(arr)
            }
            None => ProposalId::default(),
        };
        let next = last
            .next()
            .ok_or_else(|| LmdbError::Overflow("proposal id".into()))?;
        self.meta.put(txn, LAST_PROPOSAL_ID, &next.to_be_bytes())?;
        Ok(next)
    }

    pub(crate) fn enqueue(
        &self,
        txn: &mut RwTxn,
        queue: Queue,
        deadline: Timestamp,
        id: ProposalId,
    ) -> Result<(), LmdbError> {
        self.queue(queue).put(txn, &queue_key(deadline, id)[..], &[])?;
        Ok(())
    }

    pub(crate) fn dequeue(
        &self,
        txn: &mut RwTxn,
        queue: Queue,
        deadline: Timestamp,
        id: ProposalId,
    ) -> Result<(), LmdbError> {
        self.queue(queue).delete(txn, &queue_key(deadline, id)[..])?;
        Ok(())
    }

    pub(crate) fn queue_until(
        &self,
        txn: &RoTxn,
        queue: Queue,
        until: Timestamp,
    ) -> Result<Vec<(Timestamp, ProposalId)>, LmdbError> {
        let upper = queue_upper_bound(until);
        let bounds: (Bound<&[u8]>, Bound<&[u8]>) = (Bound::Unbounded, Bound::Included(&upper[..]));
        let mut due = Vec::new();
        for result in self.queue(queue).range(txn, &bounds)? {
            let (key, _) = result?;
            let entry = decode_queue_key(key)
                .ok_or_else(|| LmdbError::Malformed(format!("queue key of {} bytes", key.len())))?;
            due.push(entry);
        }
        Ok(due)
    }

    pub(crate) fn put_deposit(
        &self,
        txn: &mut RwTxn,
        deposit: &Deposit,
    ) -> Result<(), LmdbError> {
        let bytes = bincode::serialize(deposit)?;
        self.deposits
            .put(txn, &account_key(deposit.proposal_id, &deposit.depositor), &bytes)?;
        Ok(())
    }

    pub(crate) fn deposit(
        &self,
        txn: &RoTxn,
        id: ProposalId,
        depositor: &AccountAddress,
    ) -> Result<Option<Deposit>, LmdbError> {
        get_decoded(self.deposits, txn, &account_key(id, depositor))
    }

    pub(crate) fn deposits_of(
        &self,
        txn: &RoTxn,
        id: ProposalId,
    ) -> Result<Vec<Deposit>, LmdbError> {
        let entries = prefix_values(self.deposits, txn, &proposal_key(id))?;
        Ok(entries.into_iter().map(|(_, d)| d).collect())
    }

    /// Remove and return every deposit of `id`, in depositor order.
    fn take_deposits(&self, txn: &mut RwTxn, id: ProposalId) -> Result<Vec<Deposit>, LmdbError> {
        let entries: Vec<(Vec<u8>, Deposit)> =
            prefix_values(self.deposits, txn, &proposal_key(id))?;
        let mut taken = Vec::with_capacity(entries.len());
        for (key, deposit) in entries {
            self.deposits.delete(txn, &key)?;
            taken.push(deposit);
        }
        Ok(taken)
    }

    pub(crate) fn refund_deposits(
        &self,
        txn: &mut RwTxn,
        id: ProposalId,
    ) -> Result<Coins, LmdbError> {
        let mut total = Coins::ZERO;
        for deposit in self.take_deposits(txn, id)? {
            let key = deposit.depositor.as_bytes();
            let balance = read_u128(self.balances, txn, key)?
                .checked_add(deposit.amount.raw())
                .ok_or_else(|| LmdbError::Overflow(format!("balance of {}", deposit.depositor)))?;
            self.balances.put(txn, key, &balance.to_be_bytes())?;
            total = total.saturating_add(deposit.amount);
        }
        Ok(total)
    }

    pub(crate) fn burn_deposits(
        &self,
        txn: &mut RwTxn,
        id: ProposalId,
    ) -> Result<Coins, LmdbError> {
        let total: Coins = self
            .take_deposits(txn, id)?
            .into_iter()
            .map(|d| d.amount)
            .sum();
        let burned = read_u128(self.meta, txn, BURNED_TOTAL)?.saturating_add(total.raw());
        self.meta.put(txn, BURNED_TOTAL, &burned.to_be_bytes())?;
        Ok(total)
    }

    pub(crate) fn balance_of(
        &self,
        txn: &RoTxn,
        account: &AccountAddress,
    ) -> Result<Coins, LmdbError> {
        Ok(Coins::new(read_u128(self.balances, txn, account.as_bytes())?))
    }

    pub(crate) fn burned_total(&self, txn: &RoTxn) -> Result<Coins, LmdbError> {
        Ok(Coins::new(read_u128(self.meta, txn, BURNED_TOTAL)?))
    }

    pub(crate) fn put_vote(&self, txn: &mut RwTxn, vote: &Vote) -> Result<(), LmdbError> {
        let bytes = bincode::serialize(vote)?;
        self.votes
            .put(txn, &account_key(vote.proposal_id, &vote.voter), &bytes)?;
        Ok(())
    }

    pub(crate) fn vote(
        &self,
        txn: &RoTxn,
        id: ProposalId,
        voter: &AccountAddress,
    ) -> Result<Option<Vote>, LmdbError> {
        get_decoded(self.votes, txn, &account_key(id, voter))
    }

    pub(crate) fn votes_of(&self, txn: &RoTxn, id: ProposalId) -> Result<Vec<Vote>, LmdbError> {
        let entries = prefix_values(self.votes, txn, &proposal_key(id))?;
        Ok(entries.into_iter().map(|(_, v)| v).collect())
    }

    pub(crate) fn delete_votes(&self, txn: &mut RwTxn, id: ProposalId) -> Result<(), LmdbError> {
        let entries: Vec<(Vec<u8>, Vote)> = prefix_values(self.votes, txn, &proposal_key(id))?;
        for (key, _) in entries {
            self.votes.delete(txn, &key)?;
        }
        Ok(())
    }
}

impl ProposalStore for LmdbGovernanceStore {
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

impl DepositLedger for LmdbGovernanceStore {
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

impl VoteStore for LmdbGovernanceStore {
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
