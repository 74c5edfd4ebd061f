//! Nullable governance store: thread-safe in-memory storage for testing.
//!
//! Every collection is a `BTreeMap`/`BTreeSet`, so listings come back in key
//! order exactly as a byte-ordered backend would return them. All state sits
//! behind one lock, which makes [`Transactional::atomically`] a snapshot and
//! restore.

use agora_store::{
    BlockStore, DepositLedger, ParamStore, ProposalStore, StoreError, Transactional, VoteStore,
};
use agora_types::{
    AccountAddress, Coins, Deposit, ParamChange, Proposal, ProposalId, Timestamp, Vote,
};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard};

type QueueKey = (Timestamp, ProposalId);

#[derive(Clone, Default)]
struct State {
    proposals: BTreeMap<ProposalId, Proposal>,
    last_proposal_id: ProposalId,
    inactive_queue: BTreeSet<QueueKey>,
    active_queue: BTreeSet<QueueKey>,
    deposits: BTreeMap<(ProposalId, AccountAddress), Deposit>,
    votes: BTreeMap<(ProposalId, AccountAddress), Vote>,
    balances: BTreeMap<AccountAddress, Coins>,
    burned: Coins,
    params: BTreeMap<(String, String), String>,
}

impl State {
    /// Remove and return every deposit of `id`, in depositor order.
    fn take_deposits(&mut self, id: ProposalId) -> Vec<Deposit> {
        let keys: Vec<_> = self
            .deposits
            .keys()
            .filter(|(pid, _)| *pid == id)
            .cloned()
            .collect();
        keys.into_iter()
            .filter_map(|k| self.deposits.remove(&k))
            .collect()
    }
}

/// An in-memory proposal store, deposit ledger, vote store and parameter store.
#[derive(Default)]
pub struct NullGovernanceStore {
    state: Mutex<State>,
}

impl NullGovernanceStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    /// Whether `id` is queued in the inactive queue under any deadline.
    pub fn in_inactive_queue(&self, id: ProposalId) -> bool {
        self.state().inactive_queue.iter().any(|(_, queued)| *queued == id)
    }

    /// Whether `id` is queued in the active queue under any deadline.
    pub fn in_active_queue(&self, id: ProposalId) -> bool {
        self.state().active_queue.iter().any(|(_, queued)| *queued == id)
    }

    pub fn proposal_count(&self) -> usize {
        self.state().proposals.len()
    }

    /// Number of stored parameters.
    pub fn param_count(&self) -> usize {
        self.state().params.len()
    }
}

fn queue_until(queue: &BTreeSet<QueueKey>, until: Timestamp) -> Vec<QueueKey> {
    queue
        .range(..=(until, ProposalId::new(u64::MAX)))
        .copied()
        .collect()
}

impl Transactional for NullGovernanceStore {
    fn atomically<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&dyn BlockStore) -> Result<T, E>,
        E: From<StoreError>,
    {
        let snapshot = self.state().clone();
        let result = f(self);
        if result.is_err() {
            *self.state() = snapshot;
        }
        result
    }
}

impl ProposalStore for NullGovernanceStore {
    fn get_proposal(&self, id: ProposalId) -> Result<Option<Proposal>, StoreError> {
        Ok(self.state().proposals.get(&id).cloned())
    }

    fn set_proposal(&self, proposal: &Proposal) -> Result<(), StoreError> {
        self.state().proposals.insert(proposal.id, proposal.clone());
        Ok(())
    }

    fn delete_proposal(&self, id: ProposalId) -> Result<(), StoreError> {
        self.state().proposals.remove(&id);
        Ok(())
    }

    fn next_proposal_id(&self) -> Result<ProposalId, StoreError> {
        let mut state = self.state();
        state.last_proposal_id = state
            .last_proposal_id
            .next()
            .ok_or_else(|| StoreError::Overflow("proposal id".into()))?;
        Ok(state.last_proposal_id)
    }

    fn insert_inactive_queue(
        &self,
        deadline: Timestamp,
        id: ProposalId,
    ) -> Result<(), StoreError> {
        self.state().inactive_queue.insert((deadline, id));
        Ok(())
    }

    fn remove_from_inactive_queue(
        &self,
        deadline: Timestamp,
        id: ProposalId,
    ) -> Result<(), StoreError> {
        self.state().inactive_queue.remove(&(deadline, id));
        Ok(())
    }

    fn inactive_queue_until(
        &self,
        until: Timestamp,
    ) -> Result<Vec<(Timestamp, ProposalId)>, StoreError> {
        Ok(queue_until(&self.state().inactive_queue, until))
    }

    fn insert_active_queue(&self, deadline: Timestamp, id: ProposalId) -> Result<(), StoreError> {
        self.state().active_queue.insert((deadline, id));
        Ok(())
    }

    fn remove_from_active_queue(
        &self,
        deadline: Timestamp,
        id: ProposalId,
    ) -> Result<(), StoreError> {
        self.state().active_queue.remove(&(deadline, id));
        Ok(())
    }

    fn active_queue_until(
        &self,
        until: Timestamp,
    ) -> Result<Vec<(Timestamp, ProposalId)>, StoreError> {
        Ok(queue_until(&self.state().active_queue, until))
    }
}

impl DepositLedger for NullGovernanceStore {
    fn set_deposit(&self, deposit: &Deposit) -> Result<(), StoreError> {
        self.state().deposits.insert(
            (deposit.proposal_id, deposit.depositor.clone()),
            deposit.clone(),
        );
        Ok(())
    }

    fn get_deposit(
        &self,
        id: ProposalId,
        depositor: &AccountAddress,
    ) -> Result<Option<Deposit>, StoreError> {
        Ok(self
            .state()
            .deposits
            .get(&(id, depositor.clone()))
            .cloned())
    }

    fn deposits(&self, id: ProposalId) -> Result<Vec<Deposit>, StoreError> {
        Ok(self
            .state()
            .deposits
            .iter()
            .filter(|((pid, _), _)| *pid == id)
            .map(|(_, d)| d.clone())
            .collect())
    }

    fn refund_deposits(&self, id: ProposalId) -> Result<Coins, StoreError> {
        let mut state = self.state();
        let mut credits = Vec::new();
        for ((pid, depositor), deposit) in &state.deposits {
            if *pid != id {
                continue;
            }
            let balance = state.balances.get(depositor).copied().unwrap_or_default();
            let credited = balance
                .checked_add(deposit.amount)
                .ok_or_else(|| StoreError::Overflow(format!("balance of {depositor}")))?;
            credits.push((depositor.clone(), credited));
        }
        let total = state.take_deposits(id).into_iter().map(|d| d.amount).sum();
        state.balances.extend(credits);
        Ok(total)
    }

    fn burn_deposits(&self, id: ProposalId) -> Result<Coins, StoreError> {
        let mut state = self.state();
        let total: Coins = state.take_deposits(id).into_iter().map(|d| d.amount).sum();
        state.burned = state.burned.saturating_add(total);
        Ok(total)
    }

    fn balance_of(&self, account: &AccountAddress) -> Result<Coins, StoreError> {
        Ok(self
            .state()
            .balances
            .get(account)
            .copied()
            .unwrap_or_default())
    }

    fn burned_total(&self) -> Result<Coins, StoreError> {
        Ok(self.state().burned)
    }
}

impl VoteStore for NullGovernanceStore {
    fn set_vote(&self, vote: &Vote) -> Result<(), StoreError> {
        self.state()
            .votes
            .insert((vote.proposal_id, vote.voter.clone()), vote.clone());
        Ok(())
    }

    fn get_vote(
        &self,
        id: ProposalId,
        voter: &AccountAddress,
    ) -> Result<Option<Vote>, StoreError> {
        Ok(self.state().votes.get(&(id, voter.clone())).cloned())
    }

    fn votes(&self, id: ProposalId) -> Result<Vec<Vote>, StoreError> {
        Ok(self
            .state()
            .votes
            .iter()
            .filter(|((pid, _), _)| *pid == id)
            .map(|(_, v)| v.clone())
            .collect())
    }

    fn delete_votes(&self, id: ProposalId) -> Result<(), StoreError> {
        self.state().votes.retain(|(pid, _), _| *pid != id);
        Ok(())
    }
}

impl ParamStore for NullGovernanceStore {
    fn get_param(&self, subspace: &str, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self
            .state()
            .params
            .get(&(subspace.to_string(), key.to_string()))
            .cloned())
    }

    fn set_param(&self, subspace: &str, key: &str, value: &str) -> Result<(), StoreError> {
        self.state()
            .params
            .insert((subspace.to_string(), key.to_string()), value.to_string());
        Ok(())
    }

    fn set_params(&self, changes: &[ParamChange]) -> Result<(), StoreError> {
        let mut state = self.state();
        for change in changes {
            state.params.insert(
                (change.subspace.clone(), change.key.clone()),
                change.value.clone(),
            );
        }
        Ok(())
    }
}
