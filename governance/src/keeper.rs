//! Transaction-level entry points: submit, deposit, vote.
//!
//! These maintain the queue invariant the resolver relies on: a live proposal
//! sits in exactly one queue, the inactive queue while collecting deposits
//! and the active queue while voting.

use crate::error::GovernanceError;
use crate::params::GovernanceParams;
use crate::router::Router;
use agora_store::GovernanceStore;
use agora_types::{
    AccountAddress, Coins, Deposit, Proposal, ProposalContent, ProposalId, ProposalStatus,
    Timestamp, Vote, VoteOption,
};

pub struct Keeper<'a> {
    router: &'a Router,
    params: &'a GovernanceParams,
}

impl<'a> Keeper<'a> {
    pub fn new(router: &'a Router, params: &'a GovernanceParams) -> Self {
        Self { router, params }
    }

    /// Create a proposal in the deposit period and apply the initial deposit.
    ///
    /// Proposals whose route has no registered handler are rejected here;
    /// this is the only place unsupported routes are turned away.
    pub fn submit_proposal<S: GovernanceStore + ?Sized>(
        &self,
        store: &S,
        content: ProposalContent,
        proposer: &AccountAddress,
        initial_deposit: Coins,
        now: Timestamp,
    ) -> Result<ProposalId, GovernanceError> {
        content.validate_basic()?;
        let route = content.route();
        if !self.router.has_route(route) {
            return Err(GovernanceError::UnknownRoute(route.to_string()));
        }

        let id = store.next_proposal_id()?;
        let deposit_end_time = now.saturating_add_secs(self.params.deposit.max_deposit_period_secs);
        let proposal = Proposal {
            id,
            content,
            proposer: proposer.clone(),
            status: ProposalStatus::DepositPeriod,
            final_tally_result: None,
            submit_time: now,
            deposit_end_time,
            total_deposit: Coins::ZERO,
            voting_start_time: None,
            voting_end_time: deposit_end_time,
        };
        store.set_proposal(&proposal)?;
        store.insert_inactive_queue(deposit_end_time, id)?;
        tracing::debug!(proposal_id = %id, %proposer, route, "proposal submitted");

        if !initial_deposit.is_zero() {
            self.add_deposit(store, id, proposer, initial_deposit, now)?;
        }
        Ok(id)
    }

    /// Escrow `amount` from `depositor`. Returns `true` if this deposit moved
    /// the proposal into its voting period.
    pub fn add_deposit<S: GovernanceStore + ?Sized>(
        &self,
        store: &S,
        id: ProposalId,
        depositor: &AccountAddress,
        amount: Coins,
        now: Timestamp,
    ) -> Result<bool, GovernanceError> {
        if amount.is_zero() {
            return Err(GovernanceError::ZeroDeposit);
        }
        let mut proposal = store
            .get_proposal(id)?
            .ok_or(GovernanceError::ProposalNotFound(id))?;
        if !matches!(
            proposal.status,
            ProposalStatus::DepositPeriod | ProposalStatus::Active
        ) {
            return Err(GovernanceError::WrongStatus {
                id,
                status: proposal.status,
                expected: "DepositPeriod or Active",
            });
        }

        proposal.total_deposit = proposal
            .total_deposit
            .checked_add(amount)
            .ok_or(GovernanceError::Overflow("total deposit"))?;
        let previous = store
            .get_deposit(id, depositor)?
            .map(|d| d.amount)
            .unwrap_or_default();
        let deposit = Deposit {
            proposal_id: id,
            depositor: depositor.clone(),
            amount: previous
                .checked_add(amount)
                .ok_or(GovernanceError::Overflow("deposit"))?,
        };
        store.set_deposit(&deposit)?;

        let activate = proposal.status == ProposalStatus::DepositPeriod
            && proposal.total_deposit >= self.params.deposit.min_deposit();
        if activate {
            self.activate_voting_period(store, &mut proposal, now)?;
        } else {
            store.set_proposal(&proposal)?;
        }
        Ok(activate)
    }

    fn activate_voting_period<S: GovernanceStore + ?Sized>(
        &self,
        store: &S,
        proposal: &mut Proposal,
        now: Timestamp,
    ) -> Result<(), GovernanceError> {
        store.remove_from_inactive_queue(proposal.deposit_end_time, proposal.id)?;
        proposal.status = ProposalStatus::Active;
        proposal.voting_start_time = Some(now);
        proposal.voting_end_time = now.saturating_add_secs(self.params.voting.voting_period_secs);
        store.set_proposal(proposal)?;
        store.insert_active_queue(proposal.voting_end_time, proposal.id)?;
        tracing::debug!(
            proposal_id = %proposal.id,
            voting_end_time = %proposal.voting_end_time,
            "proposal entered voting period"
        );
        Ok(())
    }

    /// Record a vote. A later vote by the same voter replaces the earlier one.
    pub fn cast_vote<S: GovernanceStore + ?Sized>(
        &self,
        store: &S,
        id: ProposalId,
        voter: &AccountAddress,
        option: VoteOption,
    ) -> Result<(), GovernanceError> {
        let proposal = store
            .get_proposal(id)?
            .ok_or(GovernanceError::ProposalNotFound(id))?;
        if proposal.status != ProposalStatus::Active {
            return Err(GovernanceError::WrongStatus {
                id,
                status: proposal.status,
                expected: "Active",
            });
        }
        store.set_vote(&Vote {
            proposal_id: id,
            voter: voter.clone(),
            option,
        })?;
        Ok(())
    }
}
