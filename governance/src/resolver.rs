//! End-block proposal resolution.
//!
//! Runs once per block with the block's canonical time. Two sweeps, in order:
//!
//! 1. **Deposit deadline**: proposals still collecting deposits whose
//!    deadline has passed are deleted and their deposits burned.
//! 2. **Voting deadline**: proposals whose voting period has ended are
//!    tallied. Passing refunds deposits and runs the proposal's handler;
//!    rejection burns deposits.
//!
//! Both sweeps walk their queue in ascending `(deadline, id)` order and the
//! emitted events follow that order.
//!
//! A queued id with no proposal behind it, or a passed proposal whose route
//! has no handler, means state is corrupt: the call returns
//! [`FinalizeError`] immediately and the block must be abandoned.
//! [`Resolver::end_block_atomic`] runs the sweeps inside one
//! [`Transactional`] unit so an abandoned block leaves no writes behind. A
//! handler returning an error is not fatal; it is reported in the event and
//! the sweep continues.

use crate::error::{FinalizeError, InvariantViolation};
use crate::events::{ProposalResult, ResolutionEvent};
use crate::keeper::Keeper;
use crate::params::GovernanceParams;
use crate::router::Router;
use crate::tally::{weigh_votes, TallyCalculator, ThresholdTally};
use agora_store::{BlockStore, GovernanceStore, Transactional, VotingPowerSource};
use agora_types::{Proposal, ProposalId, ProposalStatus, Timestamp};

/// The proposal resolution engine.
///
/// Holds only immutable configuration; all state lives in the store handle
/// passed to [`Resolver::end_block`].
pub struct Resolver<T = ThresholdTally> {
    router: Router,
    tally: T,
    params: GovernanceParams,
}

impl Resolver<ThresholdTally> {
    /// Resolver with the default quorum/threshold/veto policy.
    pub fn with_default_tally(router: Router, params: GovernanceParams) -> Self {
        Self::new(router, ThresholdTally, params)
    }
}

impl<T: TallyCalculator> Resolver<T> {
    pub fn new(router: Router, tally: T, params: GovernanceParams) -> Self {
        Self {
            router,
            tally,
            params,
        }
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn params(&self) -> &GovernanceParams {
        &self.params
    }

    /// Transaction entry points sharing this resolver's router and params.
    pub fn keeper(&self) -> Keeper<'_> {
        Keeper::new(&self.router, &self.params)
    }

    /// Resolve every proposal due at `block_time` and commit the block's
    /// writes only if resolution succeeds.
    pub fn end_block_atomic<B: Transactional>(
        &self,
        backend: &B,
        power: &dyn VotingPowerSource,
        block_time: Timestamp,
    ) -> Result<Vec<ResolutionEvent>, FinalizeError> {
        backend.atomically(|store| self.end_block(store, power, block_time))
    }

    /// Resolve every proposal whose deposit or voting deadline is at or
    /// before `block_time`.
    ///
    /// Writes go straight to `store`. On error the caller must discard them;
    /// see [`Resolver::end_block_atomic`].
    pub fn end_block<S>(
        &self,
        store: &S,
        power: &dyn VotingPowerSource,
        block_time: Timestamp,
    ) -> Result<Vec<ResolutionEvent>, FinalizeError>
    where
        S: BlockStore + ?Sized,
    {
        let mut events = Vec::new();
        self.sweep_inactive(store, block_time, &mut events)?;
        self.sweep_active(store, power, block_time, &mut events)?;
        Ok(events)
    }

    fn sweep_inactive<S>(
        &self,
        store: &S,
        block_time: Timestamp,
        events: &mut Vec<ResolutionEvent>,
    ) -> Result<(), FinalizeError>
    where
        S: GovernanceStore + ?Sized,
    {
        for (deadline, id) in store.inactive_queue_until(block_time)? {
            let proposal = load_queued(store, id)?;

            store.delete_proposal(id)?;
            let burned = store.burn_deposits(id)?;
            store.remove_from_inactive_queue(deadline, id)?;

            tracing::info!(
                proposal_id = %id,
                title = proposal.title(),
                min_deposit = %self.params.deposit.min_deposit(),
                total_deposit = %proposal.total_deposit,
                burned = %burned,
                "proposal didn't meet minimum deposit; deleted"
            );
            events.push(ResolutionEvent::new(id, ProposalResult::Dropped));
        }
        Ok(())
    }

    fn sweep_active<S>(
        &self,
        store: &S,
        power: &dyn VotingPowerSource,
        block_time: Timestamp,
        events: &mut Vec<ResolutionEvent>,
    ) -> Result<(), FinalizeError>
    where
        S: BlockStore + ?Sized,
    {
        for (deadline, id) in store.active_queue_until(block_time)? {
            let mut proposal = load_queued(store, id)?;

            let votes = store.votes(id)?;
            let weighted = weigh_votes(&votes, power);
            let (passed, tally) =
                self.tally
                    .compute(&weighted, power.total_power(), &self.params.tally);

            let mut handler_error = None;
            let result = if passed {
                store.refund_deposits(id)?;
                proposal.status = ProposalStatus::Passed;

                let route = proposal.route();
                let Some(handler) = self.router.route(route) else {
                    let violation = InvariantViolation::MissingHandler {
                        proposal: id,
                        route: route.to_string(),
                    };
                    tracing::error!(proposal_id = %id, route, "{violation}");
                    return Err(violation.into());
                };
                match handler.handle(store.as_params(), &proposal.content) {
                    Ok(()) => ProposalResult::Passed,
                    Err(e) => {
                        tracing::warn!(
                            proposal_id = %id,
                            route,
                            error = %e,
                            "proposal handler failed"
                        );
                        handler_error = Some(e.to_string());
                        ProposalResult::Failed
                    }
                }
            } else {
                store.burn_deposits(id)?;
                proposal.status = ProposalStatus::Rejected;
                ProposalResult::Rejected
            };

            proposal.final_tally_result = Some(tally);
            store.delete_votes(id)?;
            store.set_proposal(&proposal)?;
            store.remove_from_active_queue(deadline, id)?;

            tracing::info!(
                proposal_id = %id,
                title = proposal.title(),
                passed,
                handled = result == ProposalResult::Passed,
                yes = tally.yes,
                no = tally.no,
                no_with_veto = tally.no_with_veto,
                abstain = tally.abstain,
                "proposal tallied"
            );

            let mut event = ResolutionEvent::new(id, result);
            if let Some(error) = handler_error {
                event = event.with_error(error);
            }
            events.push(event);
        }
        Ok(())
    }
}

/// Fetch a proposal named by a queue entry. Absence is an invariant breach.
fn load_queued<S>(store: &S, id: ProposalId) -> Result<Proposal, FinalizeError>
where
    S: GovernanceStore + ?Sized,
{
    match store.get_proposal(id)? {
        Some(proposal) => Ok(proposal),
        None => {
            let violation = InvariantViolation::MissingProposal(id);
            tracing::error!(proposal_id = %id, "{violation}");
            Err(violation.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HandlerError;
    use crate::handlers::TextProposalHandler;
    use agora_nullables::{NullGovernanceStore, NullPowerSource};
    use agora_store::{DepositLedger, ParamStore, ProposalStore, VoteStore};
    use agora_types::{AccountAddress, Coins, ProposalContent};

    fn text_proposal(id: u64, status: ProposalStatus, voting_end: u64) -> Proposal {
        Proposal {
            id: ProposalId::new(id),
            content: ProposalContent::Text {
                title: format!("proposal {id}"),
                description: String::new(),
            },
            proposer: AccountAddress::new("agr_proposer"),
            status,
            final_tally_result: None,
            submit_time: Timestamp::EPOCH,
            deposit_end_time: Timestamp::new(voting_end),
            total_deposit: Coins::ZERO,
            voting_start_time: None,
            voting_end_time: Timestamp::new(voting_end),
        }
    }

    #[test]
    fn empty_queues_emit_nothing() {
        let resolver = Resolver::with_default_tally(Router::new(), GovernanceParams::default());
        let store = NullGovernanceStore::new();
        let events = resolver
            .end_block(&store, &NullPowerSource::new(), Timestamp::new(1_000))
            .unwrap();
        assert!(events.is_empty());
    }

    #[test]
    fn dangling_inactive_entry_is_fatal() {
        let resolver = Resolver::with_default_tally(Router::new(), GovernanceParams::default());
        let store = NullGovernanceStore::new();
        store
            .insert_inactive_queue(Timestamp::new(5), ProposalId::new(9))
            .unwrap();
        let err = resolver
            .end_block(&store, &NullPowerSource::new(), Timestamp::new(5))
            .unwrap_err();
        assert!(matches!(
            err,
            FinalizeError::Invariant(InvariantViolation::MissingProposal(id)) if id == ProposalId::new(9)
        ));
    }

    #[test]
    fn dangling_active_entry_is_fatal() {
        let resolver = Resolver::with_default_tally(Router::new(), GovernanceParams::default());
        let store = NullGovernanceStore::new();
        store
            .insert_active_queue(Timestamp::new(5), ProposalId::new(3))
            .unwrap();
        assert!(resolver
            .end_block(&store, &NullPowerSource::new(), Timestamp::new(6))
            .is_err());
    }

    #[test]
    fn custom_tally_policy_is_used() {
        struct AlwaysPass;
        impl TallyCalculator for AlwaysPass {
            fn compute(
                &self,
                votes: &[crate::tally::WeightedVote],
                _total_power: u128,
                _params: &crate::params::TallyParams,
            ) -> (bool, agora_types::TallyResult) {
                let mut result = agora_types::TallyResult::empty();
                for v in votes {
                    result.add(v.option, v.power);
                }
                (true, result)
            }
        }

        let router = Router::new().add_route("gov", TextProposalHandler).unwrap();
        let resolver = Resolver::new(router, AlwaysPass, GovernanceParams::default());
        let store = NullGovernanceStore::new();
        store
            .set_proposal(&text_proposal(1, ProposalStatus::Active, 10))
            .unwrap();
        store
            .insert_active_queue(Timestamp::new(10), ProposalId::new(1))
            .unwrap();

        let events = resolver
            .end_block(&store, &NullPowerSource::new(), Timestamp::new(10))
            .unwrap();
        assert_eq!(events, vec![ResolutionEvent::new(ProposalId::new(1), ProposalResult::Passed)]);
    }

    #[test]
    fn handler_failure_keeps_passed_status() {
        struct Pass;
        impl TallyCalculator for Pass {
            fn compute(
                &self,
                _votes: &[crate::tally::WeightedVote],
                _total_power: u128,
                _params: &crate::params::TallyParams,
            ) -> (bool, agora_types::TallyResult) {
                (true, agora_types::TallyResult::empty())
            }
        }

        let failing = |_: &dyn ParamStore, _: &ProposalContent| -> Result<(), HandlerError> {
            Err(HandlerError::Other("chain halted".into()))
        };
        let router = Router::new().add_route("gov", failing).unwrap();
        let resolver = Resolver::new(router, Pass, GovernanceParams::default());
        let store = NullGovernanceStore::new();
        store
            .set_proposal(&text_proposal(4, ProposalStatus::Active, 10))
            .unwrap();
        store
            .insert_active_queue(Timestamp::new(10), ProposalId::new(4))
            .unwrap();

        let events = resolver
            .end_block(&store, &NullPowerSource::new(), Timestamp::new(11))
            .unwrap();
        assert_eq!(events[0].result, ProposalResult::Failed);
        assert_eq!(events[0].error.as_deref(), Some("chain halted"));
        let stored = store.get_proposal(ProposalId::new(4)).unwrap().unwrap();
        assert_eq!(stored.status, ProposalStatus::Passed);
        assert!(stored.final_tally_result.is_some());
    }

    #[test]
    fn atomic_block_leaves_no_trace_after_fatal_error() {
        let resolver = Resolver::with_default_tally(Router::new(), GovernanceParams::default());
        let store = NullGovernanceStore::new();
        let mut underfunded = text_proposal(1, ProposalStatus::DepositPeriod, 10);
        underfunded.total_deposit = Coins::new(5);
        store.set_proposal(&underfunded).unwrap();
        store
            .insert_inactive_queue(Timestamp::new(10), ProposalId::new(1))
            .unwrap();
        store
            .set_deposit(&agora_types::Deposit {
                proposal_id: ProposalId::new(1),
                depositor: AccountAddress::new("agr_proposer"),
                amount: Coins::new(5),
            })
            .unwrap();
        store
            .insert_active_queue(Timestamp::new(10), ProposalId::new(99))
            .unwrap();

        let err = resolver
            .end_block_atomic(&store, &NullPowerSource::new(), Timestamp::new(10))
            .unwrap_err();
        assert!(matches!(
            err,
            FinalizeError::Invariant(InvariantViolation::MissingProposal(id))
                if id == ProposalId::new(99)
        ));

        assert_eq!(store.get_proposal(ProposalId::new(1)).unwrap(), Some(underfunded));
        assert_eq!(store.burned_total().unwrap(), Coins::ZERO);
        assert_eq!(store.deposits(ProposalId::new(1)).unwrap().len(), 1);
        assert!(store.in_inactive_queue(ProposalId::new(1)));
    }

    #[test]
    fn votes_survive_until_the_proposal_is_persisted() {
        struct Pass;
        impl TallyCalculator for Pass {
            fn compute(
                &self,
                _votes: &[crate::tally::WeightedVote],
                _total_power: u128,
                _params: &crate::params::TallyParams,
            ) -> (bool, agora_types::TallyResult) {
                (true, agora_types::TallyResult::empty())
            }
        }

        // No handler for the text route: the sweep stops at the handler lookup.
        let resolver = Resolver::new(Router::new(), Pass, GovernanceParams::default());
        let store = NullGovernanceStore::new();
        store
            .set_proposal(&text_proposal(2, ProposalStatus::Active, 10))
            .unwrap();
        store
            .insert_active_queue(Timestamp::new(10), ProposalId::new(2))
            .unwrap();
        store
            .set_vote(&agora_types::Vote {
                proposal_id: ProposalId::new(2),
                voter: AccountAddress::new("agr_val"),
                option: agora_types::VoteOption::Yes,
            })
            .unwrap();

        let err = resolver
            .end_block(&store, &NullPowerSource::new(), Timestamp::new(10))
            .unwrap_err();
        assert!(matches!(
            err,
            FinalizeError::Invariant(InvariantViolation::MissingHandler { .. })
        ));
        assert_eq!(store.votes(ProposalId::new(2)).unwrap().len(), 1);
    }
}
