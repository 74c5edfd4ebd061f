//! Block-by-block replay of a scenario against a governance store.

use std::io::Write;

use serde::Serialize;

use agora_governance::events::flatten_tags;
use agora_governance::{
    GovernanceParams, ParamChangeHandler, ResolutionEvent, Resolver, Router, TextProposalHandler,
};
use agora_nullables::NullPowerSource;
use agora_store::Transactional;
use agora_types::proposal::{PARAMS_ROUTE, TEXT_ROUTE};
use agora_types::Timestamp;

use crate::scenario::{Scenario, Tx};

/// One line of replay output.
#[derive(Debug, Serialize)]
struct EventLine<'a> {
    height: u64,
    time: Timestamp,
    #[serde(flatten)]
    event: &'a ResolutionEvent,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    pub blocks: u64,
    pub applied_txs: u64,
    pub rejected_txs: u64,
    pub events: u64,
}

/// Router with the text handler and a params handler limited to the
/// scenario's governable keys.
pub fn build_router(scenario: &Scenario) -> anyhow::Result<Router> {
    let mut params = ParamChangeHandler::new();
    for g in &scenario.governable {
        let keys: Vec<&str> = g.keys.iter().map(String::as_str).collect();
        params = params.with_subspace(&g.subspace, &keys);
    }
    Ok(Router::new()
        .add_route(TEXT_ROUTE, TextProposalHandler)?
        .add_route(PARAMS_ROUTE, params)?)
}

pub fn power_source(scenario: &Scenario) -> NullPowerSource {
    let power = NullPowerSource::new();
    for (address, amount) in &scenario.validators {
        power.set_power(address, *amount);
    }
    if let Some(total) = scenario.total_power {
        power.set_total_power(total);
    }
    power
}

/// Apply each block's transactions, run its end-block step and write one
/// JSON line per resolution event to `out`.
///
/// Each block is one atomic unit of `backend`. Transactions the keeper
/// rejects are logged and skipped. A finalize error stops the replay and
/// discards every write of the block it occurred in.
pub fn replay<B: Transactional>(
    scenario: &Scenario,
    params: GovernanceParams,
    backend: &B,
    out: &mut dyn Write,
) -> anyhow::Result<ReplaySummary> {
    let resolver = Resolver::with_default_tally(build_router(scenario)?, params);
    let power = power_source(scenario);
    let keeper = resolver.keeper();
    let mut summary = ReplaySummary::default();

    for (height, block) in (1u64..).zip(&scenario.blocks) {
        let (events, applied, rejected) = backend.atomically(|store| {
            let (mut applied, mut rejected) = (0u64, 0u64);
            for tx in &block.txs {
                let result = match tx {
                    Tx::Submit {
                        proposer,
                        content,
                        deposit,
                    } => keeper
                        .submit_proposal(store, content.clone(), proposer, *deposit, block.time)
                        .map(|id| {
                            tracing::debug!(height, proposal_id = %id, "proposal submitted");
                        }),
                    Tx::Deposit {
                        proposal,
                        depositor,
                        amount,
                    } => keeper
                        .add_deposit(store, *proposal, depositor, *amount, block.time)
                        .map(|_| ()),
                    Tx::Vote {
                        proposal,
                        voter,
                        option,
                    } => keeper.cast_vote(store, *proposal, voter, *option),
                };
                match result {
                    Ok(()) => applied += 1,
                    Err(e) => {
                        tracing::warn!(height, error = %e, "transaction rejected");
                        rejected += 1;
                    }
                }
            }

            let events = resolver.end_block(store, &power, block.time).map_err(|e| {
                anyhow::anyhow!("block {height} at {} cannot be finalized: {e}", block.time)
            })?;
            Ok::<_, anyhow::Error>((events, applied, rejected))
        })?;

        if !events.is_empty() {
            tracing::debug!(height, tags = ?flatten_tags(&events), "block resolved proposals");
        }
        for event in &events {
            let line = EventLine {
                height,
                time: block.time,
                event,
            };
            serde_json::to_writer(&mut *out, &line)?;
            writeln!(out)?;
        }
        summary.applied_txs += applied;
        summary.rejected_txs += rejected;
        summary.events += events.len() as u64;
        summary.blocks += 1;
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use agora_nullables::NullGovernanceStore;
    use agora_store::ParamStore;

    const SCENARIO: &str = r#"
        [[validators]]
        address = "agr_val1"
        power = 40
        [[validators]]
        address = "agr_val2"
        power = 35
        [[validators]]
        address = "agr_val3"
        power = 25

        [[governable]]
        subspace = "staking"
        keys = ["MaxValidators"]

        [[blocks]]
        time = 1000
        [[blocks.submit]]
        proposer = "agr_alice"
        title = "underfunded"
        deposit = 20
        [[blocks.submit]]
        proposer = "agr_bob"
        kind = "param_change"
        title = "raise cap"
        deposit = 60
        changes = [{ subspace = "staking", key = "MaxValidators", value = "150" }]

        [[blocks]]
        time = 1010
        [[blocks.vote]]
        proposal = 2
        voter = "agr_val1"
        option = "yes"
        [[blocks.vote]]
        proposal = 2
        voter = "agr_val3"
        option = "no"
        [[blocks.vote]]
        proposal = 1
        voter = "agr_val2"
        option = "yes"

        [[blocks]]
        time = 1100

        [[blocks]]
        time = 1300
    "#;

    fn params() -> GovernanceParams {
        let mut params = GovernanceParams::default();
        params.deposit.min_deposit = 50;
        params.deposit.max_deposit_period_secs = 100;
        params.voting.voting_period_secs = 300;
        params
    }

    #[test]
    fn replays_scenario_into_json_lines() {
        let scenario = Scenario::from_toml_str(SCENARIO).unwrap();
        let store = NullGovernanceStore::new();
        let mut out = Vec::new();

        let summary = replay(&scenario, params(), &store, &mut out).unwrap();

        assert_eq!(
            summary,
            ReplaySummary {
                blocks: 4,
                applied_txs: 4,
                // vote on proposal 1, still in its deposit period
                rejected_txs: 1,
                events: 2,
            }
        );
        let lines: Vec<serde_json::Value> = String::from_utf8(out)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["height"], 3);
        assert_eq!(lines[0]["result"], "Dropped");
        assert_eq!(lines[1]["height"], 4);
        assert_eq!(lines[1]["result"], "Passed");
        assert_eq!(
            store
                .get_param("staking", "MaxValidators")
                .unwrap()
                .as_deref(),
            Some("150")
        );
    }

    #[test]
    fn dangling_queue_entry_stops_the_replay() {
        use agora_store::ProposalStore;

        let scenario = Scenario::from_toml_str("[[blocks]]\ntime = 50\n").unwrap();
        let store = NullGovernanceStore::new();
        store
            .insert_active_queue(Timestamp::new(40), agora_types::ProposalId::new(7))
            .unwrap();
        let mut out = Vec::new();
        let err = replay(&scenario, params(), &store, &mut out).unwrap_err();
        assert!(err.to_string().contains("cannot be finalized"), "{err}");
        assert!(out.is_empty());
    }

    #[test]
    fn failed_block_discards_its_transactions() {
        use agora_store::ProposalStore;
        use agora_types::ProposalId;

        let scenario = Scenario::from_toml_str(
            r#"
            [[blocks]]
            time = 10
            [[blocks.submit]]
            proposer = "agr_alice"
            title = "kept"
            deposit = 5

            [[blocks]]
            time = 50
            [[blocks.submit]]
            proposer = "agr_bob"
            title = "discarded"
            deposit = 5
            "#,
        )
        .unwrap();
        let store = NullGovernanceStore::new();
        store
            .insert_active_queue(Timestamp::new(40), ProposalId::new(7))
            .unwrap();
        let mut out = Vec::new();

        assert!(replay(&scenario, params(), &store, &mut out).is_err());
        assert!(store.get_proposal(ProposalId::new(1)).unwrap().is_some());
        assert_eq!(store.get_proposal(ProposalId::new(2)).unwrap(), None);
        assert_eq!(store.proposal_count(), 1);
    }
}
