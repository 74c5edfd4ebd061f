//! Agora daemon: replays governance scenarios block by block.

mod replay;
mod scenario;

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;

use agora_governance::GovernanceConfig;
use agora_nullables::NullGovernanceStore;
use agora_store_lmdb::integrity::check_data_dir;
use agora_store_lmdb::{check_integrity, LmdbEnvironment};
use agora_utils::{format_duration, init_tracing, LogFormat};

use replay::{replay, ReplaySummary};
use scenario::Scenario;

#[derive(Parser)]
#[command(name = "agora-daemon", about = "Agora governance tooling")]
struct Cli {
    /// Path to a governance TOML configuration file. Defaults apply when omitted.
    #[arg(long, global = true, env = "AGORA_CONFIG")]
    config: Option<PathBuf>,

    /// Log level override, e.g. "debug" or "info,agora_governance=trace".
    /// `RUST_LOG` takes precedence over both this and the config file.
    #[arg(long, global = true, env = "AGORA_LOG_LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Replay a scenario file and print one JSON line per resolution event.
    Replay {
        /// Scenario TOML file.
        #[arg(long)]
        scenario: PathBuf,

        /// Persist state in an LMDB environment at this directory instead of memory.
        #[arg(long, env = "AGORA_LMDB_DIR")]
        lmdb: Option<PathBuf>,

        /// LMDB map size in bytes.
        #[arg(long, default_value_t = agora_store_lmdb::environment::DEFAULT_MAP_SIZE)]
        map_size: usize,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => GovernanceConfig::from_toml_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => GovernanceConfig::default(),
    };
    let format: LogFormat = config.log.format.parse()?;
    let level = cli.log_level.as_deref().unwrap_or(&config.log.level);
    init_tracing(format, level);

    match cli.command {
        Command::Replay {
            scenario,
            lmdb,
            map_size,
        } => {
            let scenario = Scenario::from_toml_file(&scenario)?;
            let params = config.params();
            tracing::info!(
                blocks = scenario.blocks.len(),
                deposit_period = %format_duration(params.deposit.max_deposit_period_secs),
                voting_period = %format_duration(params.voting.voting_period_secs),
                "replaying scenario"
            );

            let stdout = std::io::stdout();
            let mut out = stdout.lock();
            let summary = match lmdb {
                Some(dir) => replay_lmdb(&scenario, &config, &dir, map_size, &mut out)?,
                None => replay(&scenario, params, &NullGovernanceStore::new(), &mut out)?,
            };
            out.flush()?;

            tracing::info!(
                blocks = summary.blocks,
                applied_txs = summary.applied_txs,
                rejected_txs = summary.rejected_txs,
                events = summary.events,
                "replay finished"
            );
        }
    }

    Ok(())
}

fn replay_lmdb(
    scenario: &Scenario,
    config: &GovernanceConfig,
    dir: &Path,
    map_size: usize,
    out: &mut dyn Write,
) -> anyhow::Result<ReplaySummary> {
    check_data_dir(dir).map_err(anyhow::Error::msg)?;
    let env = LmdbEnvironment::open(dir, map_size)
        .with_context(|| format!("opening LMDB at {}", dir.display()))?;

    let report = check_integrity(&env)?;
    tracing::info!(
        databases = report.databases_checked,
        entries = report.total_entries,
        "LMDB integrity check"
    );
    if !report.is_healthy() {
        for error in &report.errors {
            tracing::error!(%error, "integrity problem");
        }
        anyhow::bail!(
            "LMDB store at {} failed its integrity check ({} problems)",
            dir.display(),
            report.errors.len()
        );
    }

    replay(scenario, config.params(), &env, out)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCENARIO: &str = r#"
        [[validators]]
        address = "agr_val1"
        power = 10

        [[blocks]]
        time = 100
        [[blocks.submit]]
        proposer = "agr_alice"
        title = "persisted"
        deposit = 10
        [[blocks.vote]]
        proposal = 1
        voter = "agr_val1"
        option = "yes"

        [[blocks]]
        time = 172900
    "#;

    #[test]
    fn lmdb_replay_persists_resolved_proposal() {
        let dir = tempfile::TempDir::new().unwrap();
        let db = dir.path().join("db");
        let scenario = Scenario::from_toml_str(SCENARIO).unwrap();
        let config = GovernanceConfig::default();
        let mut out = Vec::new();

        let summary = replay_lmdb(&scenario, &config, &db, 16 << 20, &mut out).unwrap();
        assert_eq!(summary.events, 1);
        let line: serde_json::Value =
            serde_json::from_str(String::from_utf8(out).unwrap().trim()).unwrap();
        assert_eq!(line["result"], "Passed");

        let env = LmdbEnvironment::open(&db, 16 << 20).unwrap();
        assert!(check_integrity(&env).unwrap().is_healthy());
        use agora_store::{DepositLedger, ProposalStore};
        let store = env.governance_store();
        let proposal = store
            .get_proposal(agora_types::ProposalId::new(1))
            .unwrap()
            .unwrap();
        assert_eq!(proposal.status, agora_types::ProposalStatus::Passed);
        assert_eq!(
            store
                .balance_of(&agora_types::AccountAddress::new("agr_alice"))
                .unwrap(),
            agora_types::Coins::new(10)
        );
    }

    #[test]
    fn unhealthy_lmdb_store_aborts_before_replaying() {
        use agora_store::ProposalStore;

        let dir = tempfile::TempDir::new().unwrap();
        let db = dir.path().join("db");
        {
            let env = LmdbEnvironment::open(&db, 16 << 20).unwrap();
            env.governance_store()
                .insert_inactive_queue(
                    agora_types::Timestamp::new(1),
                    agora_types::ProposalId::new(4),
                )
                .unwrap();
        }
        let scenario = Scenario::from_toml_str(SCENARIO).unwrap();
        let mut out = Vec::new();
        let err = replay_lmdb(&scenario, &GovernanceConfig::default(), &db, 16 << 20, &mut out)
            .unwrap_err();
        assert!(err.to_string().contains("integrity"), "{err}");
    }

    #[test]
    fn aborted_lmdb_block_leaves_the_store_unchanged() {
        use agora_store::{DepositLedger, ProposalStore};
        use agora_types::{AccountAddress, Coins, ProposalId, ProposalStatus, Timestamp};

        let dir = tempfile::TempDir::new().unwrap();
        let db = dir.path().join("db");
        let scenario = Scenario::from_toml_str(
            r#"
            [[blocks]]
            time = 100
            [[blocks.submit]]
            proposer = "agr_alice"
            title = "kept"
            deposit = 3

            [[blocks]]
            time = 172900
            [[blocks.deposit]]
            proposal = 1
            depositor = "agr_bob"
            amount = 4
            "#,
        )
        .unwrap();
        let config = GovernanceConfig::default();
        let (first, second) = scenario.blocks.split_at(1);
        let with_blocks = |blocks: &[scenario::Block]| Scenario {
            blocks: blocks.to_vec(),
            ..scenario.clone()
        };
        {
            let env = LmdbEnvironment::open(&db, 16 << 20).unwrap();
            replay(&with_blocks(first), config.params(), &env, &mut Vec::new()).unwrap();
            // The second block drops proposal 1, then fails on a queue entry
            // whose proposal does not exist.
            env.governance_store()
                .insert_active_queue(Timestamp::new(172800), ProposalId::new(9))
                .unwrap();
            let mut out = Vec::new();
            assert!(replay(&with_blocks(second), config.params(), &env, &mut out).is_err());
            assert!(out.is_empty());
        }

        let env = LmdbEnvironment::open(&db, 16 << 20).unwrap();
        let store = env.governance_store();
        let proposal = store.get_proposal(ProposalId::new(1)).unwrap().unwrap();
        assert_eq!(proposal.status, ProposalStatus::DepositPeriod);
        assert_eq!(proposal.total_deposit, Coins::new(3));
        assert_eq!(
            store.get_deposit(ProposalId::new(1), &AccountAddress::new("agr_bob")).unwrap(),
            None
        );
        assert_eq!(store.burned_total().unwrap(), Coins::ZERO);
    }
}
