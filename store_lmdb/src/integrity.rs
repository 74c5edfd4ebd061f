//! LMDB database integrity checks.
//!
//! Run on startup to detect corruption early, before any block is resolved
//! against the store. The resolver treats a queue entry without a proposal
//! as fatal, so those are reported here first.

use std::collections::BTreeSet;
use std::path::Path;

use heed::types::Bytes;
use heed::{Database, RoTxn};

use agora_types::{Proposal, ProposalId, ProposalStatus};

use crate::environment::{LmdbEnvironment, DATABASES};
use crate::keys::{decode_queue_key, proposal_key};
use crate::LmdbError;

/// Summary of an integrity check run.
#[derive(Debug, Default)]
pub struct IntegrityReport {
    pub databases_checked: u32,
    pub total_entries: u64,
    pub errors: Vec<String>,
}

impl IntegrityReport {
    /// Returns `true` if no errors were detected.
    pub fn is_healthy(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Check LMDB database integrity.
///
/// Counts the entries of every database, then cross-checks both deadline
/// queues against the proposals database. Problems are recorded in the
/// report rather than returned as a hard error.
pub fn check_integrity(environment: &LmdbEnvironment) -> Result<IntegrityReport, LmdbError> {
    let mut report = IntegrityReport::default();
    let env = environment.env();
    let dbs = environment.databases();
    let rtxn = env.read_txn()?;

    for &db_name in DATABASES {
        match env.open_database::<Bytes, Bytes>(&rtxn, Some(db_name)) {
            Ok(Some(db)) => {
                report.databases_checked += 1;
                match db.len(&rtxn) {
                    Ok(count) => report.total_entries += count,
                    Err(e) => report
                        .errors
                        .push(format!("failed to read database '{db_name}': {e}")),
                }
            }
            Ok(None) => report.errors.push(format!("database '{db_name}' is missing")),
            Err(e) => report
                .errors
                .push(format!("failed to open database '{db_name}': {e}")),
        }
    }

    let inactive = check_queue(
        &rtxn,
        dbs.inactive_queue,
        dbs.proposals,
        "inactive_queue",
        ProposalStatus::DepositPeriod,
        &mut report,
    )?;
    let active = check_queue(
        &rtxn,
        dbs.active_queue,
        dbs.proposals,
        "active_queue",
        ProposalStatus::Active,
        &mut report,
    )?;
    for id in inactive.intersection(&active) {
        report
            .errors
            .push(format!("proposal {id} is queued in both queues"));
    }

    if !report.is_healthy() {
        tracing::warn!(errors = report.errors.len(), "LMDB integrity check found problems");
    }
    Ok(report)
}

/// Validate one deadline queue and return the ids it holds.
fn check_queue(
    rtxn: &RoTxn,
    queue: Database<Bytes, Bytes>,
    proposals: Database<Bytes, Bytes>,
    name: &str,
    expected: ProposalStatus,
    report: &mut IntegrityReport,
) -> Result<BTreeSet<ProposalId>, LmdbError> {
    let mut ids = BTreeSet::new();
    for result in queue.iter(rtxn)? {
        let (key, _) = result?;
        let Some((deadline, id)) = decode_queue_key(key) else {
            report
                .errors
                .push(format!("{name}: key of {} bytes", key.len()));
            continue;
        };
        ids.insert(id);
        let Some(bytes) = proposals.get(rtxn, &proposal_key(id)[..])? else {
            report
                .errors
                .push(format!("{name}: proposal {id} at {deadline} does not exist"));
            continue;
        };
        match bincode::deserialize::<Proposal>(bytes) {
            Ok(proposal) if proposal.status != expected => report.errors.push(format!(
                "{name}: proposal {id} has status {}",
                proposal.status.as_str()
            )),
            Ok(_) => {}
            Err(e) => report
                .errors
                .push(format!("proposal {id} failed to decode: {e}")),
        }
    }
    Ok(ids)
}

/// Check if the LMDB data directory looks valid before opening.
///
/// Returns `Ok(())` for a fresh (nonexistent) directory. Returns an error
/// if the directory exists but `data.mdb` is missing, which suggests
/// misconfiguration.
pub fn check_data_dir(path: &Path) -> Result<(), String> {
    if !path.exists() {
        return Ok(());
    }
    let data_file = path.join("data.mdb");
    if !data_file.exists() {
        return Err(format!(
            "LMDB directory exists but data.mdb is missing at {}",
            path.display()
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use agora_store::ProposalStore;
    use agora_types::{AccountAddress, Coins, ProposalContent, Timestamp};
    use tempfile::TempDir;

    fn proposal(id: u64, status: ProposalStatus) -> Proposal {
        Proposal {
            id: ProposalId::new(id),
            content: ProposalContent::Text {
                title: "t".into(),
                description: String::new(),
            },
            proposer: AccountAddress::new("agr_p"),
            status,
            final_tally_result: None,
            submit_time: Timestamp::EPOCH,
            deposit_end_time: Timestamp::new(10),
            total_deposit: Coins::ZERO,
            voting_start_time: None,
            voting_end_time: Timestamp::new(10),
        }
    }

    #[test]
    fn check_data_dir_fresh_path() {
        let dir = TempDir::new().unwrap();
        assert!(check_data_dir(&dir.path().join("absent")).is_ok());
        assert!(check_data_dir(dir.path()).is_err());
    }

    #[test]
    fn fresh_environment_is_healthy() {
        let dir = TempDir::new().unwrap();
        let env = LmdbEnvironment::open(dir.path(), 16 << 20).unwrap();
        let report = check_integrity(&env).unwrap();
        assert!(report.is_healthy(), "{:?}", report.errors);
        assert_eq!(report.databases_checked, DATABASES.len() as u32);
        assert_eq!(report.total_entries, 0);
    }

    #[test]
    fn dangling_and_doubly_queued_entries_are_reported() {
        let dir = TempDir::new().unwrap();
        let env = LmdbEnvironment::open(dir.path(), 16 << 20).unwrap();
        let store = env.governance_store();
        store.set_proposal(&proposal(1, ProposalStatus::Active)).unwrap();
        store.insert_active_queue(Timestamp::new(10), ProposalId::new(1)).unwrap();
        store.insert_inactive_queue(Timestamp::new(5), ProposalId::new(1)).unwrap();
        store.insert_inactive_queue(Timestamp::new(5), ProposalId::new(2)).unwrap();

        let report = check_integrity(&env).unwrap();
        assert!(!report.is_healthy());
        let joined = report.errors.join("\n");
        assert!(joined.contains("proposal 2 at 5s does not exist"), "{joined}");
        assert!(joined.contains("queued in both queues"), "{joined}");
        assert!(joined.contains("has status Active"), "{joined}");
    }
}
