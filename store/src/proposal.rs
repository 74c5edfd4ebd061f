//! Proposal records and the two deadline queues.

use crate::StoreError;
use agora_types::{Proposal, ProposalId, Timestamp};

/// Durable mapping from proposal id to proposal record, plus the inactive
/// (deposit deadline) and active (voting deadline) queues.
///
/// Queues are ordered sets keyed by `(deadline, id)`. The `*_until` readers
/// return every entry with `deadline <= until`, ascending by `(deadline, id)`.
pub trait ProposalStore {
    fn get_proposal(&self, id: ProposalId) -> Result<Option<Proposal>, StoreError>;

    fn set_proposal(&self, proposal: &Proposal) -> Result<(), StoreError>;

    fn delete_proposal(&self, id: ProposalId) -> Result<(), StoreError>;

    /// Reserve the next proposal id. Ids start at 1 and never repeat.
    fn next_proposal_id(&self) -> Result<ProposalId, StoreError>;

    fn insert_inactive_queue(&self, deadline: Timestamp, id: ProposalId)
        -> Result<(), StoreError>;

    fn remove_from_inactive_queue(
        &self,
        deadline: Timestamp,
        id: ProposalId,
    ) -> Result<(), StoreError>;

    fn inactive_queue_until(
        &self,
        until: Timestamp,
    ) -> Result<Vec<(Timestamp, ProposalId)>, StoreError>;

    fn insert_active_queue(&self, deadline: Timestamp, id: ProposalId) -> Result<(), StoreError>;

    fn remove_from_active_queue(
        &self,
        deadline: Timestamp,
        id: ProposalId,
    ) -> Result<(), StoreError>;

    fn active_queue_until(
        &self,
        until: Timestamp,
    ) -> Result<Vec<(Timestamp, ProposalId)>, StoreError>;
}
