use crate::StoreError;
use agora_types::{AccountAddress, ProposalId, Vote};

pub trait VoteStore {
    /// Insert or overwrite the vote for `(vote.proposal_id, vote.voter)`.
    fn set_vote(&self, vote: &Vote) -> Result<(), StoreError>;

    fn get_vote(&self, id: ProposalId, voter: &AccountAddress)
        -> Result<Option<Vote>, StoreError>;

    /// All votes for a proposal, ordered by voter.
    fn votes(&self, id: ProposalId) -> Result<Vec<Vote>, StoreError>;

    fn delete_votes(&self, id: ProposalId) -> Result<(), StoreError>;
}
