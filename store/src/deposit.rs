//! Escrowed proposal deposits.

use crate::StoreError;
use agora_types::{AccountAddress, Coins, Deposit, ProposalId};

/// Per-proposal deposit escrow.
///
/// Settlement is all-or-nothing per proposal: either every deposit goes back
/// to its depositor or every deposit is burned.
pub trait DepositLedger {
    /// Insert or overwrite the deposit for `(deposit.proposal_id, deposit.depositor)`.
    fn set_deposit(&self, deposit: &Deposit) -> Result<(), StoreError>;

    fn get_deposit(
        &self,
        id: ProposalId,
        depositor: &AccountAddress,
    ) -> Result<Option<Deposit>, StoreError>;

    /// All deposits for a proposal, ordered by depositor.
    fn deposits(&self, id: ProposalId) -> Result<Vec<Deposit>, StoreError>;

    /// Credit every deposit back to its depositor and delete them.
    /// Returns the total refunded.
    fn refund_deposits(&self, id: ProposalId) -> Result<Coins, StoreError>;

    /// Delete every deposit without crediting anyone. Returns the total burned.
    fn burn_deposits(&self, id: ProposalId) -> Result<Coins, StoreError>;

    /// Spendable balance credited to `account` by refunds.
    fn balance_of(&self, account: &AccountAddress) -> Result<Coins, StoreError>;

    /// Cumulative amount burned across all proposals.
    fn burned_total(&self) -> Result<Coins, StoreError>;
}
