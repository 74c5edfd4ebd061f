//! Nullable voting power: a fixed power table.

use agora_store::VotingPowerSource;
use agora_types::AccountAddress;
use std::collections::BTreeMap;
use std::sync::Mutex;

/// Voting power table for tests. Total power defaults to the sum of all
/// entries but can be pinned to model non-voting bonded power.
pub struct NullPowerSource {
    powers: Mutex<BTreeMap<AccountAddress, u128>>,
    total_override: Mutex<Option<u128>>,
}

impl NullPowerSource {
    pub fn new() -> Self {
        Self {
            powers: Mutex::new(BTreeMap::new()),
            total_override: Mutex::new(None),
        }
    }

    pub fn with_power(self, voter: &AccountAddress, power: u128) -> Self {
        self.set_power(voter, power);
        self
    }

    pub fn set_power(&self, voter: &AccountAddress, power: u128) {
        self.powers.lock().unwrap().insert(voter.clone(), power);
    }

    /// Pin the total eligible power regardless of the table contents.
    pub fn set_total_power(&self, total: u128) {
        *self.total_override.lock().unwrap() = Some(total);
    }
}

impl Default for NullPowerSource {
    fn default() -> Self {
        Self::new()
    }
}

impl VotingPowerSource for NullPowerSource {
    fn power_of(&self, voter: &AccountAddress) -> u128 {
        self.powers
            .lock()
            .unwrap()
            .get(voter)
            .copied()
            .unwrap_or(0)
    }

    fn total_power(&self) -> u128 {
        if let Some(total) = *self.total_override.lock().unwrap() {
            return total;
        }
        self.powers
            .lock()
            .unwrap()
            .values()
            .fold(0u128, |acc, p| acc.saturating_add(*p))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_defaults_to_sum_and_can_be_pinned() {
        let a = AccountAddress::new("agr_a");
        let b = AccountAddress::new("agr_b");
        let power = NullPowerSource::new().with_power(&a, 10).with_power(&b, 30);
        assert_eq!(power.total_power(), 40);
        assert_eq!(power.power_of(&AccountAddress::new("agr_c")), 0);
        power.set_total_power(100);
        assert_eq!(power.total_power(), 100);
    }
}
