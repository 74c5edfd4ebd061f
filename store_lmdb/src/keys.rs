//! Binary key layouts.
//!
//! - queue key: `deadline_be_u64(8) ++ proposal_id_be_u64(8)`. Sorting the
//!   bytes sorts by `(deadline, id)`, so a range scan up to
//!   `until_be ++ 0xff..` yields every due entry in resolution order.
//! - per-proposal key: `proposal_id_be_u64(8) ++ address_bytes`. A prefix scan
//!   on the id lists a proposal's deposits or votes ordered by address.

use agora_types::{AccountAddress, ProposalId, Timestamp};

pub const QUEUE_KEY_LEN: usize = 16;

pub fn queue_key(deadline: Timestamp, id: ProposalId) -> [u8; QUEUE_KEY_LEN] {
    let mut key = [0u8; QUEUE_KEY_LEN];
    key[..8].copy_from_slice(&deadline.to_be_bytes());
    key[8..].copy_from_slice(&id.to_be_bytes());
    key
}

/// Inclusive upper bound covering every entry with `deadline <= until`.
pub fn queue_upper_bound(until: Timestamp) -> [u8; QUEUE_KEY_LEN] {
    queue_key(until, ProposalId::new(u64::MAX))
}

pub fn decode_queue_key(key: &[u8]) -> Option<(Timestamp, ProposalId)> {
    if key.len() != QUEUE_KEY_LEN {
        return None;
    }
    let mut deadline = [0u8; 8];
    let mut id = [0u8; 8];
    deadline.copy_from_slice(&key[..8]);
    id.copy_from_slice(&key[8..]);
    Some((Timestamp::from_be_bytes(deadline), ProposalId::from_be_bytes(id)))
}

pub fn proposal_key(id: ProposalId) -> [u8; 8] {
    id.to_be_bytes()
}

pub fn account_key(id: ProposalId, account: &AccountAddress) -> Vec<u8> {
    let mut key = Vec::with_capacity(8 + account.as_bytes().len());
    key.extend_from_slice(&id.to_be_bytes());
    key.extend_from_slice(account.as_bytes());
    key
}

/// Increment a byte prefix to form the exclusive upper bound of a prefix scan.
/// Returns `false` if the prefix is all `0xff` and has no successor.
pub fn increment_prefix(prefix: &mut [u8]) -> bool {
    for byte in prefix.iter_mut().rev() {
        if *byte == 0xff {
            *byte = 0;
        } else {
            *byte += 1;
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queue_key_decodes() {
        let key = queue_key(Timestamp::new(77), ProposalId::new(5));
        assert_eq!(
            decode_queue_key(&key),
            Some((Timestamp::new(77), ProposalId::new(5)))
        );
        assert_eq!(decode_queue_key(&key[..15]), None);
    }

    #[test]
    fn upper_bound_covers_same_deadline_only() {
        let bound = queue_upper_bound(Timestamp::new(10));
        assert!(queue_key(Timestamp::new(10), ProposalId::new(u64::MAX)) <= bound);
        assert!(queue_key(Timestamp::new(11), ProposalId::new(0)) > bound);
    }

    #[test]
    fn increment_prefix_carries() {
        let mut p = [0x00, 0xff];
        assert!(increment_prefix(&mut p));
        assert_eq!(p, [0x01, 0x00]);
        let mut max = [0xff, 0xff];
        assert!(!increment_prefix(&mut max));
    }
}
