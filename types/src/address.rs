//! Account address type with `agr_` prefix.

use crate::error::AgoraError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// An account address (proposer, depositor or voter), always prefixed with `agr_`.
///
/// Ordered lexicographically so per-proposal deposit and vote listings have a
/// stable order on every node.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AccountAddress(String);

impl AccountAddress {
    /// The standard prefix for all account addresses.
    pub const PREFIX: &'static str = "agr_";

    /// Create a new address from a raw string.
    ///
    /// # Panics
    /// Panics if the string is not a well-formed address. Use [`Self::parse`]
    /// for untrusted input.
    pub fn new(raw: impl Into<String>) -> Self {
        let s = raw.into();
        assert!(Self::well_formed(&s), "address must start with agr_");
        Self(s)
    }

    /// Parse an address from untrusted input.
    pub fn parse(raw: impl Into<String>) -> Result<Self, AgoraError> {
        let s = raw.into();
        if Self::well_formed(&s) {
            Ok(Self(s))
        } else {
            Err(AgoraError::InvalidAddress(s))
        }
    }

    /// Return the raw address string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    fn well_formed(s: &str) -> bool {
        s.starts_with(Self::PREFIX)
            && s.len() > Self::PREFIX.len()
            && s.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_')
    }
}

impl fmt::Display for AccountAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for AccountAddress {
    type Error = AgoraError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_rejects_missing_prefix() {
        assert!(AccountAddress::parse("alice").is_err());
        assert!(AccountAddress::parse("agr_").is_err());
        assert!(AccountAddress::parse("agr_al ice").is_err());
    }

    #[test]
    fn parse_accepts_well_formed() {
        let addr = AccountAddress::parse("agr_alice").unwrap();
        assert_eq!(addr.as_str(), "agr_alice");
    }

    #[test]
    fn ordering_is_lexicographic() {
        let a = AccountAddress::new("agr_aaa");
        let b = AccountAddress::new("agr_bbb");
        assert!(a < b);
    }
}
