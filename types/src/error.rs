//! Top-level error type shared across crates.

use thiserror::Error;

/// Common error type for malformed governance primitives.
#[derive(Debug, Error)]
pub enum AgoraError {
    #[error("invalid account address: {0}")]
    InvalidAddress(String),

    #[error("invalid proposal content: {0}")]
    InvalidContent(String),

    #[error("invalid vote option: {0}")]
    InvalidVoteOption(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("{0}")]
    Other(String),
}
