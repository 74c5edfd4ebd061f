//! Nullable chain clock: deterministic block heights and times for testing.

use agora_types::Timestamp;
use std::cell::Cell;

/// Height and canonical time of a block.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockHeader {
    pub height: u64,
    pub time: Timestamp,
}

/// A deterministic block producer for testing.
///
/// Time only advances when a new block is produced.
pub struct NullChain {
    height: Cell<u64>,
    time: Cell<u64>,
}

impl NullChain {
    /// Start at height 0 with the given genesis time.
    pub fn new(genesis_secs: u64) -> Self {
        Self {
            height: Cell::new(0),
            time: Cell::new(genesis_secs),
        }
    }

    /// Header of the most recently produced block.
    pub fn current(&self) -> BlockHeader {
        BlockHeader {
            height: self.height.get(),
            time: Timestamp::new(self.time.get()),
        }
    }

    /// Produce the next block `block_secs` after the current one.
    pub fn next_block(&self, block_secs: u64) -> BlockHeader {
        self.height.set(self.height.get() + 1);
        self.time.set(self.time.get().saturating_add(block_secs));
        self.current()
    }

    /// Produce one block whose time is exactly `secs`.
    ///
    /// # Panics
    /// Panics if `secs` is earlier than the current block time.
    pub fn jump_to(&self, secs: u64) -> BlockHeader {
        assert!(secs >= self.time.get(), "block time cannot go backwards");
        self.height.set(self.height.get() + 1);
        self.time.set(secs);
        self.current()
    }
}
