//! Block ledger: the ordered tiling of the simulated address space
//!
//! The ledger is the single source of truth for which ranges are free and
//! which are owned. It always tiles `[0, capacity)`:
//! - consecutive blocks touch (`next.start == prev.start + prev.size`)
//! - every block has `size > 0`
//! - after [`Ledger::coalesce`] no two adjacent blocks are both free

use crate::placement::Strategy;
use crate::validation::OwnerId;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Inclusive address range `[start-end]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AddressRange {
    pub start: u64,
    pub end: u64,
}

impl AddressRange {
    /// Number of units covered
    pub fn size(&self) -> u64 {
        self.end - self.start + 1
    }
}

impl fmt::Display for AddressRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}-{}]", self.start, self.end)
    }
}

/// Who holds an owned block, and how it was placed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Owner {
    pub id: OwnerId,
    pub strategy: Strategy,
}

impl Owner {
    pub fn new(id: OwnerId, strategy: Strategy) -> Self {
        Owner { id, strategy }
    }

    /// Display tag such as `P1 (Best-Fit)`
    pub fn tag(&self) -> String {
        format!("{} ({})", self.id, self.strategy.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum BlockState {
    Free,
    Owned(Owner),
}

/// A contiguous extent of the address space
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub start: u64,
    pub size: u64,
    #[serde(flatten)]
    pub state: BlockState,
}

impl Block {
    pub fn free(start: u64, size: u64) -> Self {
        Block {
            start,
            size,
            state: BlockState::Free,
        }
    }

    /// Last address covered by this block (inclusive)
    pub fn end(&self) -> u64 {
        self.start + self.size - 1
    }

    pub fn range(&self) -> AddressRange {
        AddressRange {
            start: self.start,
            end: self.end(),
        }
    }

    pub fn is_free(&self) -> bool {
        matches!(self.state, BlockState::Free)
    }

    pub fn owner(&self) -> Option<&Owner> {
        match &self.state {
            BlockState::Owned(owner) => Some(owner),
            BlockState::Free => None,
        }
    }

    /// Whether this block is held by exactly `owner_id`
    pub fn is_owned_by(&self, owner_id: &str) -> bool {
        self.owner().is_some_and(|owner| owner.id.as_str() == owner_id)
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.state {
            BlockState::Free => write!(f, "{} Free", self.range()),
            BlockState::Owned(owner) => write!(f, "{} {}", self.range(), owner.id),
        }
    }
}

/// Structural problems a ledger can exhibit
///
/// These are programming errors; no command can produce them.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum LedgerViolation {
    #[error("ledger does not start at address 0 (first block starts at {0})")]
    DoesNotStartAtZero(u64),

    #[error("gap or overlap before block {index}: expected start {expected}, found {found}")]
    Discontinuity {
        index: usize,
        expected: u64,
        found: u64,
    },

    #[error("block {0} has zero size")]
    EmptyBlock(usize),

    #[error("ledger covers {covered} units but capacity is {capacity}")]
    CoverageMismatch { covered: u64, capacity: u64 },

    #[error("adjacent free blocks at {0} and {}", .0 + 1)]
    AdjacentFree(usize),
}

/// Ordered sequence of blocks describing the whole address space
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ledger {
    capacity: u64,
    blocks: Vec<Block>,
}

impl Ledger {
    /// Create a ledger holding one free block spanning `capacity`
    pub fn new(capacity: u64) -> Self {
        let mut ledger = Ledger {
            capacity,
            blocks: Vec::new(),
        };
        ledger.ensure_initialized();
        ledger
    }

    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    /// Read view of the blocks in address order
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Reinitialize to a single free block if the ledger has been emptied
    ///
    /// Returns `true` if initialization happened.
    pub fn ensure_initialized(&mut self) -> bool {
        if !self.blocks.is_empty() || self.capacity == 0 {
            return false;
        }
        self.blocks.push(Block::free(0, self.capacity));
        true
    }

    /// Drop every block; the next mutating command reinitializes
    pub fn clear(&mut self) {
        self.blocks.clear();
    }

    /// Blocks as they should be presented to readers
    ///
    /// An emptied ledger reads as its pristine single free block.
    pub fn view(&self) -> Vec<Block> {
        if self.blocks.is_empty() && self.capacity > 0 {
            vec![Block::free(0, self.capacity)]
        } else {
            self.blocks.clone()
        }
    }

    /// Split block `index` so that its first part is exactly `size` units
    ///
    /// The remainder becomes a free block inserted immediately after. The
    /// caller guarantees `0 < size < blocks[index].size`.
    pub(crate) fn split_at(&mut self, index: usize, size: u64) {
        let block = &mut self.blocks[index];
        debug_assert!(size > 0 && size < block.size, "split size out of range");

        let remainder = Block::free(block.start + size, block.size - size);
        block.size = size;
        self.blocks.insert(index + 1, remainder);
    }

    /// Hand block `index` to `owner` (free -> owned)
    pub(crate) fn assign(&mut self, index: usize, owner: Owner) -> &Block {
        let block = &mut self.blocks[index];
        debug_assert!(block.is_free(), "assigning a block that is already owned");
        block.state = BlockState::Owned(owner);
        block
    }

    /// Free every block held by `owner_id`, returning the released blocks
    /// as they were before release
    pub(crate) fn release(&mut self, owner_id: &str) -> Vec<Block> {
        let mut released = Vec::new();
        for block in self.blocks.iter_mut().filter(|b| b.is_owned_by(owner_id)) {
            released.push(block.clone());
            block.state = BlockState::Free;
        }
        released
    }

    /// Whether `owner_id` currently holds any block
    pub fn holds(&self, owner_id: &str) -> bool {
        self.blocks.iter().any(|b| b.is_owned_by(owner_id))
    }

    /// Merge every maximal run of adjacent free blocks into one
    ///
    /// Single pass, order preserving and idempotent. Returns the number of
    /// merges performed.
    pub(crate) fn coalesce(&mut self) -> usize {
        let before = self.blocks.len();
        let mut merged: Vec<Block> = Vec::with_capacity(before);

        for block in self.blocks.drain(..) {
            match merged.last_mut() {
                Some(prev) if prev.is_free() && block.is_free() => prev.size += block.size,
                _ => merged.push(block),
            }
        }

        self.blocks = merged;
        before - self.blocks.len()
    }

    /// Check the tiling invariants
    ///
    /// `require_coalesced` additionally rejects adjacent free blocks, which
    /// only holds once a deallocation has coalesced the ledger.
    pub fn check_invariants(&self, require_coalesced: bool) -> Result<(), LedgerViolation> {
        if self.blocks.is_empty() {
            return Ok(());
        }

        if self.blocks[0].start != 0 {
            return Err(LedgerViolation::DoesNotStartAtZero(self.blocks[0].start));
        }

        let mut expected = 0u64;
        for (index, block) in self.blocks.iter().enumerate() {
            if block.size == 0 {
                return Err(LedgerViolation::EmptyBlock(index));
            }
            if block.start != expected {
                return Err(LedgerViolation::Discontinuity {
                    index,
                    expected,
                    found: block.start,
                });
            }
            expected = block.start + block.size;
        }

        if expected != self.capacity {
            return Err(LedgerViolation::CoverageMismatch {
                covered: expected,
                capacity: self.capacity,
            });
        }

        if require_coalesced {
            if let Some(index) = self
                .blocks
                .windows(2)
                .position(|pair| pair[0].is_free() && pair[1].is_free())
            {
                return Err(LedgerViolation::AdjacentFree(index));
            }
        }

        Ok(())
    }

    /// Human-readable ranges, e.g. `["[0-19] P1", "[20-99] Free"]`
    pub fn render(&self) -> Vec<String> {
        self.view().iter().map(Block::to_string).collect()
    }

    /// Build a ledger from `(size, owner)` pairs laid out from address 0
    #[cfg(test)]
    pub(crate) fn from_layout(capacity: u64, layout: &[(u64, Option<&str>)]) -> Self {
        let mut blocks = Vec::with_capacity(layout.len());
        let mut start = 0;
        for &(size, owner) in layout {
            let state = match owner {
                Some(id) => BlockState::Owned(Owner::new(
                    OwnerId::new(id).unwrap(),
                    Strategy::FirstFit,
                )),
                None => BlockState::Free,
            };
            blocks.push(Block { start, size, state });
            start += size;
        }
        let ledger = Ledger { capacity, blocks };
        ledger.check_invariants(false).unwrap();
        ledger
    }
}
