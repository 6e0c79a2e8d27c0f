//! First-fit placement
//!
//! Single linear pass in address order, stopping at the first free block
//! that is large enough.

use super::{candidates, PlacementPolicy, Strategy};
use crate::ledger::Block;

#[derive(Debug, Clone, Copy, Default)]
pub struct FirstFit;

impl PlacementPolicy for FirstFit {
    fn select(&self, blocks: &[Block], size: u64) -> Option<usize> {
        candidates(blocks, size).next().map(|(index, _)| index)
    }

    fn strategy(&self) -> Strategy {
        Strategy::FirstFit
    }
}
