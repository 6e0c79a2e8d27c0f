//! Best-fit placement
//!
//! Smallest free block that still holds the request. Leaves large extents
//! intact at the cost of many small leftovers.

use super::{candidates, PlacementPolicy, Strategy};
use crate::ledger::Block;

#[derive(Debug, Clone, Copy, Default)]
pub struct BestFit;

impl PlacementPolicy for BestFit {
    fn select(&self, blocks: &[Block], size: u64) -> Option<usize> {
        let mut best: Option<(usize, u64)> = None;

        for (index, block) in candidates(blocks, size) {
            // Strictly smaller only: ties stay with the lower address
            if best.map_or(true, |(_, best_size)| block.size < best_size) {
                best = Some((index, block.size));
            }
        }

        best.map(|(index, _)| index)
    }

    fn strategy(&self) -> Strategy {
        Strategy::BestFit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::Ledger;

    #[test]
    fn test_best_fit_picks_smallest() {
        // free(0-49) P1(50-59) free(60-74) P2(75-109) free(110-199)
        let ledger = Ledger::from_layout(
            200,
            &[(50, None), (10, Some("P1")), (15, None), (35, Some("P2")), (90, None)],
        );

        assert_eq!(BestFit.select(ledger.blocks(), 10), Some(2));
        assert_eq!(BestFit.select(ledger.blocks(), 16), Some(0));
        assert_eq!(BestFit.select(ledger.blocks(), 51), Some(4));
        assert_eq!(BestFit.select(ledger.blocks(), 91), None);
    }

    #[test]
    fn test_best_fit_tie_goes_to_lowest_address() {
        // Two free holes of 20 units at 0 and 40
        let ledger = Ledger::from_layout(
            100,
            &[(20, None), (20, Some("P1")), (20, None), (40, Some("P2"))],
        );

        assert_eq!(BestFit.select(ledger.blocks(), 5), Some(0));
        assert_eq!(BestFit.select(ledger.blocks(), 20), Some(0));
    }
}
