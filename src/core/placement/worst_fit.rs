//! Worst-fit placement
//!
//! Largest free block that holds the request, keeping leftovers big enough
//! to be useful for later requests.

use super::{candidates, PlacementPolicy, Strategy};
use crate::ledger::Block;

#[derive(Debug, Clone, Copy, Default)]
pub struct WorstFit;

impl PlacementPolicy for WorstFit {
    fn select(&self, blocks: &[Block], size: u64) -> Option<usize> {
        let mut worst: Option<(usize, u64)> = None;

        for (index, block) in candidates(blocks, size) {
            // Strictly larger only: ties stay with the lower address
            if worst.map_or(true, |(_, worst_size)| block.size > worst_size) {
                worst = Some((index, block.size));
            }
        }

        worst.map(|(index, _)| index)
    }

    fn strategy(&self) -> Strategy {
        Strategy::WorstFit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::Ledger;

    #[test]
    fn test_worst_fit_picks_largest() {
        let ledger = Ledger::from_layout(
            200,
            &[(50, None), (10, Some("P1")), (15, None), (35, Some("P2")), (90, None)],
        );

        assert_eq!(WorstFit.select(ledger.blocks(), 10), Some(4));
        assert_eq!(WorstFit.select(ledger.blocks(), 90), Some(4));
        assert_eq!(WorstFit.select(ledger.blocks(), 91), None);
    }

    #[test]
    fn test_worst_fit_tie_goes_to_lowest_address() {
        // Free holes of 30 at 0 and 30 at 60
        let ledger = Ledger::from_layout(
            100,
            &[(30, None), (30, Some("P1")), (30, None), (10, Some("P2"))],
        );

        assert_eq!(WorstFit.select(ledger.blocks(), 1), Some(0));
        assert_eq!(WorstFit.select(ledger.blocks(), 30), Some(0));
    }
}
